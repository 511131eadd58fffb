//! Cloud Coordinator
//!
//! Owns the server session and everything that crosses it: telemetry
//! uploads, device-configuration fetches and the button-triggered manual
//! fetch.
//!
//! ```text
//! LTE_INIT ──start──► LTE_DISCONNECTED ──lte connected──► LTE_CONNECTED
//!     ▲                                                        │
//!     └───────────────── lte disconnected ─────────────────────┘
//!
//! within LTE_CONNECTED:
//!   SERVER_DISCONNECTED ──server connected / fetch config──► SERVER_CONNECTED
//!   SERVER_CONNECTED ──server disconnected──► SERVER_DISCONNECTED
//! ```
//!
//! LTE connectivity and the server session are distinct signals: observing
//! the LTE attach starts the transport connect (publishing the
//! server-connecting and server-connected events), while the sub-state
//! flips only when the session-established event comes back around and the
//! initial device-configuration fetch goes out.
//!
//! Configuration is refreshed as a side effect of every telemetry upload -
//! there is no separate poll timer, so config latency follows sampling
//! cadence by design. The fetch is a blocking request/response owned by
//! this coordinator; the decoded document is overlaid on the current
//! config snapshot and re-published as a complete proposed configuration
//! for the application coordinator to validate.

use crate::bus::EventSink;
use crate::codec;
use crate::config::AppConfig;
use crate::events::{AppEvent, CloudEvent, Event, LocationEvent, ModemEvent};
use crate::traits::CloudTransport;

/// Cloud coordinator states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Waiting for the boot event.
    LteInit,
    /// No LTE connectivity.
    LteDisconnected,
    /// LTE up; server session tracked by the sub-state.
    LteConnected,
}

/// Server-session sub-states while LTE is connected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubState {
    /// No server session.
    ServerDisconnected,
    /// Session established, telemetry may flow.
    ServerConnected,
}

impl State {
    const fn name(&self) -> &'static str {
        match self {
            State::LteInit => "LTE_INIT",
            State::LteDisconnected => "LTE_DISCONNECTED",
            State::LteConnected => "LTE_CONNECTED",
        }
    }
}

impl SubState {
    const fn name(&self) -> &'static str {
        match self {
            SubState::ServerDisconnected => "SERVER_DISCONNECTED",
            SubState::ServerConnected => "SERVER_CONNECTED",
        }
    }
}

/// Server connectivity / telemetry state machine
pub struct CloudCoordinator<C: CloudTransport> {
    state: State,
    sub_state: SubState,
    config: AppConfig,
    transport: C,
}

impl<C: CloudTransport> CloudCoordinator<C> {
    /// Create the coordinator around the server transport
    pub fn new(transport: C) -> Self {
        Self {
            state: State::LteInit,
            sub_state: SubState::ServerDisconnected,
            config: AppConfig::default(),
            transport,
        }
    }

    /// Process one event from this coordinator's mailbox
    pub fn handle<S: EventSink>(&mut self, event: &Event, sink: &S) {
        self.on_all_states(event);

        match self.state {
            State::LteInit => self.on_state_lte_init(event),
            State::LteDisconnected => self.on_state_lte_disconnected(event, sink),
            State::LteConnected => {
                match self.sub_state {
                    SubState::ServerDisconnected => {
                        self.on_sub_state_server_disconnected(event, sink)
                    }
                    SubState::ServerConnected => self.on_sub_state_server_connected(event, sink),
                }
                self.on_state_lte_connected(event);
            }
        }
    }

    fn on_all_states(&mut self, event: &Event) {
        match event {
            Event::App(AppEvent::Start(config)) | Event::App(AppEvent::ConfigUpdate(config)) => {
                self.config = *config;
            }
            _ => {}
        }
    }

    fn on_state_lte_init(&mut self, event: &Event) {
        if let Event::App(AppEvent::Start(_)) = event {
            self.set_state(State::LteDisconnected);
            self.set_sub_state(SubState::ServerDisconnected);
        }
    }

    fn on_state_lte_disconnected<S: EventSink>(&mut self, event: &Event, sink: &S) {
        if let Event::Modem(ModemEvent::LteConnected) = event {
            self.set_state(State::LteConnected);
            sink.publish(Event::Cloud(CloudEvent::ServerConnecting));
            match self.transport.connect() {
                Ok(()) => sink.publish(Event::Cloud(CloudEvent::ServerConnected)),
                Err(err) => log::error!("cloud: server connect failed: {err}"),
            }
        }
    }

    fn on_state_lte_connected(&mut self, event: &Event) {
        if let Event::Modem(ModemEvent::LteDisconnected) = event {
            self.set_state(State::LteDisconnected);
            self.set_sub_state(SubState::ServerDisconnected);
        }
    }

    fn on_sub_state_server_disconnected<S: EventSink>(&mut self, event: &Event, sink: &S) {
        if let Event::Cloud(CloudEvent::ServerConnected) = event {
            // Session is up: fetch the device configuration once, then
            // telemetry handling takes over.
            self.refresh_device_config(sink);
            self.set_sub_state(SubState::ServerConnected);
        }
    }

    fn on_sub_state_server_connected<S: EventSink>(&mut self, event: &Event, sink: &S) {
        match event {
            Event::Location(LocationEvent::GnssDataReady(sample)) => {
                match codec::encode_telemetry(self.config.device_id, sample) {
                    Ok(payload) => match self.transport.send_telemetry(&payload) {
                        Ok(()) => sink.publish(Event::Cloud(CloudEvent::DataSent)),
                        Err(err) => log::error!("cloud: telemetry upload failed: {err}"),
                    },
                    Err(err) => log::error!("cloud: {err}"),
                }
                // Config refresh rides on every upload.
                self.refresh_device_config(sink);
            }
            Event::Cloud(CloudEvent::ServerDisconnected) => {
                self.set_sub_state(SubState::ServerDisconnected);
            }
            Event::Cloud(CloudEvent::ButtonPressed) => {
                sink.publish(Event::App(AppEvent::LocationGet));
            }
            _ => {}
        }
    }

    fn refresh_device_config<S: EventSink>(&mut self, sink: &S) {
        let raw = match self.transport.fetch_config() {
            Ok(raw) => raw,
            Err(err) => {
                log::error!("cloud: device config fetch failed: {err}");
                return;
            }
        };
        match codec::decode_device_config(&raw) {
            Ok(proposal) => {
                let proposed = proposal.apply_to(&self.config);
                sink.publish(Event::Cloud(CloudEvent::ConfigReceived(proposed)));
            }
            // Not a fault: treated as "no config update".
            Err(err) => log::warn!("cloud: ignoring device config response: {err}"),
        }
    }

    fn set_state(&mut self, new_state: State) {
        if new_state == self.state {
            log::debug!("cloud: state: {}", self.state.name());
            return;
        }
        log::debug!(
            "cloud: state transition: {} -> {}",
            self.state.name(),
            new_state.name()
        );
        self.state = new_state;
    }

    fn set_sub_state(&mut self, new_sub_state: SubState) {
        if new_sub_state == self.sub_state {
            log::debug!("cloud: sub state: {}", self.sub_state.name());
            return;
        }
        log::debug!(
            "cloud: sub state transition: {} -> {}",
            self.sub_state.name(),
            new_sub_state.name()
        );
        self.sub_state = new_sub_state;
    }

    /// Current state
    pub fn state(&self) -> State {
        self.state
    }

    /// Current server-session sub-state
    pub fn sub_state(&self) -> SubState {
        self.sub_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TransportError;
    use crate::testkit::{sample, Recorder, StubTransport};

    fn start_event() -> Event {
        Event::App(AppEvent::Start(AppConfig::default()))
    }

    /// Drive the coordinator to LTE_CONNECTED / SERVER_CONNECTED the way
    /// the bus would: its own published events are fed back to it.
    fn connected(transport: StubTransport) -> (CloudCoordinator<StubTransport>, Recorder) {
        let mut cloud = CloudCoordinator::new(transport);
        let sink = Recorder::new();

        cloud.handle(&start_event(), &sink);
        cloud.handle(&Event::Modem(ModemEvent::LteConnected), &sink);
        for event in sink.take() {
            cloud.handle(&event, &sink);
        }
        assert_eq!(cloud.state(), State::LteConnected);
        assert_eq!(cloud.sub_state(), SubState::ServerConnected);
        sink.take();
        (cloud, sink)
    }

    #[test]
    fn start_moves_to_lte_disconnected() {
        let mut cloud = CloudCoordinator::new(StubTransport::new());
        let sink = Recorder::new();

        cloud.handle(&start_event(), &sink);

        assert_eq!(cloud.state(), State::LteDisconnected);
        assert!(sink.take().is_empty());
    }

    #[test]
    fn lte_connected_publishes_connecting_then_connected() {
        let mut cloud = CloudCoordinator::new(StubTransport::new());
        let sink = Recorder::new();

        cloud.handle(&start_event(), &sink);
        cloud.handle(&Event::Modem(ModemEvent::LteConnected), &sink);

        assert_eq!(
            sink.take(),
            vec![
                Event::Cloud(CloudEvent::ServerConnecting),
                Event::Cloud(CloudEvent::ServerConnected),
            ]
        );
        assert_eq!(cloud.state(), State::LteConnected);
        // Session establishment is a distinct signal; the sub-state flips
        // only when the server-connected event is processed.
        assert_eq!(cloud.sub_state(), SubState::ServerDisconnected);
    }

    #[test]
    fn failed_connect_publishes_connecting_only() {
        let transport = StubTransport::new().failing_connect(TransportError::ConnectFailed {
            reason: "unreachable",
        });
        let mut cloud = CloudCoordinator::new(transport);
        let sink = Recorder::new();

        cloud.handle(&start_event(), &sink);
        cloud.handle(&Event::Modem(ModemEvent::LteConnected), &sink);

        assert_eq!(
            sink.take(),
            vec![Event::Cloud(CloudEvent::ServerConnecting)]
        );
        assert_eq!(cloud.sub_state(), SubState::ServerDisconnected);
    }

    #[test]
    fn session_establishment_fetches_device_config() {
        let transport = StubTransport::new().with_config(br#"{"active_wait_timeout": 60}"#);
        let fetches = transport.fetches();
        let mut cloud = CloudCoordinator::new(transport);
        let sink = Recorder::new();

        cloud.handle(&start_event(), &sink);
        cloud.handle(&Event::Modem(ModemEvent::LteConnected), &sink);
        for event in sink.take() {
            cloud.handle(&event, &sink);
        }

        assert_eq!(*fetches.borrow(), 1);
        let events = sink.take();
        match &events[..] {
            [Event::Cloud(CloudEvent::ConfigReceived(proposed))] => {
                assert_eq!(proposed.active_wait_timeout_s, 60);
                // Absent fields inherit the snapshot.
                assert_eq!(
                    proposed.location_timeout_s,
                    AppConfig::default().location_timeout_s
                );
            }
            other => panic!("unexpected events {other:?}"),
        }
    }

    #[test]
    fn fix_uploads_telemetry_and_refetches_config() {
        let transport = StubTransport::new().with_config(br#"{}"#);
        let sent = transport.sent();
        let fetches = transport.fetches();
        let (mut cloud, sink) = connected(transport);

        cloud.handle(
            &Event::Location(LocationEvent::GnssDataReady(sample())),
            &sink,
        );

        assert_eq!(sent.borrow().len(), 1);
        // One fetch at session establishment, one riding on the upload.
        assert_eq!(*fetches.borrow(), 2);

        let events = sink.take();
        assert_eq!(events[0], Event::Cloud(CloudEvent::DataSent));
        assert!(matches!(
            events[1],
            Event::Cloud(CloudEvent::ConfigReceived(_))
        ));
    }

    #[test]
    fn failed_upload_still_refetches_config() {
        let transport = StubTransport::new()
            .with_config(br#"{}"#)
            .failing_send(TransportError::SendFailed { reason: "timeout" });
        let fetches = transport.fetches();
        let (mut cloud, sink) = connected(transport);

        cloud.handle(
            &Event::Location(LocationEvent::GnssDataReady(sample())),
            &sink,
        );

        assert_eq!(*fetches.borrow(), 2);
        let events = sink.take();
        // No data-sent event, but the config refresh still happened.
        assert!(matches!(
            events.as_slice(),
            [Event::Cloud(CloudEvent::ConfigReceived(_))]
        ));
    }

    #[test]
    fn malformed_config_response_publishes_nothing() {
        let transport = StubTransport::new().with_config(b"garbage");
        let mut cloud = CloudCoordinator::new(transport);
        let sink = Recorder::new();

        cloud.handle(&start_event(), &sink);
        cloud.handle(&Event::Modem(ModemEvent::LteConnected), &sink);
        for event in sink.take() {
            cloud.handle(&event, &sink);
        }

        assert!(sink.take().is_empty());
        assert_eq!(cloud.sub_state(), SubState::ServerConnected);
    }

    #[test]
    fn button_press_requests_location_fetch() {
        let (mut cloud, sink) = connected(StubTransport::new().with_config(br#"{}"#));

        cloud.handle(&Event::Cloud(CloudEvent::ButtonPressed), &sink);

        assert_eq!(sink.take(), vec![Event::App(AppEvent::LocationGet)]);
    }

    #[test]
    fn session_loss_falls_back_to_server_disconnected() {
        let (mut cloud, sink) = connected(StubTransport::new().with_config(br#"{}"#));

        cloud.handle(&Event::Cloud(CloudEvent::ServerDisconnected), &sink);

        assert_eq!(cloud.state(), State::LteConnected);
        assert_eq!(cloud.sub_state(), SubState::ServerDisconnected);
    }

    #[test]
    fn lte_loss_resets_session_sub_state() {
        let (mut cloud, sink) = connected(StubTransport::new().with_config(br#"{}"#));

        cloud.handle(&Event::Modem(ModemEvent::LteDisconnected), &sink);

        assert_eq!(cloud.state(), State::LteDisconnected);
        assert_eq!(cloud.sub_state(), SubState::ServerDisconnected);
    }

    #[test]
    fn telemetry_carries_snapshot_device_id() {
        let transport = StubTransport::new().with_config(br#"{}"#);
        let sent = transport.sent();
        let (mut cloud, sink) = connected(transport);

        let mut config = AppConfig::default();
        config.device_id = 99;
        cloud.handle(&Event::App(AppEvent::ConfigUpdate(config)), &sink);
        cloud.handle(
            &Event::Location(LocationEvent::GnssDataReady(sample())),
            &sink,
        );

        let raw = sent.borrow()[0].clone();
        let doc: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(doc["device_id"], 99);
    }
}
