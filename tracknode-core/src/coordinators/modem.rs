//! Modem Coordinator
//!
//! Owns the LTE connection. The attach itself is a blocking call into the
//! modem driver, so only the two terminal outcomes are observable as
//! states: DISCONNECTED and CONNECTED.
//!
//! Registration loss is reported by the driver asynchronously; its adapter
//! publishes the LTE-disconnected event and this coordinator falls back to
//! DISCONNECTED on observing it. There is no automatic re-attach from
//! there: attach runs again only on a fresh start event, which occurs once
//! at boot.

use crate::bus::EventSink;
use crate::events::{AppEvent, Event, ModemEvent};
use crate::traits::ModemControl;

/// Modem coordinator states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// No LTE registration.
    Disconnected,
    /// Registered with the network.
    Connected,
}

impl State {
    const fn name(&self) -> &'static str {
        match self {
            State::Disconnected => "DISCONNECTED",
            State::Connected => "CONNECTED",
        }
    }
}

/// LTE connection state machine
pub struct ModemCoordinator<M: ModemControl> {
    state: State,
    modem: M,
}

impl<M: ModemControl> ModemCoordinator<M> {
    /// Create the coordinator around the modem driver
    pub fn new(modem: M) -> Self {
        Self {
            state: State::Disconnected,
            modem,
        }
    }

    /// Process one event from this coordinator's mailbox
    pub fn handle<S: EventSink>(&mut self, event: &Event, sink: &S) {
        match self.state {
            State::Disconnected => self.on_state_disconnected(event, sink),
            State::Connected => self.on_state_connected(event),
        }
    }

    fn on_state_disconnected<S: EventSink>(&mut self, event: &Event, sink: &S) {
        if let Event::App(AppEvent::Start(_)) = event {
            match self.modem.attach() {
                Ok(()) => {
                    sink.publish(Event::Modem(ModemEvent::LteConnected));
                    self.set_state(State::Connected);
                }
                Err(err) => log::error!("modem: attach failed: {err}"),
            }
        }
    }

    fn on_state_connected(&mut self, event: &Event) {
        if let Event::Modem(ModemEvent::LteDisconnected) = event {
            self.set_state(State::Disconnected);
        }
    }

    fn set_state(&mut self, new_state: State) {
        if new_state == self.state {
            log::debug!("modem: state: {}", self.state.name());
            return;
        }
        log::debug!(
            "modem: state transition: {} -> {}",
            self.state.name(),
            new_state.name()
        );
        self.state = new_state;
    }

    /// Current state
    pub fn state(&self) -> State {
        self.state
    }
}
