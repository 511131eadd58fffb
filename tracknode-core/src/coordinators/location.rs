//! Location Coordinator
//!
//! Owns positioning. Initializes the receiver once LTE connectivity
//! exists, then serves location-get requests one at a time:
//!
//! ```text
//! INIT ──lte connected / service start──► RUNNING/IDLE
//!
//! IDLE ──location_get / request(deadline)──► SEARCHING   (+ active event)
//! SEARCHING ──location_get──► SEARCHING                  (ignored, logged)
//! SEARCHING ──inactive──► IDLE
//! ```
//!
//! At most one search is ever outstanding - that admission check is the
//! core invariant here. The search deadline comes from the coordinator's
//! configuration snapshot, refreshed on start/config-update events.
//!
//! The positioning driver completes asynchronously. Its callback must not
//! run the state machine, so the completion path is a thin adapter,
//! [`report_outcome`], that translates the single outcome into exactly two
//! published events: the terminal kind (data-ready, timeout or error)
//! followed unconditionally by the inactive event that returns the
//! sub-state to IDLE.

use crate::bus::EventSink;
use crate::config::AppConfig;
use crate::events::{AppEvent, Event, FixMethod, LocationEvent, ModemEvent};
use crate::traits::{LocationOutcome, LocationService};

/// Method order for every search: satellite fix first, cell-tower
/// fallback when it cannot resolve within the deadline.
pub const METHOD_PREFERENCE: [FixMethod; 2] = [FixMethod::Gnss, FixMethod::Cellular];

/// Location coordinator states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Waiting for LTE before initializing the receiver.
    Init,
    /// Receiver initialized, serving requests.
    Running,
}

/// Search sub-states while running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubState {
    /// No search outstanding.
    Idle,
    /// Exactly one search outstanding.
    Searching,
}

impl State {
    const fn name(&self) -> &'static str {
        match self {
            State::Init => "INIT",
            State::Running => "RUNNING",
        }
    }
}

impl SubState {
    const fn name(&self) -> &'static str {
        match self {
            SubState::Idle => "IDLE",
            SubState::Searching => "SEARCHING",
        }
    }
}

/// Translate one search completion into its event pair.
///
/// Called from the positioning driver's completion context (thread or
/// callback); publishes and returns, never blocks.
pub fn report_outcome<S: EventSink>(sink: &S, outcome: LocationOutcome) {
    match outcome {
        LocationOutcome::Fix(sample) => {
            sink.publish(Event::Location(LocationEvent::GnssDataReady(sample)));
        }
        LocationOutcome::Timeout => sink.publish(Event::Location(LocationEvent::Timeout)),
        LocationOutcome::Error => sink.publish(Event::Location(LocationEvent::Error)),
    }
    sink.publish(Event::Location(LocationEvent::Inactive));
}

/// Positioning state machine
pub struct LocationCoordinator<L: LocationService> {
    state: State,
    sub_state: SubState,
    config: AppConfig,
    service: L,
}

impl<L: LocationService> LocationCoordinator<L> {
    /// Create the coordinator around the positioning service
    pub fn new(service: L) -> Self {
        Self {
            state: State::Init,
            sub_state: SubState::Idle,
            config: AppConfig::default(),
            service,
        }
    }

    /// Process one event from this coordinator's mailbox
    pub fn handle<S: EventSink>(&mut self, event: &Event, sink: &S) {
        self.on_all_states(event);

        match self.state {
            State::Init => self.on_state_init(event),
            State::Running => match self.sub_state {
                SubState::Idle => self.on_sub_state_idle(event, sink),
                SubState::Searching => self.on_sub_state_searching(event),
            },
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

    fn on_state_init(&mut self, event: &Event) {
        if let Event::Modem(ModemEvent::LteConnected) = event {
            match self.service.start() {
                Ok(()) => {
                    self.set_state(State::Running);
                    self.set_sub_state(SubState::Idle);
                }
                // Transient: stay in INIT, retried on the next LTE attach.
                Err(err) => log::error!("location: service start failed: {err}"),
            }
        }
    }

    fn on_sub_state_idle<S: EventSink>(&mut self, event: &Event, sink: &S) {
        if let Event::App(AppEvent::LocationGet) = event {
            match self
                .service
                .request(self.config.location_timeout(), &METHOD_PREFERENCE)
            {
                Ok(()) => {
                    sink.publish(Event::Location(LocationEvent::Active));
                    self.set_sub_state(SubState::Searching);
                }
                Err(err) => log::error!("location: request failed: {err}"),
            }
        }
    }

    fn on_sub_state_searching(&mut self, event: &Event) {
        match event {
            Event::App(AppEvent::LocationGet) => {
                // At most one outstanding search.
                log::info!("location: search already in progress, request ignored");
            }
            Event::Location(LocationEvent::Inactive) => {
                self.set_sub_state(SubState::Idle);
            }
            _ => {}
        }
    }

    fn set_state(&mut self, new_state: State) {
        if new_state == self.state {
            log::debug!("location: state: {}", self.state.name());
            return;
        }
        log::debug!(
            "location: state transition: {} -> {}",
            self.state.name(),
            new_state.name()
        );
        self.state = new_state;
    }

    fn set_sub_state(&mut self, new_sub_state: SubState) {
        if new_sub_state == self.sub_state {
            log::debug!("location: sub state: {}", self.sub_state.name());
            return;
        }
        log::debug!(
            "location: sub state transition: {} -> {}",
            self.sub_state.name(),
            new_sub_state.name()
        );
        self.sub_state = new_sub_state;
    }

    /// Current state
    pub fn state(&self) -> State {
        self.state
    }

    /// Current search sub-state
    pub fn sub_state(&self) -> SubState {
        self.sub_state
    }

    /// This coordinator's configuration snapshot
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
