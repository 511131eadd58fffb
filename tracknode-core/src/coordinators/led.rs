//! LED Coordinator
//!
//! Pure consumer translating the aggregate system state into a single
//! visual effect. Nothing here is authoritative - mode, search activity
//! and session progress are all mirrored from observed events, and the
//! coordinator never publishes.
//!
//! State nesting mirrors what the LED actually has to express:
//!
//! - top level: normal running vs "connecting to server" takeover,
//! - mode sub-state: which steady effect to fall back to,
//! - search sub-sub-state: whether the searching pattern overrides the
//!   steady effect.
//!
//! Every handled transition selects exactly one effect; the driver renders
//! one effect at a time, so a new selection always replaces the previous
//! one.

use crate::bus::EventSink;
use crate::config::AppConfig;
use crate::events::{AppEvent, CloudEvent, Event, LocationEvent};
use crate::traits::{LedDriver, LedEffect};

/// LED coordinator states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Nothing shown yet.
    Init,
    /// Mirroring normal operation.
    Running,
    /// Server-session establishment takeover.
    CloudConnecting,
}

/// Mirrored mode sub-states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubState {
    /// Mirror of active sampling mode.
    ActiveMode,
    /// Mirror of passive sampling mode.
    PassiveMode,
}

/// Mirrored search sub-sub-states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubSubState {
    /// A positioning search is running.
    LocationSearching,
    /// No search running.
    LocationNotSearching,
}

impl State {
    const fn name(&self) -> &'static str {
        match self {
            State::Init => "INIT",
            State::Running => "RUNNING",
            State::CloudConnecting => "CLOUD_CONNECTING",
        }
    }
}

impl SubState {
    const fn name(&self) -> &'static str {
        match self {
            SubState::ActiveMode => "ACTIVE_MODE",
            SubState::PassiveMode => "PASSIVE_MODE",
        }
    }

    fn for_config(config: &AppConfig) -> Self {
        if config.active_mode {
            SubState::ActiveMode
        } else {
            SubState::PassiveMode
        }
    }

    const fn effect(&self) -> LedEffect {
        match self {
            SubState::ActiveMode => LedEffect::ActiveMode,
            SubState::PassiveMode => LedEffect::PassiveMode,
        }
    }
}

impl SubSubState {
    const fn name(&self) -> &'static str {
        match self {
            SubSubState::LocationSearching => "LOCATION_SEARCHING",
            SubSubState::LocationNotSearching => "LOCATION_NOT_SEARCHING",
        }
    }
}

/// Visual status mirror
pub struct LedCoordinator<D: LedDriver> {
    state: State,
    sub_state: SubState,
    sub_sub_state: SubSubState,
    driver: D,
}

impl<D: LedDriver> LedCoordinator<D> {
    /// Create the coordinator around the LED hardware layer
    pub fn new(driver: D) -> Self {
        Self {
            state: State::Init,
            sub_state: SubState::ActiveMode,
            sub_sub_state: SubSubState::LocationNotSearching,
            driver,
        }
    }

    /// Process one event from this coordinator's mailbox.
    ///
    /// The sink is unused - this coordinator only consumes - but it is
    /// wired to the bus like every other coordinator.
    pub fn handle<S: EventSink>(&mut self, event: &Event, _sink: &S) {
        match self.state {
            State::Init => self.on_state_init(event),
            State::Running => {}
            State::CloudConnecting => self.on_state_cloud_connecting(event),
        }
        self.on_all_states(event);
    }

    fn on_state_init(&mut self, event: &Event) {
        if let Event::App(AppEvent::Start(config)) = event {
            self.set_sub_state(SubState::for_config(config));
            self.set_state(State::Running);
            self.driver.show(self.sub_state.effect());
        }
    }

    fn on_state_cloud_connecting(&mut self, event: &Event) {
        if let Event::Cloud(CloudEvent::ServerConnected) = event {
            self.driver.show(self.sub_state.effect());
            self.set_state(State::Running);
        }
    }

    fn on_all_states(&mut self, event: &Event) {
        match event {
            Event::Cloud(CloudEvent::ServerConnecting) => {
                self.driver.show(LedEffect::CloudConnecting);
                self.set_state(State::CloudConnecting);
            }
            Event::Location(LocationEvent::Active) => {
                if self.sub_sub_state != SubSubState::LocationSearching {
                    self.driver.show(LedEffect::LocationSearching);
                    self.set_sub_sub_state(SubSubState::LocationSearching);
                }
            }
            Event::Location(LocationEvent::Inactive) => {
                if self.sub_sub_state == SubSubState::LocationSearching {
                    self.set_sub_sub_state(SubSubState::LocationNotSearching);
                    if self.state == State::Running {
                        self.driver.show(self.sub_state.effect());
                    }
                }
            }
            Event::App(AppEvent::ConfigUpdate(config)) => {
                let mirrored = SubState::for_config(config);
                if mirrored != self.sub_state {
                    self.set_sub_state(mirrored);
                    if self.state == State::Running
                        && self.sub_sub_state == SubSubState::LocationNotSearching
                    {
                        self.driver.show(self.sub_state.effect());
                    }
                }
            }
            _ => {}
        }
    }

    fn set_state(&mut self, new_state: State) {
        if new_state == self.state {
            log::debug!("led: state: {}", self.state.name());
            return;
        }
        log::debug!(
            "led: state transition: {} -> {}",
            self.state.name(),
            new_state.name()
        );
        self.state = new_state;
    }

    fn set_sub_state(&mut self, new_sub_state: SubState) {
        if new_sub_state == self.sub_state {
            log::debug!("led: sub state: {}", self.sub_state.name());
            return;
        }
        log::debug!(
            "led: sub state transition: {} -> {}",
            self.sub_state.name(),
            new_sub_state.name()
        );
        self.sub_state = new_sub_state;
    }

    fn set_sub_sub_state(&mut self, new_sub_sub_state: SubSubState) {
        if new_sub_sub_state == self.sub_sub_state {
            log::debug!("led: sub sub state: {}", self.sub_sub_state.name());
            return;
        }
        log::debug!(
            "led: sub sub state transition: {} -> {}",
            self.sub_sub_state.name(),
            new_sub_sub_state.name()
        );
        self.sub_sub_state = new_sub_sub_state;
    }

    /// Current state
    pub fn state(&self) -> State {
        self.state
    }

    /// Current mirrored mode
    pub fn sub_state(&self) -> SubState {
        self.sub_state
    }

    /// Current mirrored search activity
    pub fn sub_sub_state(&self) -> SubSubState {
        self.sub_sub_state
    }
}
