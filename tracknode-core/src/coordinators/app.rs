//! Application Coordinator
//!
//! Master state machine of the device. Owns the authoritative
//! [`AppConfig`], the active/passive mode decision and the periodic
//! sampling timer, and is the only place remote configuration proposals
//! are validated and merged.
//!
//! Boot sequence: publish the start event carrying the boot configuration,
//! then move to RUNNING on observing it, pick the mode sub-state from the
//! configuration and arm the sampling timer with that mode's interval.
//! From then on everything is event-driven:
//!
//! - timer expiry arrives as a location-get event (published by the timer
//!   itself) and needs no handling here;
//! - a received cloud configuration is merged field-by-field and, when
//!   anything validated actually changed, re-published once as a whole
//!   config-update event;
//! - observing its own config-update re-arms the timer with the interval
//!   for the (possibly new) mode, so a changed interval takes effect on
//!   the next tick;
//! - the first server-connected event triggers one immediate location
//!   fetch so a fresh boot does not wait a full sampling interval for its
//!   first fix. Latched: reconnections do not re-trigger it.

use crate::bus::EventSink;
use crate::config::AppConfig;
use crate::events::{AppEvent, CloudEvent, Event};
use crate::traits::SampleTimer;

/// Application coordinator states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Waiting for the boot event.
    Init,
    /// Normal operation.
    Running,
    /// Terminal; reached only on fatal board-level init failure.
    Shutdown,
}

/// Mode sub-states while running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubState {
    /// Frequent fixed-interval sampling.
    ActiveMode,
    /// Infrequent sampling.
    PassiveMode,
}

impl State {
    const fn name(&self) -> &'static str {
        match self {
            State::Init => "INIT",
            State::Running => "RUNNING",
            State::Shutdown => "SHUTDOWN",
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
}

/// Master mode / configuration state machine
pub struct AppCoordinator<T: SampleTimer> {
    state: State,
    sub_state: SubState,
    config: AppConfig,
    timer: T,
    first_fix_requested: bool,
}

impl<T: SampleTimer> AppCoordinator<T> {
    /// Create the coordinator with the boot default configuration
    pub fn new(timer: T) -> Self {
        Self::with_config(timer, AppConfig::default())
    }

    /// Create the coordinator with an injected boot configuration
    /// (restore point for externally persisted configuration).
    pub fn with_config(timer: T, config: AppConfig) -> Self {
        Self {
            state: State::Init,
            sub_state: SubState::for_config(&config),
            config,
            timer,
            first_fix_requested: false,
        }
    }

    /// Announce boot: publishes the start event carrying the boot
    /// configuration. Called once before the event loop runs.
    pub fn boot<S: EventSink>(&self, sink: &S) {
        sink.publish(Event::App(AppEvent::Start(self.config)));
    }

    /// Process one event from this coordinator's mailbox
    pub fn handle<S: EventSink>(&mut self, event: &Event, sink: &S) {
        match self.state {
            State::Init => self.on_state_init(event),
            State::Running => {
                match self.sub_state {
                    SubState::ActiveMode => self.on_sub_state_active(event),
                    SubState::PassiveMode => self.on_sub_state_passive(event),
                }
                self.on_state_running(event, sink);
            }
            State::Shutdown => {}
        }
    }

    fn on_state_init(&mut self, event: &Event) {
        if let Event::App(AppEvent::Start(config)) = event {
            self.config = *config;
            self.set_state(State::Running);
            self.set_sub_state(SubState::for_config(config));
            self.timer.arm(self.config.sample_interval());
        }
    }

    fn on_sub_state_active(&mut self, event: &Event) {
        if let Event::App(AppEvent::ConfigUpdate(_)) = event {
            if self.config.active_mode {
                self.timer.arm(self.config.sample_interval());
            } else {
                self.set_sub_state(SubState::PassiveMode);
                self.timer.arm(self.config.sample_interval());
            }
        }
    }

    fn on_sub_state_passive(&mut self, event: &Event) {
        if let Event::App(AppEvent::ConfigUpdate(_)) = event {
            if self.config.active_mode {
                self.set_sub_state(SubState::ActiveMode);
                self.timer.arm(self.config.sample_interval());
            } else {
                self.timer.arm(self.config.sample_interval());
            }
        }
    }

    fn on_state_running<S: EventSink>(&mut self, event: &Event, sink: &S) {
        match event {
            Event::Cloud(CloudEvent::ConfigReceived(proposed)) => {
                let outcome = self.config.merge_validated(proposed);
                if outcome.changed {
                    sink.publish(Event::App(AppEvent::ConfigUpdate(self.config)));
                } else {
                    log::debug!("app: received config matches current, no update");
                }
            }
            Event::Cloud(CloudEvent::ServerConnected) => {
                // One immediate fetch as soon as connectivity exists, so
                // the first fix does not wait out a sampling interval.
                if !self.first_fix_requested {
                    self.first_fix_requested = true;
                    sink.publish(Event::App(AppEvent::LocationGet));
                }
            }
            _ => {}
        }
    }

    fn set_state(&mut self, new_state: State) {
        if new_state == self.state {
            log::debug!("app: state: {}", self.state.name());
            return;
        }
        log::debug!(
            "app: state transition: {} -> {}",
            self.state.name(),
            new_state.name()
        );
        self.state = new_state;
    }

    fn set_sub_state(&mut self, new_sub_state: SubState) {
        if new_sub_state == self.sub_state {
            log::debug!("app: sub state: {}", self.sub_state.name());
            return;
        }
        log::debug!(
            "app: sub state transition: {} -> {}",
            self.sub_state.name(),
            new_sub_state.name()
        );
        self.sub_state = new_sub_state;
    }

    /// Current state
    pub fn state(&self) -> State {
        self.state
    }

    /// Current mode sub-state
    pub fn sub_state(&self) -> SubState {
        self.sub_state
    }

    /// The authoritative configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
