//! Thread-Per-Coordinator Runtime
//!
//! ## Overview
//!
//! Hosts the coordination core on an OS scheduler: one thread per
//! coordinator, each blocking only on its own mailbox (or inside an
//! external operation it owns), plus the sampling-timer thread. This is
//! the `std` rendition of the firmware's fixed thread table; the
//! coordinators themselves are identical in both worlds.
//!
//! ```text
//!            ┌────────────────────────────── Bus ─────────────────────────────┐
//!            │  app       modem       location       cloud       led          │
//!            └───▲──────────▲────────────▲─────────────▲──────────▲───────────┘
//!                │recv      │recv        │recv         │recv      │recv
//!             app thread  modem thread  location th.  cloud th.  led thread
//!
//!  timer thread ── app.location_get on every period expiry ──► Bus
//! ```
//!
//! ## External Callbacks
//!
//! Driver callbacks never run a state machine. The adapters on
//! [`Runtime`] ([`Runtime::button_pressed`], [`Runtime::link_lost`],
//! [`Runtime::server_session_lost`], [`Runtime::location_outcome`])
//! translate each callback into one or two publishes and return; the
//! owning coordinator picks the events up on its own thread.

use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Instant;

use core::time::Duration;

use crate::bus::{Bus, BusBuilder, EventSink};
use crate::config::AppConfig;
use crate::coordinators::location::report_outcome;
use crate::coordinators::{
    AppCoordinator, CloudCoordinator, LedCoordinator, LocationCoordinator, ModemCoordinator,
};
use crate::events::{AppEvent, CloudEvent, Event, ModemEvent, SourceSet};
use crate::traits::{
    CloudTransport, LedDriver, LocationOutcome, LocationService, ModemControl, SampleTimer,
};

/// A started coordination core
///
/// Threads run for the life of the process; there is no teardown path
/// other than reset, matching the device.
pub struct Runtime {
    bus: Arc<Bus>,
}

impl Runtime {
    /// Start with the boot default configuration
    pub fn start<M, L, C, D>(modem: M, location: L, transport: C, led: D) -> Self
    where
        M: ModemControl + Send + 'static,
        L: LocationService + Send + 'static,
        C: CloudTransport + Send + 'static,
        D: LedDriver + Send + 'static,
    {
        Self::start_with_config(AppConfig::default(), modem, location, transport, led)
    }

    /// Start with an injected boot configuration (restore point for the
    /// external persisted-configuration hook)
    pub fn start_with_config<M, L, C, D>(
        config: AppConfig,
        modem: M,
        location: L,
        transport: C,
        led: D,
    ) -> Self
    where
        M: ModemControl + Send + 'static,
        L: LocationService + Send + 'static,
        C: CloudTransport + Send + 'static,
        D: LedDriver + Send + 'static,
    {
        let mut builder = BusBuilder::new();
        let app_id = builder.attach(
            "app",
            SourceSet::APP.with(SourceSet::MODEM).with(SourceSet::CLOUD),
        );
        let modem_id = builder.attach("modem", SourceSet::all());
        let location_id = builder.attach("location", SourceSet::all());
        let cloud_id = builder.attach("cloud", SourceSet::all());
        let led_id = builder.attach("led", SourceSet::all());
        let bus = Arc::new(builder.build());

        let timer = IntervalTimer::spawn(Arc::clone(&bus));

        {
            let bus = Arc::clone(&bus);
            thread::spawn(move || {
                let mut app = AppCoordinator::with_config(timer, config);
                app.boot(&*bus);
                loop {
                    let event = bus.mailbox(app_id).recv();
                    app.handle(&event, &*bus);
                }
            });
        }
        {
            let bus = Arc::clone(&bus);
            thread::spawn(move || {
                let mut modem = ModemCoordinator::new(modem);
                loop {
                    let event = bus.mailbox(modem_id).recv();
                    modem.handle(&event, &*bus);
                }
            });
        }
        {
            let bus = Arc::clone(&bus);
            thread::spawn(move || {
                let mut location = LocationCoordinator::new(location);
                loop {
                    let event = bus.mailbox(location_id).recv();
                    location.handle(&event, &*bus);
                }
            });
        }
        {
            let bus = Arc::clone(&bus);
            thread::spawn(move || {
                let mut cloud = CloudCoordinator::new(transport);
                loop {
                    let event = bus.mailbox(cloud_id).recv();
                    cloud.handle(&event, &*bus);
                }
            });
        }
        {
            let bus = Arc::clone(&bus);
            thread::spawn(move || {
                let mut led = LedCoordinator::new(led);
                loop {
                    let event = bus.mailbox(led_id).recv();
                    led.handle(&event, &*bus);
                }
            });
        }

        Self { bus }
    }

    /// The bus, for wiring additional event producers
    pub fn bus(&self) -> &Arc<Bus> {
        &self.bus
    }

    /// Adapter for the modem driver's registration-loss callback
    pub fn link_lost(&self) {
        self.bus.publish(Event::Modem(ModemEvent::LteDisconnected));
    }

    /// Adapter for the transport's session-loss notification
    pub fn server_session_lost(&self) {
        self.bus
            .publish(Event::Cloud(CloudEvent::ServerDisconnected));
    }

    /// Adapter for the board button interrupt
    pub fn button_pressed(&self) {
        self.bus.publish(Event::Cloud(CloudEvent::ButtonPressed));
    }

    /// Adapter for the positioning driver's completion callback
    pub fn location_outcome(&self, outcome: LocationOutcome) {
        report_outcome(&*self.bus, outcome);
    }
}

struct TimerShared {
    state: Mutex<TimerState>,
    expiry: Condvar,
}

struct TimerState {
    period: Option<Duration>,
    /// Bumped on every arm; a sleeping expiry wakes, sees a new epoch and
    /// restarts with the new period, which cancels the pending tick.
    epoch: u64,
}

/// Periodic sampling timer publishing a location-get event on every expiry.
///
/// Auto-rearming: once armed it keeps firing every period until re-armed.
/// Expiry is an ordinary bus publish, so timer ticks get no ordering
/// privilege over any other event.
struct IntervalTimer {
    shared: Arc<TimerShared>,
}

impl IntervalTimer {
    fn spawn(bus: Arc<Bus>) -> Self {
        let shared = Arc::new(TimerShared {
            state: Mutex::new(TimerState {
                period: None,
                epoch: 0,
            }),
            expiry: Condvar::new(),
        });

        let worker = Arc::clone(&shared);
        thread::spawn(move || run_timer(&worker, &bus));

        Self { shared }
    }
}

impl SampleTimer for IntervalTimer {
    fn arm(&mut self, period: Duration) {
        let mut state = self
            .shared
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        state.period = Some(period);
        state.epoch += 1;
        self.shared.expiry.notify_one();
    }
}

fn run_timer(shared: &TimerShared, bus: &Bus) {
    let mut state = shared
        .state
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    loop {
        let period = match state.period {
            Some(period) => period,
            None => {
                state = shared
                    .expiry
                    .wait(state)
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                continue;
            }
        };
        let epoch = state.epoch;
        let deadline = Instant::now() + period;

        loop {
            if state.epoch != epoch {
                // Re-armed; the pending expiry is cancelled.
                break;
            }
            let now = Instant::now();
            if now >= deadline {
                drop(state);
                bus.publish(Event::App(AppEvent::LocationGet));
                state = shared
                    .state
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                break;
            }
            let (next, _) = shared
                .expiry
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            state = next;
        }
    }
}
