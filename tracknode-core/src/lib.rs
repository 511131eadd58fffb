//! Coordination core for the Tracknode LTE/GNSS asset tracker
//!
//! Coordinates the tracker's subsystems - LTE attach, periodic position
//! acquisition, telemetry upload, remote configuration and visual status -
//! through one mechanism: a typed event bus fanning every published event
//! out into per-coordinator bounded mailboxes, each drained by an
//! independent hierarchical state machine.
//!
//! Key constraints:
//! - Fixed, compile-time-known event taxonomy and subscriber set
//! - No shared mutable state between coordinators; configuration
//!   replicates by value through events
//! - Bounded memory everywhere; publishers never block on a slow consumer
//!
//! ```no_run
//! use tracknode_core::runtime::Runtime;
//! # use tracknode_core::errors::*;
//! # use tracknode_core::traits::*;
//! # use tracknode_core::FixMethod;
//! # struct Modem; struct Gnss; struct Coap; struct Leds;
//! # impl ModemControl for Modem { fn attach(&mut self) -> Result<(), ModemError> { Ok(()) } }
//! # impl LocationService for Gnss {
//! #     fn start(&mut self) -> Result<(), LocationError> { Ok(()) }
//! #     fn request(&mut self, _: core::time::Duration, _: &[FixMethod]) -> Result<(), LocationError> { Ok(()) }
//! # }
//! # impl CloudTransport for Coap {
//! #     fn connect(&mut self) -> Result<(), TransportError> { Ok(()) }
//! #     fn send_telemetry(&mut self, _: &[u8]) -> Result<(), TransportError> { Ok(()) }
//! #     fn fetch_config(&mut self) -> Result<Vec<u8>, TransportError> { Ok(b"{}".to_vec()) }
//! # }
//! # impl LedDriver for Leds { fn show(&mut self, _: LedEffect) {} }
//!
//! let runtime = Runtime::start(Modem, Gnss, Coap, Leds);
//!
//! // Driver callbacks feed the bus through the runtime's adapters:
//! runtime.button_pressed();
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod bus;
pub mod codec;
pub mod config;
pub mod coordinators;
pub mod errors;
pub mod events;
pub mod mailbox;
pub mod traits;

#[cfg(feature = "std")]
pub mod runtime;

#[cfg(test)]
pub(crate) mod testkit;

// Public API
pub use bus::{Bus, BusBuilder, EventSink, SubscriberId};
pub use config::AppConfig;
pub use errors::{CodecError, LocationError, ModemError, TransportError};
pub use events::{
    AppEvent, CloudEvent, Event, FixMethod, LocationEvent, LocationSample, ModemEvent, Source,
    SourceSet,
};
pub use mailbox::{Mailbox, MAILBOX_CAPACITY};
pub use traits::{
    CloudTransport, LedDriver, LedEffect, LocationOutcome, LocationService, ModemControl,
    SampleTimer,
};

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
