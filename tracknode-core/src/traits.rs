//! Collaborator Interfaces
//!
//! The coordination core drives its peripherals and network through the
//! traits below and nothing else. AT commands, GNSS internals, wire
//! framing, LED PWM and flash persistence all live behind these seams;
//! the core only sees blocking calls and the completion events its thin
//! adapters publish.
//!
//! Keep them simple - the firmware has exactly one implementation of each
//! in production and one mock of each in tests.

use core::time::Duration;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

use crate::errors::{LocationError, ModemError, TransportError};
use crate::events::{FixMethod, LocationSample};

/// LTE modem control.
///
/// `attach` blocks until the network accepts or rejects the registration;
/// the modem coordinator is the only caller and owns that wait. Loss of
/// registration is delivered asynchronously by the driver through a
/// link-loss publication, not through this trait.
pub trait ModemControl {
    /// Attach to the LTE network. Blocking.
    fn attach(&mut self) -> Result<(), ModemError>;
}

/// Final result of one positioning search
#[derive(Debug, Clone, PartialEq)]
pub enum LocationOutcome {
    /// A fix was resolved.
    Fix(LocationSample),
    /// The deadline expired without a fix.
    Timeout,
    /// The positioning service failed.
    Error,
}

/// Positioning service control.
///
/// One search may be outstanding at a time; the location coordinator
/// enforces that. Completion does not come back through this trait: the
/// driver's callback hands a [`LocationOutcome`] to the coordinator's
/// outcome adapter, which publishes the terminal event pair.
pub trait LocationService {
    /// Initialize the receiver and the date-time synchronization hook.
    /// Called once LTE connectivity exists.
    fn start(&mut self) -> Result<(), LocationError>;

    /// Begin a single search with the given deadline, trying `methods` in
    /// order until one resolves a fix.
    fn request(&mut self, deadline: Duration, methods: &[FixMethod]) -> Result<(), LocationError>;
}

/// Server transport for telemetry and device configuration.
///
/// The cloud coordinator owns every call here and is allowed to block in
/// them; framing and addressing are the implementation's business.
pub trait CloudTransport {
    /// Establish the server session. Blocking.
    fn connect(&mut self) -> Result<(), TransportError>;

    /// Send one encoded telemetry document. Fire-and-forget.
    fn send_telemetry(&mut self, payload: &[u8]) -> Result<(), TransportError>;

    /// Request the device configuration document and block for the raw
    /// response body.
    fn fetch_config(&mut self) -> Result<Vec<u8>, TransportError>;
}

/// Visual effect selection
///
/// The full vocabulary the LED hardware layer knows how to render. The
/// coordinator selects exactly one active effect at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LedEffect {
    /// Breathing pattern while LTE registration is in progress.
    LteConnecting,
    /// Breathing pattern while a positioning search runs.
    LocationSearching,
    /// Clock pattern while telemetry is being uploaded.
    CloudSendingData,
    /// Clock pattern while the server session is being established.
    CloudConnecting,
    /// Steady mode indication: active sampling.
    ActiveMode,
    /// Steady mode indication: passive sampling.
    PassiveMode,
    /// Solid error indication for unrecoverable board faults.
    SystemFault,
    /// All LEDs off.
    Off,
}

impl LedEffect {
    /// Get human-readable name for log lines
    pub const fn name(&self) -> &'static str {
        match self {
            LedEffect::LteConnecting => "lte_connecting",
            LedEffect::LocationSearching => "location_searching",
            LedEffect::CloudSendingData => "cloud_sending_data",
            LedEffect::CloudConnecting => "cloud_connecting",
            LedEffect::ActiveMode => "active_mode",
            LedEffect::PassiveMode => "passive_mode",
            LedEffect::SystemFault => "system_fault",
            LedEffect::Off => "off",
        }
    }
}

/// LED hardware layer: renders one effect until told otherwise
pub trait LedDriver {
    /// Replace the active effect.
    fn show(&mut self, effect: LedEffect);
}

/// Periodic sampling timer owned by the application coordinator.
///
/// Arming is auto-rearming: the timer fires every `period` until re-armed.
/// Re-arming cancels the pending expiry, so only the new period fires
/// thereafter.
pub trait SampleTimer {
    /// (Re-)arm the periodic timer.
    fn arm(&mut self, period: Duration);
}
