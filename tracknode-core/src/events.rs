//! Event Taxonomy for the Tracker Coordination Core
//!
//! ## Overview
//!
//! Every coordinator in the system communicates exclusively through the
//! events defined here. The taxonomy is closed: each event belongs to
//! exactly one originating coordinator, and the full set is known at
//! compile time. There is no dynamic registration and no payload that is
//! not spelled out in this file.
//!
//! ```text
//! Modem callback ──► ModemEvent ──┐
//! GNSS callback ───► LocationEvent ─┤
//! Network inbound ─► CloudEvent ──┼──► Bus ──► every subscribed mailbox
//! Sampling timer ──► AppEvent ────┘
//! ```
//!
//! ## Value Semantics
//!
//! Events are plain values. The bus clones one copy into each subscriber
//! mailbox, so no coordinator can ever observe another coordinator's
//! mutation. Payloads are sized for that: the whole [`Event`] stays within
//! a single cache line (see the size test at the bottom of this file).
//!
//! ## Subscription Filtering
//!
//! Coordinators do not subscribe to individual event kinds but to whole
//! source categories ([`Source`]), mirroring the per-module event types the
//! wire taxonomy is partitioned into. [`SourceSet`] is the compact bitset
//! the bus filters deliveries with.

use crate::config::AppConfig;
use chrono::NaiveDateTime;

/// Uptime timestamp in milliseconds, as reported by the positioning layer.
pub type Timestamp = i64;

/// Originating coordinator of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Source {
    /// Application coordinator (mode, config, sampling timer).
    Application = 0,
    /// Modem coordinator (LTE attach).
    Modem = 1,
    /// Location coordinator (positioning).
    Location = 2,
    /// Cloud coordinator (server session, telemetry).
    Cloud = 3,
}

impl Source {
    /// Get human-readable name for log lines
    pub const fn name(&self) -> &'static str {
        match self {
            Source::Application => "app",
            Source::Modem => "modem",
            Source::Location => "location",
            Source::Cloud => "cloud",
        }
    }

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Bit flags selecting which event sources a mailbox receives
///
/// Declared once per coordinator when the bus is wired; never changed
/// afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSet(u8);

impl SourceSet {
    pub const APP: Self = Self(Source::Application.bit());
    pub const MODEM: Self = Self(Source::Modem.bit());
    pub const LOCATION: Self = Self(Source::Location.bit());
    pub const CLOUD: Self = Self(Source::Cloud.bit());

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all() -> Self {
        Self(0b1111)
    }

    /// Combine two sets (usable in const subscription tables)
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(&self, source: Source) -> bool {
        (self.0 & source.bit()) != 0
    }
}

/// Positioning method that produced a fix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FixMethod {
    /// Cell-tower multilateration.
    Cellular = 0,
    /// Satellite navigation.
    Gnss = 1,
    /// Wi-Fi access point lookup.
    Wifi = 2,
}

impl FixMethod {
    /// Get human-readable name
    pub const fn name(&self) -> &'static str {
        match self {
            FixMethod::Cellular => "cellular",
            FixMethod::Gnss => "gnss",
            FixMethod::Wifi => "wifi",
        }
    }
}

/// One completed position sample
///
/// Produced exactly once per finished location request; only a successful
/// fix carries one (timeouts and errors are separate event kinds).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationSample {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Altitude above the WGS-84 ellipsoid in meters.
    pub altitude: f32,
    /// Position accuracy (2D 1-sigma) in meters.
    pub accuracy: f32,
    /// Horizontal speed in m/s.
    pub speed: f32,
    /// Heading of movement in degrees.
    pub heading: f32,
    /// Method that resolved the fix.
    pub method: FixMethod,
    /// Number of satellites tracked during the search.
    pub satellites_tracked: u8,
    /// Time from search start until fix or timeout, in milliseconds.
    pub search_time_ms: u32,
    /// Uptime when the sample was taken.
    pub timestamp: Timestamp,
    /// UTC wall-clock time of the fix, when the receiver resolved one.
    pub datetime: Option<NaiveDateTime>,
}

/// Events originating from the application coordinator
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Boot announcement carrying the initial configuration.
    Start(AppConfig),
    /// The authoritative configuration changed; carries the whole merged
    /// configuration, never a delta.
    ConfigUpdate(AppConfig),
    /// Request one position sample.
    LocationGet,
}

/// Events originating from the modem coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModemEvent {
    /// LTE attach completed.
    LteConnected,
    /// LTE registration was lost.
    LteDisconnected,
}

/// Events originating from the location coordinator
#[derive(Debug, Clone, PartialEq)]
pub enum LocationEvent {
    /// A positioning search started.
    Active,
    /// The positioning search finished, whatever the outcome.
    Inactive,
    /// A fix was resolved.
    GnssDataReady(LocationSample),
    /// The search deadline expired without a fix.
    Timeout,
    /// The positioning service failed.
    Error,
}

/// Events originating from the cloud coordinator
#[derive(Debug, Clone, PartialEq)]
pub enum CloudEvent {
    /// Server session establishment started.
    ServerConnecting,
    /// Server session established.
    ServerConnected,
    /// Server session lost.
    ServerDisconnected,
    /// The user button was pressed.
    ButtonPressed,
    /// A telemetry payload was accepted by the transport.
    DataSent,
    /// A device configuration document arrived; carries the complete
    /// proposed configuration (absent wire fields inherit current values).
    ConfigReceived(AppConfig),
}

/// One message on the bus: a payload tagged by its originating coordinator
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Published by the application coordinator (and the sampling timer).
    App(AppEvent),
    /// Published by the modem coordinator and its driver adapter.
    Modem(ModemEvent),
    /// Published by the location coordinator and its outcome adapter.
    Location(LocationEvent),
    /// Published by the cloud coordinator and its callback adapters.
    Cloud(CloudEvent),
}

impl Event {
    /// Originating coordinator, used for subscription filtering
    pub const fn source(&self) -> Source {
        match self {
            Event::App(_) => Source::Application,
            Event::Modem(_) => Source::Modem,
            Event::Location(_) => Source::Location,
            Event::Cloud(_) => Source::Cloud,
        }
    }

    /// Short name for log lines
    pub const fn name(&self) -> &'static str {
        match self {
            Event::App(AppEvent::Start(_)) => "app.start",
            Event::App(AppEvent::ConfigUpdate(_)) => "app.config_update",
            Event::App(AppEvent::LocationGet) => "app.location_get",
            Event::Modem(ModemEvent::LteConnected) => "modem.lte_connected",
            Event::Modem(ModemEvent::LteDisconnected) => "modem.lte_disconnected",
            Event::Location(LocationEvent::Active) => "location.active",
            Event::Location(LocationEvent::Inactive) => "location.inactive",
            Event::Location(LocationEvent::GnssDataReady(_)) => "location.gnss_data_ready",
            Event::Location(LocationEvent::Timeout) => "location.timeout",
            Event::Location(LocationEvent::Error) => "location.error",
            Event::Cloud(CloudEvent::ServerConnecting) => "cloud.server_connecting",
            Event::Cloud(CloudEvent::ServerConnected) => "cloud.server_connected",
            Event::Cloud(CloudEvent::ServerDisconnected) => "cloud.server_disconnected",
            Event::Cloud(CloudEvent::ButtonPressed) => "cloud.button_pressed",
            Event::Cloud(CloudEvent::DataSent) => "cloud.data_sent",
            Event::Cloud(CloudEvent::ConfigReceived(_)) => "cloud.config_received",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_size() {
        // Events are copied into every subscriber mailbox; keep them within
        // one cache line.
        assert!(core::mem::size_of::<Event>() <= 128);
    }

    #[test]
    fn source_set_filtering() {
        let set = SourceSet::APP.with(SourceSet::CLOUD);

        assert!(set.contains(Source::Application));
        assert!(set.contains(Source::Cloud));
        assert!(!set.contains(Source::Modem));
        assert!(!set.contains(Source::Location));

        assert!(SourceSet::all().contains(Source::Location));
        assert!(!SourceSet::empty().contains(Source::Application));
    }

    #[test]
    fn event_source_tagging() {
        assert_eq!(Event::App(AppEvent::LocationGet).source(), Source::Application);
        assert_eq!(
            Event::Modem(ModemEvent::LteConnected).source(),
            Source::Modem
        );
        assert_eq!(Event::Location(LocationEvent::Active).source(), Source::Location);
        assert_eq!(
            Event::Cloud(CloudEvent::ButtonPressed).source(),
            Source::Cloud
        );
    }
}
