//! Cloud Payload Codec
//!
//! JSON shaping for the two documents the cloud coordinator exchanges with
//! the server:
//!
//! - **Telemetry** (outbound): one document per position sample, carrying
//!   the full PVT set plus the device identity and a human-readable UTC
//!   time string.
//! - **Device configuration** (inbound): a partial document. Every field
//!   is optional; absent fields inherit the device's current value, and
//!   unknown fields are ignored. A document that does not parse is
//!   reported as [`CodecError::Malformed`] and treated upstream as "no
//!   config update".
//!
//! Transport framing (packet headers, resource paths, tokens) is not this
//! module's business - it sees and produces raw document bytes only.

#[cfg(not(feature = "std"))]
use alloc::{
    string::{String, ToString},
    vec::Vec,
};
#[cfg(feature = "std")]
use std::{string::String, vec::Vec};

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::errors::CodecError;
use crate::events::LocationSample;

/// Wall-clock format used in telemetry documents.
const TELEMETRY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Serialize)]
struct TelemetryPayload {
    device_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    time: Option<String>,
    latitude: f64,
    longitude: f64,
    altitude: f32,
    accuracy: f32,
    speed: f32,
    heading: f32,
    method: &'static str,
    satellites_tracked: u8,
    search_time_ms: u32,
    timestamp: i64,
}

/// Encode one position sample as a telemetry document
pub fn encode_telemetry(device_id: i32, sample: &LocationSample) -> Result<Vec<u8>, CodecError> {
    let payload = TelemetryPayload {
        device_id,
        time: sample
            .datetime
            .map(|dt| dt.format(TELEMETRY_TIME_FORMAT).to_string()),
        latitude: sample.latitude,
        longitude: sample.longitude,
        altitude: sample.altitude,
        accuracy: sample.accuracy,
        speed: sample.speed,
        heading: sample.heading,
        method: sample.method.name(),
        satellites_tracked: sample.satellites_tracked,
        search_time_ms: sample.search_time_ms,
        timestamp: sample.timestamp,
    };

    serde_json::to_vec(&payload).map_err(|_| CodecError::Encode)
}

/// A partial device configuration as received from the server
///
/// Field names follow the wire document; absent fields stay `None` and
/// inherit the device's current values on [`ConfigProposal::apply_to`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ConfigProposal {
    /// Device identity.
    pub device_id: Option<i32>,
    /// Sampling mode request.
    pub active_mode: Option<bool>,
    /// Positioning search deadline, seconds.
    pub location_timeout: Option<i32>,
    /// Active-mode sampling interval, seconds.
    pub active_wait_timeout: Option<i32>,
    /// Passive-mode sampling interval, seconds.
    pub passive_wait_timeout: Option<i32>,
}

impl ConfigProposal {
    /// Overlay this proposal on the given configuration, producing the
    /// complete proposed configuration. No validation happens here; the
    /// application coordinator validates on merge.
    pub fn apply_to(&self, current: &AppConfig) -> AppConfig {
        AppConfig {
            device_id: self.device_id.unwrap_or(current.device_id),
            active_mode: self.active_mode.unwrap_or(current.active_mode),
            location_timeout_s: self.location_timeout.unwrap_or(current.location_timeout_s),
            active_wait_timeout_s: self
                .active_wait_timeout
                .unwrap_or(current.active_wait_timeout_s),
            passive_wait_timeout_s: self
                .passive_wait_timeout
                .unwrap_or(current.passive_wait_timeout_s),
        }
    }
}

/// Decode a raw device-configuration document
pub fn decode_device_config(raw: &[u8]) -> Result<ConfigProposal, CodecError> {
    serde_json::from_slice(raw).map_err(|_| CodecError::Malformed)
}
