//! Error Types at the Collaborator Boundary
//!
//! Every external operation the coordinators invoke (modem attach,
//! positioning request, transport I/O, payload decoding) reports failure
//! through one of the enums below. They follow the same rules throughout:
//!
//! 1. **Small and Copy**: errors cross state-machine boundaries in hot
//!    paths; no variant carries more than a `&'static str` reason.
//! 2. **No heap**: deterministic memory usage, usable without `std`.
//! 3. **Never fatal**: all of these are logged and absorbed by the owning
//!    coordinator (transient failure, see the per-coordinator handling);
//!    none of them tears the system down.

use thiserror_no_std::Error;

/// LTE modem attach/registration failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModemError {
    /// The network rejected the attach request.
    #[error("attach rejected by network")]
    AttachRejected,

    /// The modem did not answer within its internal deadline.
    #[error("modem not responding")]
    NotResponding,

    /// Lower-level radio failure.
    #[error("radio failure: {reason}")]
    Radio {
        /// Driver-supplied description.
        reason: &'static str,
    },
}

/// Positioning service failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationError {
    /// The positioning service could not be initialized.
    #[error("positioning init failed: {reason}")]
    InitFailed {
        /// Driver-supplied description.
        reason: &'static str,
    },

    /// A search request was not accepted.
    #[error("positioning request failed: {reason}")]
    RequestFailed {
        /// Driver-supplied description.
        reason: &'static str,
    },
}

/// Server transport failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The transport session could not be established.
    #[error("server connect failed: {reason}")]
    ConnectFailed {
        /// Transport-supplied description.
        reason: &'static str,
    },

    /// An outbound payload could not be sent.
    #[error("send failed: {reason}")]
    SendFailed {
        /// Transport-supplied description.
        reason: &'static str,
    },

    /// No response arrived within the transport's deadline.
    #[error("no response from server")]
    ReceiveTimeout,

    /// Operation attempted without an established session.
    #[error("not connected")]
    NotConnected,
}

/// Cloud payload codec failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// An inbound document could not be parsed. Treated as "no config
    /// update", never as a system fault.
    #[error("malformed device config payload")]
    Malformed,

    /// A telemetry sample could not be serialized.
    #[error("telemetry payload could not be encoded")]
    Encode,
}

#[cfg(feature = "defmt")]
impl defmt::Format for ModemError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::AttachRejected => defmt::write!(fmt, "attach rejected"),
            Self::NotResponding => defmt::write!(fmt, "modem not responding"),
            Self::Radio { reason } => defmt::write!(fmt, "radio failure: {}", reason),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for LocationError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::InitFailed { reason } => defmt::write!(fmt, "positioning init: {}", reason),
            Self::RequestFailed { reason } => defmt::write!(fmt, "positioning request: {}", reason),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TransportError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::ConnectFailed { reason } => defmt::write!(fmt, "connect: {}", reason),
            Self::SendFailed { reason } => defmt::write!(fmt, "send: {}", reason),
            Self::ReceiveTimeout => defmt::write!(fmt, "no response"),
            Self::NotConnected => defmt::write!(fmt, "not connected"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for CodecError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Malformed => defmt::write!(fmt, "malformed config payload"),
            Self::Encode => defmt::write!(fmt, "telemetry encode failed"),
        }
    }
}
