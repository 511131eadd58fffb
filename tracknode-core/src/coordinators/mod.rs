//! Coordinator State Machines
//!
//! One module per coordinator, each owning an independent hierarchical
//! state machine:
//!
//! | Coordinator | States | Concern |
//! |-------------|--------|---------|
//! | [`app`] | INIT → RUNNING (active/passive) | Master mode, sampling timer, authoritative config |
//! | [`modem`] | DISCONNECTED ⇄ CONNECTED | LTE attach and registration |
//! | [`location`] | INIT → RUNNING (idle/searching) | Positioning requests |
//! | [`cloud`] | LTE_INIT → LTE_DISCONNECTED → LTE_CONNECTED (server sub-state) | Server session, telemetry, config fetch |
//! | [`led`] | INIT → RUNNING ⇄ CLOUD_CONNECTING | Visual status mirror |
//!
//! Coordinators never call each other and never read each other's state:
//! every `handle` consumes one event from the coordinator's own mailbox
//! and may publish further events into the sink it is handed. State is
//! mutated only from within the owning coordinator, so no handler for the
//! same coordinator ever races another.
//!
//! Coordinators that depend on configuration keep a private snapshot of
//! it, refreshed solely by observing start/config-update events; snapshots
//! may lag the authoritative copy but converge through ordered delivery.

pub mod app;
pub mod cloud;
pub mod led;
pub mod location;
pub mod modem;

pub use app::AppCoordinator;
pub use cloud::CloudCoordinator;
pub use led::LedCoordinator;
pub use location::LocationCoordinator;
pub use modem::ModemCoordinator;
