//! Device Configuration and Validated Merging
//!
//! Exactly one authoritative [`AppConfig`] exists, owned by the application
//! coordinator. Every other coordinator holds a private snapshot refreshed
//! only by observing start/config-update events, so configuration flows in
//! one direction and no lock is ever needed.
//!
//! Remote configuration proposals are merged field by field: a field that
//! fails validation is rejected and logged while the remaining valid fields
//! still apply. The authoritative copy therefore never holds an invalid
//! value, but a partially bad proposal is not thrown away wholesale.

use core::time::Duration;

/// Sampling-mode policy. Active mode samples on a short fixed interval,
/// passive mode on a long one.
pub const DEFAULT_ACTIVE_MODE: bool = true;
/// Deadline for a single positioning search, seconds.
pub const DEFAULT_LOCATION_TIMEOUT_S: i32 = 30;
/// Interval between samples in active mode, seconds.
pub const DEFAULT_ACTIVE_WAIT_S: i32 = 120;
/// Interval between samples in passive mode, seconds.
pub const DEFAULT_PASSIVE_WAIT_S: i32 = 3600;

/// Device configuration
///
/// All timeout fields are strictly positive in the authoritative copy;
/// [`AppConfig::merge_validated`] enforces that on every update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppConfig {
    /// Device identity used in telemetry uploads.
    pub device_id: i32,
    /// Active (frequent sampling) vs passive (infrequent sampling) mode.
    pub active_mode: bool,
    /// Positioning search deadline, seconds.
    pub location_timeout_s: i32,
    /// Sampling interval while in active mode, seconds.
    pub active_wait_timeout_s: i32,
    /// Sampling interval while in passive mode, seconds.
    pub passive_wait_timeout_s: i32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            device_id: 0,
            active_mode: DEFAULT_ACTIVE_MODE,
            location_timeout_s: DEFAULT_LOCATION_TIMEOUT_S,
            active_wait_timeout_s: DEFAULT_ACTIVE_WAIT_S,
            passive_wait_timeout_s: DEFAULT_PASSIVE_WAIT_S,
        }
    }
}

/// Bit flags naming the fields a merge rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RejectedFields(u8);

impl RejectedFields {
    pub const LOCATION_TIMEOUT: Self = Self(1 << 0);
    pub const ACTIVE_WAIT: Self = Self(1 << 1);
    pub const PASSIVE_WAIT: Self = Self(1 << 2);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn set(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

/// Result of merging a proposed configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOutcome {
    /// At least one field of the authoritative copy changed.
    pub changed: bool,
    /// Fields that failed validation and were left untouched.
    pub rejected: RejectedFields,
}

impl AppConfig {
    /// Merge a proposed configuration into the authoritative copy.
    ///
    /// Each field is validated and applied independently: timeouts must be
    /// strictly positive, and a field that fails the check is rejected
    /// (logged, reported in the outcome) without affecting the others.
    pub fn merge_validated(&mut self, proposed: &AppConfig) -> MergeOutcome {
        let mut changed = false;
        let mut rejected = RejectedFields::empty();

        if proposed.device_id != self.device_id {
            self.device_id = proposed.device_id;
            changed = true;
        }

        if proposed.active_mode != self.active_mode {
            self.active_mode = proposed.active_mode;
            changed = true;
        }

        changed |= merge_timeout(
            &mut self.location_timeout_s,
            proposed.location_timeout_s,
            "location_timeout",
            RejectedFields::LOCATION_TIMEOUT,
            &mut rejected,
        );
        changed |= merge_timeout(
            &mut self.active_wait_timeout_s,
            proposed.active_wait_timeout_s,
            "active_wait_timeout",
            RejectedFields::ACTIVE_WAIT,
            &mut rejected,
        );
        changed |= merge_timeout(
            &mut self.passive_wait_timeout_s,
            proposed.passive_wait_timeout_s,
            "passive_wait_timeout",
            RejectedFields::PASSIVE_WAIT,
            &mut rejected,
        );

        MergeOutcome { changed, rejected }
    }

    /// Sampling interval for the currently configured mode
    pub fn sample_interval(&self) -> Duration {
        let secs = if self.active_mode {
            self.active_wait_timeout_s
        } else {
            self.passive_wait_timeout_s
        };
        Duration::from_secs(secs as u64)
    }

    /// Deadline for one positioning search
    pub fn location_timeout(&self) -> Duration {
        Duration::from_secs(self.location_timeout_s as u64)
    }
}

fn merge_timeout(
    current: &mut i32,
    proposed: i32,
    name: &str,
    flag: RejectedFields,
    rejected: &mut RejectedFields,
) -> bool {
    if proposed <= 0 {
        log::warn!("rejecting {name} = {proposed}, must be > 0");
        rejected.set(flag);
        return false;
    }
    if proposed != *current {
        *current = proposed;
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.location_timeout_s > 0);
        assert!(cfg.active_wait_timeout_s > 0);
        assert!(cfg.passive_wait_timeout_s > 0);
        assert_eq!(cfg.sample_interval(), Duration::from_secs(120));
    }

    #[test]
    fn merge_applies_changed_fields() {
        let mut cfg = AppConfig::default();
        let proposed = AppConfig {
            device_id: 7,
            active_mode: false,
            ..cfg
        };

        let outcome = cfg.merge_validated(&proposed);

        assert!(outcome.changed);
        assert!(outcome.rejected.is_empty());
        assert_eq!(cfg.device_id, 7);
        assert!(!cfg.active_mode);
        assert_eq!(cfg.sample_interval(), Duration::from_secs(3600));
    }

    #[test]
    fn merge_identical_config_is_noop() {
        let mut cfg = AppConfig::default();
        let outcome = cfg.merge_validated(&cfg.clone());
        assert!(!outcome.changed);
        assert!(outcome.rejected.is_empty());
    }

    #[test]
    fn invalid_timeout_rejected_per_field() {
        let mut cfg = AppConfig::default();
        let proposed = AppConfig {
            active_mode: false,
            active_wait_timeout_s: 0,
            ..cfg
        };

        let outcome = cfg.merge_validated(&proposed);

        // The bad timeout is held back, the mode change still lands.
        assert!(outcome.changed);
        assert!(outcome.rejected.contains(RejectedFields::ACTIVE_WAIT));
        assert_eq!(cfg.active_wait_timeout_s, DEFAULT_ACTIVE_WAIT_S);
        assert!(!cfg.active_mode);
    }

    #[test]
    fn negative_timeouts_rejected() {
        let mut cfg = AppConfig::default();
        let proposed = AppConfig {
            location_timeout_s: -5,
            passive_wait_timeout_s: -1,
            ..cfg
        };

        let outcome = cfg.merge_validated(&proposed);

        assert!(!outcome.changed);
        assert!(outcome.rejected.contains(RejectedFields::LOCATION_TIMEOUT));
        assert!(outcome.rejected.contains(RejectedFields::PASSIVE_WAIT));
        assert_eq!(cfg, AppConfig::default());
    }

    proptest! {
        /// No sequence of proposals can ever plant a non-positive timeout
        /// in the authoritative copy.
        #[test]
        fn timeouts_stay_positive(
            proposals in prop::collection::vec(arb_config(), 0..16)
        ) {
            let mut cfg = AppConfig::default();
            for proposed in &proposals {
                let _ = cfg.merge_validated(proposed);
                prop_assert!(cfg.location_timeout_s > 0);
                prop_assert!(cfg.active_wait_timeout_s > 0);
                prop_assert!(cfg.passive_wait_timeout_s > 0);
            }
        }

        /// The mode always equals the most recently proposed mode, since
        /// the mode field has no validity constraint.
        #[test]
        fn mode_follows_last_proposal(
            proposals in prop::collection::vec(arb_config(), 1..16)
        ) {
            let mut cfg = AppConfig::default();
            for proposed in &proposals {
                let _ = cfg.merge_validated(proposed);
            }
            prop_assert_eq!(cfg.active_mode, proposals.last().unwrap().active_mode);
        }
    }

    fn arb_config() -> impl Strategy<Value = AppConfig> {
        (
            any::<i32>(),
            any::<bool>(),
            -10..600i32,
            -10..600i32,
            -10..600i32,
        )
            .prop_map(|(id, active, loc, aw, pw)| AppConfig {
                device_id: id,
                active_mode: active,
                location_timeout_s: loc,
                active_wait_timeout_s: aw,
                passive_wait_timeout_s: pw,
            })
    }
}
