//! # Link Health Monitor
//!
//! Watches the outcome of every decode attempt and decides when the serial
//! link needs a flush/reopen.
//!
//! ## Failure classes
//!
//! | Kind                         | Streak     |
//! |------------------------------|------------|
//! | Checksum mismatch            | +1         |
//! | Read timeout / I/O error     | +1         |
//! | Wrong station, invalid field, unknown tag | reset to 0 |
//! | Successful decode            | reset to 0 |
//!
//! A frame that passes the CRC but is semantically rejected proves the link
//! itself is delivering intact bytes, so it breaks the streak.
//!
//! ## Recovery
//!
//! When the streak reaches the threshold and the last recovery attempt is
//! older than the cooldown, the monitor requests [`RecoveryAction::FlushAndReopenLink`],
//! resets the streak and stamps the attempt time. Inside the cooldown the
//! streak keeps growing but no second recovery is issued.
//!
//! Recoveries that are not followed by any successful decode accumulate;
//! once they reach `persistent_after_recoveries` the link is reported as
//! [`LinkStatus::Down`] for the external watchdog. The monitor never touches
//! the link itself.

use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::iss::decoder::DecodeError;

/// Consecutive link-class failures that trigger a recovery
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 12;

/// Minimum time between recovery attempts
pub const DEFAULT_RECOVERY_COOLDOWN: Duration = Duration::from_secs(60);

/// Unanswered recoveries before the link is considered down
pub const DEFAULT_PERSISTENT_AFTER_RECOVERIES: u32 = 3;

/// Failure signal fed to the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Frame failed its CRC
    Checksum,

    /// Frame was intact but rejected (station, field range, tag)
    Rejected,

    /// No complete frame arrived within the read timeout
    Timeout,

    /// The byte source reported an I/O error
    Io,
}

impl FailureKind {
    /// True if this failure points at the physical link
    pub fn is_link_failure(self) -> bool {
        match self {
            FailureKind::Checksum | FailureKind::Timeout | FailureKind::Io => true,
            FailureKind::Rejected => false,
        }
    }
}

impl From<&DecodeError> for FailureKind {
    fn from(error: &DecodeError) -> Self {
        match error {
            DecodeError::ChecksumMismatch { .. } => FailureKind::Checksum,
            DecodeError::WrongStation { .. }
            | DecodeError::InvalidField { .. }
            | DecodeError::UnknownTag { .. } => FailureKind::Rejected,
        }
    }
}

/// Action the caller must perform on the link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Discard buffered input and reopen the serial port
    FlushAndReopenLink,
}

/// Coarse link condition for status reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// No failures since the last success
    Healthy,

    /// Failing, but recovery has not been exhausted
    Degraded,

    /// Repeated recoveries have not restored a single good frame
    Down,
}

/// Monitor thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkHealthConfig {
    pub failure_threshold: u32,
    pub recovery_cooldown: Duration,
    pub persistent_after_recoveries: u32,
}

impl Default for LinkHealthConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            recovery_cooldown: DEFAULT_RECOVERY_COOLDOWN,
            persistent_after_recoveries: DEFAULT_PERSISTENT_AFTER_RECOVERIES,
        }
    }
}

/// Link health counters owned by the monitor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkHealth {
    /// Link-class failures since the last success or recovery
    pub consecutive_failures: u32,

    /// When the last recovery was requested
    pub last_recovery_attempt: Option<Instant>,

    /// Recoveries requested since the last successful decode
    pub recoveries_without_success: u32,

    /// Total recoveries requested since startup
    pub total_recoveries: u64,
}

/// Decides when the link should be flushed and reopened
#[derive(Debug, Clone)]
pub struct LinkHealthMonitor {
    config: LinkHealthConfig,
    health: LinkHealth,
}

impl Default for LinkHealthMonitor {
    fn default() -> Self {
        Self::new(LinkHealthConfig::default())
    }
}

impl LinkHealthMonitor {
    #[must_use]
    pub fn new(config: LinkHealthConfig) -> Self {
        Self {
            config,
            health: LinkHealth::default(),
        }
    }

    pub fn config(&self) -> &LinkHealthConfig {
        &self.config
    }

    pub fn health(&self) -> &LinkHealth {
        &self.health
    }

    /// A frame decoded successfully
    pub fn record_success(&mut self) {
        if self.health.recoveries_without_success > 0 {
            info!(
                "Link recovered after {} recovery attempt(s)",
                self.health.recoveries_without_success
            );
        }
        self.health.consecutive_failures = 0;
        self.health.recoveries_without_success = 0;
    }

    /// A decode attempt or read failed
    ///
    /// # Returns
    ///
    /// * `Option<RecoveryAction>` - Set when the caller should flush and reopen the link
    pub fn record_failure(&mut self, kind: FailureKind) -> Option<RecoveryAction> {
        self.record_failure_at(kind, Instant::now())
    }

    /// Same as [`Self::record_failure`] with an explicit clock reading
    pub fn record_failure_at(&mut self, kind: FailureKind, now: Instant) -> Option<RecoveryAction> {
        if !kind.is_link_failure() {
            self.health.consecutive_failures = 0;
            return None;
        }

        self.health.consecutive_failures = self.health.consecutive_failures.saturating_add(1);
        if self.health.consecutive_failures < self.config.failure_threshold {
            return None;
        }

        let cooled_down = match self.health.last_recovery_attempt {
            None => true,
            Some(last) => now.saturating_duration_since(last) > self.config.recovery_cooldown,
        };
        if !cooled_down {
            return None;
        }

        self.health.consecutive_failures = 0;
        self.health.last_recovery_attempt = Some(now);
        self.health.recoveries_without_success += 1;
        self.health.total_recoveries += 1;

        warn!(
            "{} consecutive link failures (last: {:?}), requesting flush and reopen (attempt {})",
            self.config.failure_threshold, kind, self.health.recoveries_without_success
        );
        if self.status() == LinkStatus::Down {
            warn!(
                "Link still failing after {} recovery attempts",
                self.health.recoveries_without_success
            );
        }

        Some(RecoveryAction::FlushAndReopenLink)
    }

    pub fn status(&self) -> LinkStatus {
        if self.health.recoveries_without_success >= self.config.persistent_after_recoveries {
            LinkStatus::Down
        } else if self.health.consecutive_failures > 0 || self.health.recoveries_without_success > 0 {
            LinkStatus::Degraded
        } else {
            LinkStatus::Healthy
        }
    }

    /// True when the failure should be surfaced to the external watchdog
    pub fn is_persistent_failure(&self) -> bool {
        self.status() == LinkStatus::Down
    }
}
