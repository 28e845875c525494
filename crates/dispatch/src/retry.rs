//! Quiet-period retry model.
//!
//! Tracks consecutive connectivity failures and suppresses network attempts
//! for a cooldown that grows with the failure streak, so a downed or
//! misconfigured endpoint stops a whole pass cheaply instead of every queued
//! item rediscovering the same failure.
//!
//! The state is process-wide in spirit but modelled as an owned value: the
//! host threads one instance (behind `Arc<Mutex<_>>`) into the dispatcher,
//! and tests construct independent instances. Not persisted across restarts;
//! a restart simply re-probes immediately.

use std::time::{Duration, Instant};

/// Default cooldown after the first failure.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(60);
/// Default cooldown cap.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(3600);

/// Consecutive-failure streak with a capped exponential quiet period.
#[derive(Debug, Clone)]
pub struct RetryModel {
    consecutive_failures: u32,
    last_failure: Option<Instant>,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryModel {
    pub fn new() -> Self {
        Self::with_policy(DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY)
    }

    pub fn with_policy(base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            consecutive_failures: 0,
            last_failure: None,
            base_delay,
            max_delay,
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Record a connectivity/authorization failure, extending the quiet
    /// period.
    pub fn failure(&mut self) {
        self.failure_at(Instant::now());
    }

    /// Reset the failure streak after a call that proved connectivity is
    /// good.
    pub fn success(&mut self) {
        self.consecutive_failures = 0;
        self.last_failure = None;
    }

    /// Whether network attempts are currently suppressed.
    pub fn is_quiet_period(&self) -> bool {
        self.is_quiet_period_at(Instant::now())
    }

    /// Cooldown imposed by the current failure streak:
    /// `base * 2^(failures - 1)`, capped.
    pub fn quiet_duration(&self) -> Duration {
        if self.consecutive_failures == 0 {
            return Duration::ZERO;
        }
        let exp = self.consecutive_failures.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exp)
            .min(self.max_delay)
    }

    pub(crate) fn failure_at(&mut self, now: Instant) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_failure = Some(now);
    }

    pub(crate) fn is_quiet_period_at(&self, now: Instant) -> bool {
        match self.last_failure {
            Some(at) => now.saturating_duration_since(at) < self.quiet_duration(),
            None => false,
        }
    }
}

impl Default for RetryModel {
    fn default() -> Self {
        Self::new()
    }
}
