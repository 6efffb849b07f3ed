//! Retry backoff policy consumed by the sync engine.

use std::time::Duration;

use crate::types::AttemptCount;

/// Exponential backoff schedule with a delay cap and an attempt ceiling.
///
/// The delay doubles per completed attempt until it reaches
/// `max_delay_ms`; once `max_attempts` deliveries have been made without a
/// resolution the mutation is marked failed instead of rescheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay after the first attempt, in milliseconds.
    pub base_delay_ms: u64,
    /// Upper bound for any single delay, in milliseconds.
    pub max_delay_ms: u64,
    /// Attempt count at which a mutation becomes failed.
    pub max_attempts: AttemptCount,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_delay_ms: 1_000,
            max_delay_ms: 60_000,
            max_attempts: 5,
        }
    }
}

impl BackoffPolicy {
    /// Delay to wait after `attempts` completed deliveries.
    pub fn delay_for(&self, attempts: AttemptCount) -> Duration {
        // Shift is clamped so the multiplier cannot overflow.
        let exp = attempts.saturating_sub(1).min(20);
        let raw = self.base_delay_ms.saturating_mul(1u64 << exp);
        Duration::from_millis(raw.min(self.max_delay_ms))
    }

    /// True once `attempts` has reached the ceiling.
    pub fn exhausted(&self, attempts: AttemptCount) -> bool {
        attempts >= self.max_attempts
    }
}
