//! Reconnection backoff policy.
//!
//! Pure function of attempt count to delay, capped at a maximum. The attempt
//! counter increments on every abnormal close and resets on every successful
//! open; it is never persisted.

use std::time::Duration;

/// Default base delay for the first reconnect attempt.
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 1000;
/// Default cap on the reconnect delay.
pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;

/// Bounded exponential backoff: `min(initial * 2^attempt, max)`.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    initial: Duration,
    max: Duration,
    attempt: u32,
}

impl ReconnectPolicy {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            attempt: 0,
        }
    }

    /// Delay for the current attempt; increments the attempt counter.
    pub fn next_delay(&mut self) -> Duration {
        let exponent = self.attempt.min(63);
        let millis = (self.initial.as_millis() as u64)
            .saturating_mul(1u64.checked_shl(exponent).unwrap_or(u64::MAX));
        let delay = Duration::from_millis(millis).min(self.max);
        self.attempt = self.attempt.saturating_add(1);
        delay
    }

    /// Reset the attempt counter after a successful open.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Number of abnormal closes since the last successful open.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            Duration::from_millis(DEFAULT_MAX_DELAY_MS),
        )
    }
}
