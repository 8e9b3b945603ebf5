use crate::faults::{sample_range, RandomSource};
use serde::Deserialize;
use std::time::Duration;

/// Retry budget and backoff schedule for the sender.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retry attempts allowed after the initial send.
    pub max_retries: u32,
    pub base_backoff_seconds: f64,
    pub max_backoff_seconds: f64,
    /// Uniform jitter applied as `delay * (1 ± jitter_range)`.
    pub jitter_range: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_backoff_seconds: 1.0,
            max_backoff_seconds: 30.0,
            jitter_range: 0.5,
        }
    }
}

impl RetryPolicy {
    /// Exponential delay before jitter for retry `attempt` (0-based after the
    /// first failure): `min(max_backoff, base * 2^attempt)`.
    pub fn unjittered_delay(&self, attempt: u32) -> Duration {
        let factor = 2f64.powi(attempt.min(62) as i32);
        let seconds = (self.base_backoff_seconds * factor).min(self.max_backoff_seconds);
        Duration::from_secs_f64(seconds.max(0.0))
    }

    /// Full backoff delay for retry `attempt`, jittered so simultaneous
    /// retriers desynchronize, clamped non-negative.
    pub fn backoff_delay(&self, attempt: u32, rng: &mut dyn RandomSource) -> Duration {
        let base = self.unjittered_delay(attempt).as_secs_f64();
        let jitter = base * sample_range(rng, -self.jitter_range, self.jitter_range);
        Duration::from_secs_f64((base + jitter).max(0.0))
    }
}
