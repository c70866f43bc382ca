//! # Reconnect Policy
//!
//! Exponential backoff with jitter for reopening a room's live channel after
//! it drops.
//!
//! ## Features
//!
//! - **Exponential Backoff**: the delay doubles per attempt
//! - **Jitter**: a random extra delay so clients don't reconnect in lockstep
//! - **Max Backoff**: the computed delay is capped
//! - **Bounded Retries**: after `max_attempts` the room stays degraded
//!
//! The policy only computes delays. The room driver owns the attempt counter
//! and attaches each reopened channel to the existing view, so reconnecting
//! never touches the timeline.

use std::time::Duration;

use crate::shared::config::ReconnectSettings;

/// Backoff schedule for reopening a dropped channel
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    /// Attempts before giving up; 0 disables reconnect
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Jitter factor (0.0 to 1.0)
    pub jitter: f64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::from(&ReconnectSettings::default())
    }
}

impl From<&ReconnectSettings> for ReconnectPolicy {
    fn from(settings: &ReconnectSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts,
            base_delay: Duration::from_millis(settings.base_delay_ms),
            max_delay: Duration::from_millis(settings.max_delay_ms),
            jitter: settings.jitter.clamp(0.0, 1.0),
        }
    }
}

impl ReconnectPolicy {
    /// Never reconnect: a dropped channel leaves the room degraded
    pub fn disabled() -> Self {
        Self {
            max_attempts: 0,
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.max_attempts > 0
    }

    /// Delay before 0-based `attempt`, or `None` once attempts are exhausted
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        Some(self.delay_with_sample(attempt, rand::random::<f64>()))
    }

    /// Delay for `attempt` with a caller-supplied jitter sample in `[0, 1)`
    pub fn delay_with_sample(&self, attempt: u32, sample: f64) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(31));
        let delay = self.base_delay.saturating_mul(factor).min(self.max_delay);
        let extra = delay.mul_f64(self.jitter * sample.clamp(0.0, 1.0));
        delay + extra
    }
}
