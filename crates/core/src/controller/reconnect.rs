use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};

use crate::ReconnectPolicy;

/// Bounded exponential delays between reconnection attempts.
pub struct Reconnector {
    backoff: ExponentialBackoff,
    attempts: u32,
    max_attempts: u32,
}

impl Reconnector {
    pub fn new(policy: &ReconnectPolicy) -> Self {
        let backoff = ExponentialBackoffBuilder::new()
            .with_initial_interval(policy.initial_interval)
            .with_max_interval(policy.max_interval)
            .with_multiplier(policy.multiplier)
            .with_randomization_factor(policy.randomization_factor)
            .with_max_elapsed_time(None)
            .build();
        Self {
            backoff,
            attempts: 0,
            max_attempts: policy.max_attempts,
        }
    }

    /// Returns the delay before the next attempt, or `None` once the
    /// attempts are used up.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts >= self.max_attempts {
            return None;
        }
        let delay = self.backoff.next_backoff()?;
        self.attempts += 1;
        Some(delay)
    }

    /// Returns how many attempts have been scheduled since the last
    /// reset.
    #[inline]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Starts over after a successful connection.
    pub fn reset(&mut self) {
        self.attempts = 0;
        self.backoff.reset();
    }
}
