//! Reconnect backoff policy
//!
//! The n-th consecutive failure (counting from 0) waits
//! `min(max, initial * e^n)`. With 1 s / 60 s that is 1 s, 2.72 s, 7.39 s,
//! 20.1 s, 54.6 s, then 60 s from the sixth failure on.

use std::time::Duration;

/// Exponential backoff with a cap and an attempt counter
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    attempt: u32,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            attempt: 0,
        }
    }

    /// Delay for a given attempt count
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let secs = self.initial.as_secs_f64() * f64::from(attempt).exp();
        if !secs.is_finite() || secs >= self.max.as_secs_f64() {
            return self.max;
        }
        Duration::from_secs_f64(secs)
    }

    /// Delay to wait after the current failure; advances the counter
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.delay_for(self.attempt);
        self.attempt = self.attempt.saturating_add(1);
        delay
    }

    /// Called on every successful connection
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Consecutive failures since the last success
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn initial(&self) -> Duration {
        self.initial
    }

    pub fn max(&self) -> Duration {
        self.max
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(60))
    }
}
