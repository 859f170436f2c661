//! Delay schedule for repeated poll failures.

use std::time::Duration;

use rand::Rng;

/// Tracks consecutive failures and hands out the delay before the next try.
///
/// The delay doubles from `base` per failure up to `max`, plus up to a tenth
/// of itself as jitter.
#[derive(Debug, Clone)]
pub struct PollBackoff {
    base: Duration,
    max: Duration,
    failures: u32,
}

impl PollBackoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            failures: 0,
        }
    }

    /// Consecutive failures since the last success.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Record a failure and return how long to wait.
    pub fn fail(&mut self) -> Duration {
        self.failures = self.failures.saturating_add(1);
        let delay = self.ceiling();
        let spread = delay.as_millis() as u64 / 10;
        if spread == 0 {
            return delay;
        }
        delay + Duration::from_millis(rand::thread_rng().gen_range(0..spread))
    }

    pub fn reset(&mut self) {
        self.failures = 0;
    }

    /// Delay for the current failure count, before jitter.
    fn ceiling(&self) -> Duration {
        let shift = self.failures.saturating_sub(1).min(31);
        self.base.saturating_mul(1u32 << shift).min(self.max)
    }
}
