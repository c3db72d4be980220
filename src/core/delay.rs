// src/core/delay.rs

//! The randomized latency that stands in for downstream work.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// A uniform delay distribution over `[min, max)` milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatedDelay {
    min_ms: u64,
    max_ms: u64,
}

impl SimulatedDelay {
    /// Creates a distribution. An empty range collapses to a fixed `min_ms` delay.
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms,
            max_ms: max_ms.max(min_ms),
        }
    }

    /// Draws one delay.
    pub fn sample(&self) -> Duration {
        if self.max_ms <= self.min_ms {
            return Duration::from_millis(self.min_ms);
        }
        let mut rng = SmallRng::from_entropy();
        Duration::from_millis(rng.gen_range(self.min_ms..self.max_ms))
    }

    pub fn min(&self) -> Duration {
        Duration::from_millis(self.min_ms)
    }

    pub fn max(&self) -> Duration {
        Duration::from_millis(self.max_ms)
    }
}
