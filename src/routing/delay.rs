//! Uniform random decision delay.

use std::time::Duration;
use rand::Rng;

use crate::config::PolicyConfig;

/// Inclusive window the decision delay is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayWindow {
    min_ms: u64,
    max_ms: u64,
}

impl DelayWindow {
    /// Bounds are reordered if given backwards.
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms: min_ms.max(max_ms),
        }
    }

    pub fn from_config(config: &PolicyConfig) -> Self {
        Self::new(config.delay_min_ms, config.delay_max_ms)
    }

    pub fn min(&self) -> Duration {
        Duration::from_millis(self.min_ms)
    }

    pub fn max(&self) -> Duration {
        Duration::from_millis(self.max_ms)
    }

    /// Draw a delay uniformly from the window.
    pub fn sample(&self) -> Duration {
        let ms = rand::thread_rng().gen_range(self.min_ms..=self.max_ms);
        Duration::from_millis(ms)
    }
}
