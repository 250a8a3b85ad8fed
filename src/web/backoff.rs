use crate::config::RetryConfig;
use std::time::Duration;

/// Linearly increasing delay between fetch attempts
///
/// The first attempt is never delayed. Retry `k` (1-based) waits
/// `base + (k - 1) * increment`.
#[derive(Debug, Clone, Copy)]
pub struct LinearBackoff {
    base: Duration,
    increment: Duration,
}

impl LinearBackoff {
    pub const fn new(base: Duration, increment: Duration) -> Self {
        Self { base, increment }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            Duration::from_secs(config.base_interval),
            Duration::from_secs(config.increment),
        )
    }

    /// Delay before the given attempt (0 is the initial attempt)
    pub fn delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        self.base + self.increment * (attempt - 1)
    }
}
