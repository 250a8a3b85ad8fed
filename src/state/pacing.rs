//! Adaptive pacing of remote fetches
//!
//! The delay between two diary fetches starts long and drops to the short
//! interval once enough consecutive fetches went through without a retry.
//! A single retry brings the long interval back.

use crate::config::PacingConfig;
use std::time::Duration;

/// Tracks retry pressure and decides the delay before each remote fetch
#[derive(Debug, Clone)]
pub struct Pacer {
    short: Duration,
    long: Duration,
    threshold: u32,

    /// Current delay between fetches
    interval: Duration,

    /// Consecutive fetches that consumed no retry
    streak: u32,

    fetched_once: bool,
}

impl Pacer {
    /// Creates a pacer
    ///
    /// # Arguments
    ///
    /// * `short` - Delay once the forum answers reliably
    /// * `long` - Delay at start and after any retry
    /// * `threshold` - Clean fetches needed before switching to `short`
    pub fn new(short: Duration, long: Duration, threshold: u32) -> Self {
        Self {
            short,
            long,
            threshold,
            interval: long,
            streak: 0,
            fetched_once: false,
        }
    }

    pub fn from_config(config: &PacingConfig) -> Self {
        Self::new(
            Duration::from_secs(config.short_interval),
            Duration::from_secs(config.long_interval),
            config.change_threshold,
        )
    }

    /// Delay to wait before the next remote fetch
    ///
    /// The first fetch of a run is not delayed.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.fetched_once {
            Some(self.interval)
        } else {
            self.fetched_once = true;
            None
        }
    }

    /// Records a completed remote fetch
    ///
    /// # Arguments
    ///
    /// * `retries` - Retries the fetch consumed
    ///
    /// # Returns
    ///
    /// The previous and the new interval when the interval changed
    pub fn record_fetch(&mut self, retries: u64) -> Option<(Duration, Duration)> {
        if retries == 0 {
            self.streak = self.streak.saturating_add(1);
        } else {
            self.streak = 0;
        }

        let target = if self.streak > self.threshold {
            self.short
        } else {
            self.long
        };

        if target == self.interval {
            return None;
        }
        let previous = std::mem::replace(&mut self.interval, target);
        Some((previous, target))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }
}
