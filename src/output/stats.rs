//! Statistics of a crawl run
//!
//! This module counts what happened to each diary id and prints the
//! closing summary line.

use std::fmt;

/// Why a crawl stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The requested end id was processed
    ReachedEnd,
    /// The oldest diary (no predecessor) was processed
    ChainStart,
    /// The predecessor chain led back to an id already visited
    Cycle,
    /// The user interrupted the run
    Interrupted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReachedEnd => write!(f, "reached end id"),
            Self::ChainStart => write!(f, "reached first diary"),
            Self::Cycle => write!(f, "diary chain loops"),
            Self::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// Counters of a crawl run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Diaries fetched from the forum
    pub fetched: u64,

    /// Diaries recovered from a local page without a store record
    pub recovered: u64,

    /// Diaries skipped because both the page and the record were present
    pub skipped: u64,

    /// Retries consumed by the session during the run
    pub retries: u64,

    pub stop_reason: StopReason,
}

impl CrawlStatistics {
    pub fn new() -> Self {
        Self {
            fetched: 0,
            recovered: 0,
            skipped: 0,
            retries: 0,
            stop_reason: StopReason::ChainStart,
        }
    }

    /// Diaries visited, whatever their source
    pub fn visited(&self) -> u64 {
        self.fetched + self.recovered + self.skipped
    }

    /// The closing line printed after a run
    pub fn summary_line(&self) -> String {
        if self.skipped > 0 {
            format!("done. (skip {} diaries)", self.skipped)
        } else {
            "done.".to_string()
        }
    }
}

impl Default for CrawlStatistics {
    fn default() -> Self {
        Self::new()
    }
}

/// Logs the counters of a run
///
/// # Arguments
///
/// * `stats` - The statistics to report
pub fn log_statistics(stats: &CrawlStatistics) {
    tracing::info!(
        "Crawl finished ({}): {} fetched, {} recovered locally, {} skipped, {} retries",
        stats.stop_reason,
        stats.fetched,
        stats.recovered,
        stats.skipped,
        stats.retries
    );
}
