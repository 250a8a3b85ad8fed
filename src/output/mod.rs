//! Output module for the dump directory
//!
//! This module handles:
//! - The directory layout of a dump
//! - Writing the index page
//! - Recording and reporting crawl statistics

mod index;
mod layout;
pub mod stats;

pub use index::{render_index, write_index};
pub use layout::OutputLayout;
pub use stats::{log_statistics, CrawlStatistics, StopReason};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while writing output files
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
