//! Crawler module for walking a diary chain
//!
//! This module contains the core crawling logic, including:
//! - The page fetching capability the crawl runs against
//! - Stylesheet, image and script downloads
//! - Overall crawl coordination

mod assets;
mod coordinator;
mod fetcher;

pub use assets::{download_images, download_scripts, dump_stylesheet};
pub use coordinator::{find_start_id, Coordinator, CrawlRange};
pub use fetcher::PageFetcher;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Stop request shared between a signal listener and the crawl loop
///
/// The crawl checks it between diary ids only, so an interrupted run
/// always ends on a fully processed diary.
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    flag: Arc<AtomicBool>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the crawl to stop
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
