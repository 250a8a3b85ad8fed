//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that walks the diary chain backward,
//! including:
//! - Choosing, per diary id, between the store, the local page and the forum
//! - Pacing remote fetches according to retry pressure
//! - Handling interrupts between diary ids
//! - Flushing the entry store on every way out

use crate::crawler::assets::{download_images, download_scripts};
use crate::crawler::{Interrupt, PageFetcher};
use crate::diary::{find_latest_entry_id, parse_entry, EntryRecord};
use crate::output::{CrawlStatistics, OutputLayout, StopReason};
use crate::rewrite::{asset_references, LinkRewriter};
use crate::state::{Pacer, VisitState};
use crate::storage::EntryStore;
use crate::TsloveError;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Diary ids bounding a crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRange {
    /// Newest diary to process; the walk starts here
    pub from: String,

    /// Oldest diary to process; `None` walks to the first diary
    pub to: Option<String>,
}

impl CrawlRange {
    pub fn new(from: impl Into<String>, to: Option<String>) -> Self {
        Self {
            from: from.into(),
            to,
        }
    }

    fn is_end(&self, id: &str) -> bool {
        self.to.as_deref() == Some(id)
    }
}

/// Finds the newest diary of the logged-in member
///
/// # Returns
///
/// * `Ok(String)` - Id of the first diary listed on the profile page
/// * `Err(TsloveError)` - The profile page could not be fetched or lists no diary
pub async fn find_start_id<F: PageFetcher + ?Sized>(fetcher: &F) -> Result<String, TsloveError> {
    let profile = fetcher.fetch_profile().await?;
    find_latest_entry_id(&profile).ok_or(TsloveError::NoDiary)
}

/// Main crawler coordinator structure
pub struct Coordinator<'a, F: ?Sized, R, S> {
    fetcher: &'a F,
    rewriter: R,
    store: S,
    layout: OutputLayout,
    excluded_scripts: Vec<String>,
    pacer: Pacer,
    interrupt: Interrupt,
    stats: CrawlStatistics,
}

impl<'a, F, R, S> Coordinator<'a, F, R, S>
where
    F: PageFetcher + ?Sized,
    R: LinkRewriter,
    S: EntryStore,
{
    /// Creates a new coordinator
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Source of forum pages
    /// * `rewriter` - Rewrites fetched pages for the mirror
    /// * `store` - Entry store of the dump, already loaded
    /// * `layout` - Directory layout of the dump, already prepared
    /// * `pacer` - Pacing of remote fetches
    /// * `interrupt` - Set when the user asks the crawl to stop
    pub fn new(
        fetcher: &'a F,
        rewriter: R,
        store: S,
        layout: OutputLayout,
        pacer: Pacer,
        interrupt: Interrupt,
    ) -> Self {
        Self {
            fetcher,
            rewriter,
            store,
            layout,
            excluded_scripts: Vec::new(),
            pacer,
            interrupt,
            stats: CrawlStatistics::new(),
        }
    }

    /// Sets the script path prefixes that are never downloaded
    pub fn with_excluded_scripts(mut self, excluded: Vec<String>) -> Self {
        self.excluded_scripts = excluded;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Runs the crawl loop
    ///
    /// Walks from `range.from` through the predecessor chain until the end
    /// id, the first diary, an interrupt, or a diary id seen twice. The
    /// entry store is saved before returning, whatever the outcome.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlStatistics)` - The crawl stopped normally
    /// * `Err(TsloveError::Entry)` - Processing a diary id failed
    pub async fn run(&mut self, range: &CrawlRange) -> Result<CrawlStatistics, TsloveError> {
        tracing::info!(
            "Starting crawl at diary {} (end: {})",
            range.from,
            range.to.as_deref().unwrap_or("first diary")
        );

        let retries_at_start = self.fetcher.total_retries();
        let mut visited = HashSet::new();
        let mut next = Some(range.from.clone());

        while let Some(id) = next.take() {
            if self.interrupt.is_triggered() {
                tracing::info!("Interrupted before diary {}", id);
                self.stats.stop_reason = StopReason::Interrupted;
                break;
            }

            if !visited.insert(id.clone()) {
                tracing::warn!("Diary {} was already visited; the chain loops", id);
                self.stats.stop_reason = StopReason::Cycle;
                break;
            }

            let record = match self.process(&id).await {
                Ok(record) => record,
                Err(e) => {
                    self.flush_store();
                    return Err(TsloveError::Entry {
                        id,
                        source: Box::new(e),
                    });
                }
            };

            if range.is_end(&id) {
                self.stats.stop_reason = StopReason::ReachedEnd;
            } else if let Some(predecessor) = record.predecessor_id {
                next = Some(predecessor);
            } else {
                self.stats.stop_reason = StopReason::ChainStart;
            }
        }

        self.stats.retries = self
            .fetcher
            .total_retries()
            .saturating_sub(retries_at_start);
        self.flush_store();

        Ok(self.stats.clone())
    }

    /// Saves the entry store, logging a failure
    fn flush_store(&self) {
        if let Err(e) = self.store.save() {
            tracing::warn!("Can not save entry store. {}", e);
        }
    }

    /// Processes one diary id and returns its record
    async fn process(&mut self, id: &str) -> Result<EntryRecord, TsloveError> {
        let file = self.layout.entry_file(id);
        let state = VisitState::classify(id, &file, &self.store);
        tracing::debug!("Diary {} is {}", id, state);

        if state == VisitState::CachedWithMetadata {
            if let Some(record) = self.store.get(id) {
                self.stats.skipped += 1;
                return Ok(record.clone());
            }
        }

        let record = if state.is_local() {
            let record = self.recover_local(id, &file)?;
            self.stats.recovered += 1;
            record
        } else {
            let record = self.fetch_remote(id, &file).await?;
            self.stats.fetched += 1;
            record
        };

        println!(
            "diary id {} ({}:{}) processed.{}",
            id,
            record.date.format("%Y-%m-%d"),
            record.title,
            if state.is_local() { " (local)" } else { "" }
        );

        self.store.insert(record.clone());
        Ok(record)
    }

    /// Rebuilds the record of a diary from its local page
    fn recover_local(&self, id: &str, file: &Path) -> Result<EntryRecord, TsloveError> {
        let html = fs::read_to_string(file)?;
        Ok(parse_entry(id, &html)?)
    }

    /// Fetches a diary, downloads its assets and writes the rewritten page
    ///
    /// The page is parsed before anything is written, so a page that is not
    /// a readable diary leaves no file behind.
    async fn fetch_remote(&mut self, id: &str, file: &Path) -> Result<EntryRecord, TsloveError> {
        if let Some(delay) = self.pacer.next_delay() {
            tracing::debug!("Waiting {} sec. before diary {}", delay.as_secs(), id);
            tokio::time::sleep(delay).await;
        }

        let retries_before = self.fetcher.total_retries();

        let html = self.fetcher.fetch_diary(id).await?;
        let record = parse_entry(id, &html)?;

        let assets = asset_references(&html);
        let images = download_images(self.fetcher, &assets, &self.layout.images_dir()).await;
        let excluded = &self.excluded_scripts;
        let scripts = download_scripts(
            self.fetcher,
            &assets,
            &self.layout.scripts_dir(),
            |src: &str| excluded.iter().any(|prefix| src.starts_with(prefix.as_str())),
        )
        .await;
        tracing::debug!("Diary {}: {} images, {} scripts downloaded", id, images, scripts);

        fs::write(file, self.rewriter.rewrite_document(&html))?;

        let consumed = self.fetcher.total_retries().saturating_sub(retries_before);
        if let Some((previous, current)) = self.pacer.record_fetch(consumed) {
            tracing::info!(
                "interval changes {} sec. to {} sec.",
                previous.as_secs(),
                current.as_secs()
            );
        }

        Ok(record)
    }
}
