//! Storage module for the entry store
//!
//! This module handles persistence of diary metadata between runs:
//! - Loading `page_info.json` at crawl start
//! - Validating that every record is stored under its own id
//! - Flushing the store at crawl end and on the way out of a failure

mod json;
mod traits;

pub use json::JsonStore;
pub use traits::{EntryStore, StoreError, StoreResult};

use std::path::Path;

/// File name of the entry store inside the tools directory
pub const STORE_FILE_NAME: &str = "page_info.json";

/// Opens the entry store of a dump
///
/// # Arguments
///
/// * `tools_dir` - The `tslove-tools` directory of the dump
///
/// # Returns
///
/// * `Ok(JsonStore)` - The stored records, or an empty store for a new dump
/// * `Err(StoreError)` - The store exists but cannot be read
pub fn open_store(tools_dir: &Path) -> StoreResult<JsonStore> {
    JsonStore::open(tools_dir.join(STORE_FILE_NAME))
}
