//! Storage traits and error types
//!
//! This module defines the trait interface for entry stores and the
//! associated error types.

use crate::diary::EntryRecord;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during entry store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Cannot access entry store {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed entry store {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Entry store key {key} holds the record of diary {id}")]
    Inconsistent { key: String, id: String },
}

/// Result type for entry store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Metadata of every mirrored diary entry, keyed by diary id
///
/// Records are only ever added or replaced during a run; nothing is
/// removed.
pub trait EntryStore {
    /// Gets the record of a diary entry
    fn get(&self, id: &str) -> Option<&EntryRecord>;

    /// Adds a record, replacing any previous record of the same id
    fn insert(&mut self, record: EntryRecord);

    /// Every record, in key order
    fn records(&self) -> Vec<&EntryRecord>;

    /// Number of records
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Writes every record to durable storage
    fn save(&self) -> StoreResult<()>;
}
