//! JSON file entry store
//!
//! This module provides the `page_info.json` implementation of the
//! EntryStore trait.

use crate::diary::EntryRecord;
use crate::storage::traits::{EntryStore, StoreError, StoreResult};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Entry store kept in memory and written as one JSON object
pub struct JsonStore {
    path: Option<PathBuf>,
    records: BTreeMap<String, EntryRecord>,
}

impl JsonStore {
    /// Opens the store at `path`
    ///
    /// A missing file is an empty store; it is created on the first save.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the JSON file
    ///
    /// # Returns
    ///
    /// * `Ok(JsonStore)` - Store holding every record of the file
    /// * `Err(StoreError)` - The file is unreadable, malformed or inconsistent
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();

        let records = if path.exists() {
            let text = fs::read_to_string(&path).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            let records: BTreeMap<String, EntryRecord> =
                serde_json::from_str(&text).map_err(|source| StoreError::Json {
                    path: path.clone(),
                    source,
                })?;
            validate(&records)?;
            tracing::debug!("Loaded {} records from {}", records.len(), path.display());
            records
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path: Some(path),
            records,
        })
    }

    /// Creates a store that is never written anywhere (for testing)
    pub fn new_in_memory() -> Self {
        Self {
            path: None,
            records: BTreeMap::new(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

fn validate(records: &BTreeMap<String, EntryRecord>) -> StoreResult<()> {
    for (key, record) in records {
        if *key != record.id {
            return Err(StoreError::Inconsistent {
                key: key.clone(),
                id: record.id.clone(),
            });
        }
    }
    Ok(())
}

impl EntryStore for JsonStore {
    fn get(&self, id: &str) -> Option<&EntryRecord> {
        self.records.get(id)
    }

    fn insert(&mut self, record: EntryRecord) {
        self.records.insert(record.id.clone(), record);
    }

    fn records(&self) -> Vec<&EntryRecord> {
        self.records.values().collect()
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn save(&self) -> StoreResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let json = serde_json::to_string_pretty(&self.records).map_err(|source| {
            StoreError::Json {
                path: path.clone(),
                source,
            }
        })?;
        fs::write(path, json).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;

        tracing::debug!("Saved {} records to {}", self.records.len(), path.display());
        Ok(())
    }
}
