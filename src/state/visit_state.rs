/// Visit state of a diary id
///
/// This module decides, per diary id, where its metadata comes from.
use crate::storage::EntryStore;
use std::fmt;
use std::path::Path;

/// How a diary id is processed, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisitState {
    /// Local page and store record both present; nothing to do
    CachedWithMetadata,

    /// Local page present without a store record; reparse the page
    CachedWithoutMetadata,

    /// No local page; fetch, rewrite and store it
    Uncached,
}

impl VisitState {
    /// Classifies a diary id from the state of the dump
    ///
    /// # Arguments
    ///
    /// * `id` - The diary id
    /// * `entry_file` - Path of the local copy of its page
    /// * `store` - The entry store
    pub fn classify(id: &str, entry_file: &Path, store: &dyn EntryStore) -> Self {
        match (entry_file.exists(), store.contains(id)) {
            (true, true) => Self::CachedWithMetadata,
            (true, false) => Self::CachedWithoutMetadata,
            (false, _) => Self::Uncached,
        }
    }

    /// Returns true if the forum has to be contacted
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Uncached)
    }

    /// Returns true if the id is processed from the local mirror
    pub fn is_local(&self) -> bool {
        !self.is_remote()
    }
}

impl fmt::Display for VisitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CachedWithMetadata => write!(f, "cached"),
            Self::CachedWithoutMetadata => write!(f, "local"),
            Self::Uncached => write!(f, "remote"),
        }
    }
}
