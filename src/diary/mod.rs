//! Diary entries
//!
//! - `EntryRecord`: the metadata kept for every mirrored entry
//! - Parsing of diary pages and profile pages

mod parser;
mod record;

pub use parser::{
    check_entry_page, entry_id_from_href, find_latest_entry_id, parse_entry, NO_SUCH_ENTRY_MARKER,
};
pub use record::{EntryRecord, PAGE_DATE_FORMAT, STORE_DATE_FORMAT};

use thiserror::Error;

/// Errors raised while reading a diary page
#[derive(Debug, Error)]
pub enum DiaryError {
    #[error("No such diary: {0}")]
    NoSuchEntry(String),

    #[error("Diary {id}: element '{element}' not found")]
    MissingElement { id: String, element: &'static str },

    #[error("Diary {id}: cannot parse date '{value}': {source}")]
    BadDate {
        id: String,
        value: String,
        source: chrono::ParseError,
    },
}
