//! tslove-dump: an offline mirror of a T'sLove diary
//!
//! This crate logs in to the T'sLove forum, walks a member's diary chain
//! backward from the newest (or a chosen) entry, and stores every entry as a
//! local page with its images, scripts and stylesheet, together with a
//! resumable index of what has already been mirrored.

pub mod config;
pub mod crawler;
pub mod diary;
mod html;
pub mod output;
pub mod rewrite;
pub mod state;
pub mod storage;
pub mod web;

use thiserror::Error;

/// Main error type for tslove-dump operations
#[derive(Debug, Error)]
pub enum TsloveError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Web(#[from] web::WebError),

    #[error(transparent)]
    Diary(#[from] diary::DiaryError),

    #[error(transparent)]
    Store(#[from] storage::StoreError),

    #[error(transparent)]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No diary found on the profile page")]
    NoDiary,

    #[error("Processing diary id {id} failed. {source}")]
    Entry {
        id: String,
        source: Box<TsloveError>,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for tslove-dump operations
pub type Result<T> = std::result::Result<T, TsloveError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use diary::EntryRecord;
pub use web::{Credentials, Session};
