//! Offline rewriting of pages and the stylesheet
//!
//! This module handles:
//! - Mapping asset references to local file names
//! - Rewriting diary pages to point at the local mirror
//! - Rewriting the site stylesheet to point at its local images

mod document;
mod edits;
mod filename;
mod stylesheet;

pub use document::{asset_references, AssetReferences, DocumentRewriter};
pub use filename::{resolve_asset_filename, script_filename};
pub use stylesheet::{rewrite_stylesheet, stylesheet_image_paths};

/// Rewrites a fetched page for storage in the mirror
pub trait LinkRewriter: Send + Sync {
    /// Returns the page with its links and assets pointing at local copies
    fn rewrite_document(&self, html: &str) -> String;
}
