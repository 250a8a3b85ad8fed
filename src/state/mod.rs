//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `VisitState`: how a diary id is processed (skipped, recovered from the
//!   local page, or fetched)
//! - `Pacer`: the adaptive delay between remote fetches

mod pacing;
mod visit_state;

// Re-export main types
pub use pacing::Pacer;
pub use visit_state::VisitState;
