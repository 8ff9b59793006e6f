//! Output generation for a finished search.
//!
//! # Submodules
//!
//! - [`markdown`]: Renders a `ResultsPage` as a two-section Markdown page
//! - [`json`]: Writes a `ResultsPage` to a JSON file

pub mod json;
pub mod markdown;
