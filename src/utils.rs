//! Utility functions for text cleanup, truncation, and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - HTML-to-text conversion for feed bodies
//! - Whitespace normalization and char-safe excerpts for prompts
//! - String truncation for logging
//! - Output path validation

use scraper::Html;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` characters with an ellipsis and
/// byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log("a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Collapse every run of whitespace into a single space and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract the visible text of an HTML fragment.
///
/// Feed bodies are usually HTML (`content:encoded`, Atom `content`); the
/// summarizer only needs the words.
pub fn strip_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    collapse_whitespace(&text)
}

/// Take at most `max_chars` characters of `s`, never splitting a character.
pub fn excerpt(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        None => s,
        Some((cut, _)) => &s[..cut],
    }
}

/// Ensure the parent directory of an output file exists.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_parent_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
        info!(dir = %parent.display(), "Output directory ready");
    }
    Ok(())
}
