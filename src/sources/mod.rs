//! Content sources the pipeline can pull candidates from.
//!
//! Every source follows the same contract: given the user's topic and an
//! upper bound on raw entries, return [`Candidate`]s in the order the
//! provider listed them, or a [`FetchError`]. Sources never compute ages
//! themselves; they only declare which [`DateStyle`] their dates use.
//!
//! # Supported Sources
//!
//! | Kind | Module | Method | Date style |
//! |------|--------|--------|------------|
//! | Article feeds (Medium, DEV, ...) | [`feed`] | RSS 2.0 / Atom | Absolute |
//! | YouTube | [`youtube`] | Search page `ytInitialData` | Relative |

use crate::age::DateStyle;
use crate::models::Candidate;
use thiserror::Error;

pub mod feed;
pub mod youtube;

pub use feed::FeedSource;
pub use youtube::YouTubeSource;

/// Why a single source produced nothing.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("could not parse response: {0}")]
    Parse(String),
}

/// A provider of raw search results.
pub trait ContentSource {
    /// Name shown next to each result, e.g. `"Medium"`.
    fn label(&self) -> &str;

    /// Format of the dates this source returns.
    fn date_style(&self) -> DateStyle;

    /// Fetch at most `max_raw` candidates for `topic`.
    async fn fetch(&self, topic: &str, max_raw: usize) -> Result<Vec<Candidate>, FetchError>;
}

/// Derive a feed tag from a free-text topic.
///
/// The first whitespace-delimited word, lower-cased; `default_tag` when the
/// topic is blank.
pub fn topic_tag(topic: &str, default_tag: &str) -> String {
    topic
        .split_whitespace()
        .next()
        .map(str::to_lowercase)
        .unwrap_or_else(|| default_tag.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_tag_takes_first_word_lowercased() {
        assert_eq!(topic_tag("Python machine learning", "python"), "python");
        assert_eq!(topic_tag("  Rust  async", "python"), "rust");
        assert_eq!(topic_tag("WebAssembly", "python"), "webassembly");
    }

    #[test]
    fn test_topic_tag_falls_back_to_default() {
        assert_eq!(topic_tag("", "python"), "python");
        assert_eq!(topic_tag("   \t", "programming"), "programming");
    }

    #[test]
    fn test_fetch_error_display() {
        let e = FetchError::Status {
            url: "https://medium.com/feed/tag/rust".to_string(),
            status: 503,
        };
        assert_eq!(e.to_string(), "https://medium.com/feed/tag/rust returned HTTP 503");
    }
}
