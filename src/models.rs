//! Data models for search candidates and their rendered representations.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Candidate`]: Raw result produced by a source adapter
//! - [`DisplayRecord`]: Candidate annotated with an LLM summary and verdict
//! - [`SourceFailure`]: A source that could not be fetched or parsed
//! - [`ResultsPage`]: Everything one search produces, grouped by category
//!
//! Nothing here outlives a single run.

use serde::{Deserialize, Serialize};

/// Placeholder used when a source omits an entry title.
pub const NO_TITLE: &str = "No title";

/// Prefix marking a summary that is an error message rather than model output.
pub const ERROR_PREFIX: &str = "Error: ";

/// A raw content item (article or video) before summarization.
///
/// `age_days` is left empty by the adapters and filled in by the pipeline
/// once the source's date style is known.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Entry title, never empty.
    pub title: String,
    /// Entry link, possibly empty.
    pub link: String,
    /// The date exactly as the source reported it.
    pub raw_date: Option<String>,
    /// Age in days relative to the run's "now"; `None` means unknown.
    pub age_days: Option<f64>,
    /// First thumbnail URL (video sources only).
    pub thumbnail_url: Option<String>,
    /// Plain text used as summarizer input.
    pub body_text: String,
    /// Name of the source that produced this entry.
    pub source_label: String,
}

impl Candidate {
    /// Build a candidate with the title defaulted and optional fields empty.
    pub fn new(title: Option<&str>, link: Option<&str>, source_label: &str) -> Self {
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(NO_TITLE)
            .to_string();
        Self {
            title,
            link: link.map(str::trim).unwrap_or_default().to_string(),
            raw_date: None,
            age_days: None,
            thumbnail_url: None,
            body_text: String::new(),
            source_label: source_label.to_string(),
        }
    }
}

/// The recommendation token the summarizer is asked to end with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Recommended,
    Skip,
}

impl Verdict {
    /// Find the verdict in a summary. The last token wins, since the model
    /// is told to put it at the end.
    pub fn from_summary(summary: &str) -> Option<Self> {
        let rec = summary.rfind("RECOMMENDED");
        let skip = summary.rfind("SKIP");
        match (rec, skip) {
            (Some(r), Some(s)) if s > r => Some(Verdict::Skip),
            (Some(_), _) => Some(Verdict::Recommended),
            (None, Some(_)) => Some(Verdict::Skip),
            (None, None) => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Recommended => "RECOMMENDED",
            Verdict::Skip => "SKIP",
        }
    }
}

/// A candidate annotated with the summarizer's output, ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayRecord {
    pub title: String,
    pub link: String,
    pub raw_date: Option<String>,
    pub age_days: Option<f64>,
    pub thumbnail_url: Option<String>,
    pub source_label: String,
    /// Summarizer output, or a message starting with [`ERROR_PREFIX`] when
    /// `failed` is set.
    pub summary: String,
    /// Parsed verdict; always `None` for failed records.
    pub verdict: Option<Verdict>,
    /// The summarizer call failed and `summary` holds the error.
    #[serde(default)]
    pub failed: bool,
}

impl DisplayRecord {
    /// Attach a summary to a candidate, dropping its body text.
    pub fn from_candidate(candidate: Candidate, summary: String) -> Self {
        let verdict = Verdict::from_summary(&summary);
        Self::build(candidate, summary, verdict, false)
    }

    /// Record a failed summarizer call in place of a summary.
    pub fn from_failure(candidate: Candidate, error: &str) -> Self {
        Self::build(candidate, format!("{ERROR_PREFIX}{error}"), None, true)
    }

    fn build(candidate: Candidate, summary: String, verdict: Option<Verdict>, failed: bool) -> Self {
        Self {
            title: candidate.title,
            link: candidate.link,
            raw_date: candidate.raw_date,
            age_days: candidate.age_days,
            thumbnail_url: candidate.thumbnail_url,
            source_label: candidate.source_label,
            summary,
            verdict,
            failed,
        }
    }

    pub fn is_error(&self) -> bool {
        self.failed
    }
}

/// A source that contributed nothing because its fetch failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFailure {
    pub source_label: String,
    pub error: String,
}

/// The result of one search, grouped by category.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResultsPage {
    /// The topic as the user typed it.
    pub topic: String,
    /// When the search ran, RFC 3339.
    pub generated_at: String,
    /// Human label of the recency window, e.g. "Past month".
    pub recency: String,
    pub max_age_days: Option<f64>,
    pub articles: Vec<DisplayRecord>,
    pub videos: Vec<DisplayRecord>,
    #[serde(default)]
    pub article_failures: Vec<SourceFailure>,
    #[serde(default)]
    pub video_failures: Vec<SourceFailure>,
}
