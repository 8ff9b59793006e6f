//! Aggregation and filtering of candidates from several sources.
//!
//! For one category (articles or videos) the pipeline walks the selected
//! sources in the caller's order. Each source is over-fetched, aged,
//! filtered against the recency threshold, deduplicated and capped, then
//! handed to the summarization gate. Results are concatenated per source;
//! nothing is re-sorted across sources.

use crate::age::{DateStyle, normalize_at};
use crate::api::Summarizer;
use crate::gate::SummarizationGate;
use crate::models::{Candidate, DisplayRecord, SourceFailure};
use crate::sources::ContentSource;
use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Treatment of candidates whose age could not be determined while a
/// recency threshold is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownAgePolicy {
    /// Undated entries are never excluded.
    #[default]
    Keep,
    /// Undated entries are dropped whenever a threshold is set.
    Exclude,
}

/// Parameters of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// `None` means "any time".
    pub max_age_days: Option<f64>,
    pub per_source_cap: usize,
    /// Raw entries requested per source, as a multiple of the cap.
    pub overfetch_factor: usize,
    pub unknown_age: UnknownAgePolicy,
    /// Summarizer calls allowed in flight.
    pub concurrency: usize,
    /// Reference time for age computation.
    pub now: DateTime<Utc>,
}

impl PipelineOptions {
    /// Raw entries to request from each source.
    pub fn fetch_limit(&self) -> usize {
        self.per_source_cap.saturating_mul(self.overfetch_factor.max(1))
    }

    fn admits(&self, age_days: Option<f64>) -> bool {
        match (self.max_age_days, age_days) {
            (None, _) => true,
            (Some(max), Some(age)) => age <= max,
            (Some(_), None) => self.unknown_age == UnknownAgePolicy::Keep,
        }
    }
}

/// Age, filter, deduplicate and cap one source's candidates.
///
/// Adapter order is preserved. Repeated links keep their first occurrence.
pub fn filter_candidates(
    candidates: Vec<Candidate>,
    style: DateStyle,
    options: &PipelineOptions,
) -> Vec<Candidate> {
    let total = candidates.len();
    let kept: Vec<Candidate> = candidates
        .into_iter()
        .map(|mut c| {
            c.age_days = c
                .raw_date
                .as_deref()
                .and_then(|raw| normalize_at(raw, style, options.now));
            c
        })
        .filter(|c| {
            let admitted = options.admits(c.age_days);
            if !admitted {
                debug!(title = %c.title, age_days = ?c.age_days, "Dropped by recency filter");
            }
            admitted
        })
        .unique_by(|c| {
            if c.link.is_empty() {
                // linkless entries are keyed by title
                format!("\u{0}{}", c.title)
            } else {
                c.link.clone()
            }
        })
        .take(options.per_source_cap)
        .collect();
    debug!(total, kept = kept.len(), "Filtered candidates");
    kept
}

/// What one category produced: annotated records in source order, plus
/// the sources that could not be fetched.
#[derive(Debug, Default, PartialEq)]
pub struct CategoryResults {
    pub records: Vec<DisplayRecord>,
    pub failures: Vec<SourceFailure>,
}

/// Run the whole pipeline for one category.
///
/// A source that fails to fetch contributes no records; the error is logged,
/// reported in `failures`, and the remaining sources still run. An empty `sources` slice returns an
/// empty result without touching the summarizer.
#[instrument(level = "info", skip_all, fields(%topic, sources = sources.len(), max_age_days = ?options.max_age_days))]
pub async fn run<S, M>(
    topic: &str,
    interest_keywords: &[String],
    sources: &[S],
    options: &PipelineOptions,
    gate: &SummarizationGate<M>,
) -> CategoryResults
where
    S: ContentSource,
    M: Summarizer,
{
    let mut records = Vec::new();
    let mut failures = Vec::new();
    for source in sources {
        let label = source.label();
        let raw = match source.fetch(topic, options.fetch_limit()).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(source = %label, error = %e, "Source unavailable; continuing without it");
                failures.push(SourceFailure {
                    source_label: label.to_string(),
                    error: e.to_string(),
                });
                continue;
            }
        };
        let fetched = raw.len();
        let survivors = filter_candidates(raw, source.date_style(), options);
        info!(source = %label, fetched, kept = survivors.len(), "Source filtered");

        let annotated = gate
            .annotate_all(survivors, interest_keywords, options.concurrency)
            .await;
        records.extend(annotated);
    }
    info!(total = records.len(), failed_sources = failures.len(), "Pipeline complete");
    CategoryResults { records, failures }
}
