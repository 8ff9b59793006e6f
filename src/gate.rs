//! Summarization gate: one summarizer call per surviving candidate.
//!
//! A failed call never escapes this module. The candidate is still turned
//! into a [`DisplayRecord`], with an `Error: ...` summary in place of the
//! model's text, so one bad call cannot take down the rest of the run.

use crate::api::{Summarizer, SummarizerError};
use crate::models::{Candidate, DisplayRecord};
use crate::utils::excerpt;
use futures::stream::{self, StreamExt};
use once_cell::sync::OnceCell;
use tracing::{debug, error, info, instrument, warn};

/// Build the prompt sent for one candidate.
///
/// The body is cut to `body_char_budget` characters to bound request size.
pub fn build_prompt(title: &str, body: &str, keywords: &[String], body_char_budget: usize) -> String {
    format!(
        "Title: {title}\nContent: {content}\n\nBased on these interests: {interests}, summarize in 2 lines and say 'RECOMMENDED' or 'SKIP' at the end.",
        content = excerpt(body.trim(), body_char_budget),
        interests = keywords.join(", "),
    )
}

/// Wraps an injected [`Summarizer`] with prompt building and failure handling.
///
/// Once the summarizer rejects the credential, later candidates are marked
/// failed without another call.
#[derive(Debug)]
pub struct SummarizationGate<M> {
    summarizer: M,
    body_char_budget: usize,
    /// Error text of the first rejected credential.
    auth_rejected: OnceCell<String>,
}

impl<M: Summarizer> SummarizationGate<M> {
    pub fn new(summarizer: M, body_char_budget: usize) -> Self {
        Self {
            summarizer,
            body_char_budget,
            auth_rejected: OnceCell::new(),
        }
    }

    /// Summarize one candidate. Never fails.
    #[instrument(level = "info", skip_all, fields(source = %candidate.source_label, title = %candidate.title))]
    pub async fn annotate(&self, candidate: Candidate, keywords: &[String]) -> DisplayRecord {
        if let Some(message) = self.auth_rejected.get() {
            return DisplayRecord::from_failure(candidate, message);
        }

        let prompt = build_prompt(
            &candidate.title,
            &candidate.body_text,
            keywords,
            self.body_char_budget,
        );
        debug!(prompt_chars = prompt.chars().count(), "Built prompt");

        match self.summarizer.summarize(&prompt).await {
            Ok(summary) => DisplayRecord::from_candidate(candidate, summary),
            Err(e @ SummarizerError::Auth { .. }) => {
                let message = e.to_string();
                if self.auth_rejected.set(message.clone()).is_ok() {
                    error!(error = %e, "Summarizer rejected the API key; check OPENAI_API_KEY or --api-key. Skipping remaining calls");
                }
                DisplayRecord::from_failure(candidate, &message)
            }
            Err(e) => {
                warn!(error = %e, link = %candidate.link, "Summarizer failed; attaching error");
                DisplayRecord::from_failure(candidate, &e.to_string())
            }
        }
    }

    /// Summarize candidates with at most `concurrency` calls in flight.
    ///
    /// Output order always matches input order.
    #[instrument(level = "info", skip_all, fields(count = candidates.len(), concurrency = concurrency))]
    pub async fn annotate_all(
        &self,
        candidates: Vec<Candidate>,
        keywords: &[String],
        concurrency: usize,
    ) -> Vec<DisplayRecord> {
        let records: Vec<DisplayRecord> = stream::iter(candidates)
            .map(|candidate| self.annotate(candidate, keywords))
            .buffered(concurrency.max(1))
            .collect()
            .await;

        let failed = records.iter().filter(|r| r.is_error()).count();
        info!(total = records.len(), failed, "Annotated candidates");
        records
    }
}
