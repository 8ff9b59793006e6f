//! LLM API interaction with exponential backoff retry logic.
//!
//! This module provides the interface the summarization gate talks to. It
//! includes an OpenAI-compatible chat completions client and a retry
//! decorator with exponential backoff and jitter for transient failures.
//!
//! # Architecture
//!
//! - [`Summarizer`]: Core trait defining one prompt-in, text-out call
//! - [`OpenAiSummarizer`]: Talks to `<api_base>/chat/completions`
//! - [`RetryAsk`]: Decorator that adds retry logic to any `Summarizer`
//!
//! # Retry Strategy
//!
//! - Only errors reported as retryable (transport, rate limit, 5xx) are retried
//! - Exponential backoff from a configurable base delay
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd

use crate::config::SummarizerConfig;
use crate::utils::truncate_for_log;
use rand::{Rng, rng};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

/// Failure of a single summarizer call.
#[derive(Debug, Error)]
pub enum SummarizerError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("authentication rejected (HTTP {status})")]
    Auth { status: u16 },

    #[error("rate limited by the API")]
    RateLimited,

    #[error("API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl SummarizerError {
    /// Whether another attempt could reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SummarizerError::Transport(_) | SummarizerError::RateLimited => true,
            SummarizerError::Status { status, .. } => *status >= 500,
            SummarizerError::Auth { .. } | SummarizerError::Malformed(_) => false,
        }
    }
}

/// Trait for async LLM interaction.
///
/// Implementors send a complete prompt to a language model and return its
/// text reply. Tests substitute their own implementation.
pub trait Summarizer {
    async fn summarize(&self, prompt: &str) -> Result<String, SummarizerError>;
}

/// Wrapper that adds exponential backoff retry logic to any [`Summarizer`].
///
/// # Backoff Strategy
///
/// The delay between retries follows this formula:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryAsk<T> {
    /// The underlying LLM client to wrap.
    inner: T,
    /// Maximum number of retry attempts before giving up.
    max_retries: usize,
    /// Initial delay between retries (doubles with each attempt).
    base_delay: StdDuration,
    /// Maximum delay cap to prevent excessive waiting.
    max_delay: StdDuration,
}

impl<T> RetryAsk<T>
where
    T: Summarizer,
{
    /// Create a new retry wrapper around an existing [`Summarizer`].
    ///
    /// ```ignore
    /// let client = OpenAiSummarizer::new(http, &config.summarizer, api_key);
    /// let retry_client = RetryAsk::new(client, 3, Duration::from_secs(1));
    /// ```
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }

    fn backoff(&self, attempt: usize) -> StdDuration {
        let shift = (attempt - 1).min(16) as u32;
        let delay = self.base_delay.saturating_mul(1 << shift).min(self.max_delay);
        let jitter_ms: u64 = rng().random_range(0..=250);
        delay + StdDuration::from_millis(jitter_ms)
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> Summarizer for RetryAsk<T>
where
    T: Summarizer,
{
    #[instrument(level = "info", skip_all)]
    async fn summarize(&self, prompt: &str) -> Result<String, SummarizerError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.summarize(prompt).await {
                Ok(resp) => {
                    return Ok(resp);
                }
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if !e.is_retryable() || attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            retryable = e.is_retryable(),
                            elapsed_ms_attempt = attempt_dt.as_millis(),
                            elapsed_ms_total = total_dt.as_millis(),
                            error = %e,
                            "summarize() giving up"
                        );
                        return Err(e);
                    }

                    let delay = self.backoff(attempt);
                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis(),
                        elapsed_ms_total = total_dt.as_millis(),
                        ?delay,
                        error = %e,
                        "summarize() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// OpenAI-compatible chat completions client.
///
/// The API key is passed in explicitly; nothing is read from the
/// environment here.
pub struct OpenAiSummarizer {
    http: Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl fmt::Debug for OpenAiSummarizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiSummarizer")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

impl OpenAiSummarizer {
    pub fn new(http: Client, config: &SummarizerConfig, api_key: String) -> Self {
        Self {
            http,
            endpoint: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }
}

impl Summarizer for OpenAiSummarizer {
    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn summarize(&self, prompt: &str) -> Result<String, SummarizerError> {
        let t0 = Instant::now();
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        let dt = t0.elapsed();

        if !status.is_success() {
            warn!(elapsed_ms = dt.as_millis(), status = status.as_u16(), "API call failed");
            return Err(classify_status(status, &body));
        }
        let text = parse_chat_response(&body)?;
        info!(elapsed_ms = dt.as_millis(), chars = text.len(), "API call succeeded");
        Ok(text)
    }
}

fn classify_status(status: StatusCode, body: &str) -> SummarizerError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SummarizerError::Auth {
            status: status.as_u16(),
        },
        StatusCode::TOO_MANY_REQUESTS => SummarizerError::RateLimited,
        _ => SummarizerError::Status {
            status: status.as_u16(),
            body: truncate_for_log(body.trim(), 200),
        },
    }
}

/// Pull the first choice's text out of a chat completions response body.
fn parse_chat_response(body: &str) -> Result<String, SummarizerError> {
    let parsed: ChatResponse = serde_json::from_str(body).map_err(|e| {
        SummarizerError::Malformed(format!("{e}; body: {}", truncate_for_log(body, 200)))
    })?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| SummarizerError::Malformed("response has no message content".into()))
}
