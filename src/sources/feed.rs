//! Article feed source (RSS 2.0 and Atom).
//!
//! Each configured registry entry becomes one [`FeedSource`]. The user's
//! topic is reduced to a single tag which is substituted into the entry's
//! endpoint template, e.g. `https://medium.com/feed/tag/{tag}`.
//!
//! # Parsing
//!
//! RSS and Atom bodies go through the same lenient parser. Missing fields
//! degrade to defaults instead of failing the entry: no title becomes
//! `"No title"`, no link becomes an empty string, a missing or unreadable
//! date becomes `None`, and HTML bodies are reduced to text.

use super::{ContentSource, FetchError, topic_tag};
use crate::age::DateStyle;
use crate::config::SourceConfig;
use crate::models::Candidate;
use crate::utils::strip_html;
use feed_rs::model::Entry;
use feed_rs::parser;
use reqwest::Client;
use tracing::{debug, info, instrument};

/// One article feed from the source registry.
#[derive(Debug, Clone)]
pub struct FeedSource {
    config: SourceConfig,
    default_tag: String,
    http: Client,
}

impl FeedSource {
    pub fn new(config: SourceConfig, default_tag: &str, http: Client) -> Self {
        Self {
            config,
            default_tag: default_tag.to_string(),
            http,
        }
    }

    /// The feed URL requested for `topic`.
    pub fn endpoint(&self, topic: &str) -> String {
        self.config
            .endpoint_for(&topic_tag(topic, &self.default_tag))
    }
}

impl ContentSource for FeedSource {
    fn label(&self) -> &str {
        &self.config.name
    }

    fn date_style(&self) -> DateStyle {
        self.config.date_style
    }

    #[instrument(level = "info", skip_all, fields(source = %self.config.name, %topic, max_raw = max_raw))]
    async fn fetch(&self, topic: &str, max_raw: usize) -> Result<Vec<Candidate>, FetchError> {
        let url = self.endpoint(topic);
        debug!(%url, "Requesting feed");

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }
        let body = response.bytes().await?;

        let candidates = parse_feed(&body, &self.config.name, max_raw)?;
        info!(count = candidates.len(), %url, "Parsed feed entries");
        Ok(candidates)
    }
}

/// Parse an RSS or Atom document into at most `max_raw` candidates.
pub fn parse_feed(body: &[u8], label: &str, max_raw: usize) -> Result<Vec<Candidate>, FetchError> {
    let feed = parser::parse(body)
        .map_err(|e| FetchError::Parse(format!("{label} feed is neither RSS nor Atom: {e}")))?;
    Ok(feed
        .entries
        .iter()
        .take(max_raw)
        .map(|entry| entry_candidate(entry, label))
        .collect())
}

fn entry_candidate(entry: &Entry, label: &str) -> Candidate {
    let title = entry.title.as_ref().map(|t| t.content.as_str());
    let mut candidate = Candidate::new(title, entry_link(entry), label);

    // Dates arrive parsed; re-emit as RFC 2822 so every feed speaks one dialect.
    candidate.raw_date = entry
        .published
        .or(entry.updated)
        .map(|d| d.to_rfc2822());

    candidate.body_text = entry
        .content
        .as_ref()
        .and_then(|c| c.body.as_deref())
        .or_else(|| entry.summary.as_ref().map(|s| s.content.as_str()))
        .map(strip_html)
        .unwrap_or_default();
    candidate
}

/// The alternate (or unlabelled) link, else the first non-empty one.
fn entry_link(entry: &Entry) -> Option<&str> {
    let usable = || entry.links.iter().filter(|l| !l.href.trim().is_empty());
    usable()
        .find(|l| {
            l.rel
                .as_deref()
                .is_none_or(|rel| rel.is_empty() || rel.eq_ignore_ascii_case("alternate"))
        })
        .or_else(|| usable().next())
        .map(|l| l.href.as_str())
}
