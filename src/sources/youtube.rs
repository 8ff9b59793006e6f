//! YouTube video search source.
//!
//! YouTube has no feed for search results, so this source requests the
//! regular results page and reads the `ytInitialData` JSON blob the page
//! embeds for its own rendering. Each `videoRenderer` in the primary results
//! becomes a [`Candidate`]; every sub-field is optional.
//!
//! Publish times are relative English phrases (`"3 weeks ago"`), so requests
//! pin `hl=en`.

use super::{ContentSource, FetchError};
use crate::age::DateStyle;
use crate::config::VideoConfig;
use crate::models::Candidate;
use crate::utils::collapse_whitespace;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, instrument};

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

static INITIAL_DATA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)(?:var ytInitialData|window\["ytInitialData"\])\s*=\s*(\{.*?\});\s*</script>"#)
        .expect("ytInitialData pattern is valid")
});

/// The single video provider.
#[derive(Debug, Clone)]
pub struct YouTubeSource {
    label: String,
    endpoint: String,
    http: Client,
}

impl YouTubeSource {
    pub fn new(config: &VideoConfig, http: Client) -> Self {
        Self {
            label: config.label.clone(),
            endpoint: config.endpoint.clone(),
            http,
        }
    }
}

impl ContentSource for YouTubeSource {
    fn label(&self) -> &str {
        &self.label
    }

    fn date_style(&self) -> DateStyle {
        DateStyle::Relative
    }

    #[instrument(level = "info", skip_all, fields(source = %self.label, %query, max_raw = max_raw))]
    async fn fetch(&self, query: &str, max_raw: usize) -> Result<Vec<Candidate>, FetchError> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("search_query", query), ("hl", "en")])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: response.url().to_string(),
                status: status.as_u16(),
            });
        }
        let html = response.text().await?;
        debug!(bytes = html.len(), "Fetched search page");

        let candidates = parse_search_page(&html, &self.label, max_raw)?;
        info!(count = candidates.len(), "Parsed video results");
        Ok(candidates)
    }
}

/// Extract up to `max_raw` videos from a results page.
pub fn parse_search_page(html: &str, label: &str, max_raw: usize) -> Result<Vec<Candidate>, FetchError> {
    let blob = INITIAL_DATA_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .ok_or_else(|| FetchError::Parse("search page has no ytInitialData".into()))?;
    let data: Value = serde_json::from_str(blob.as_str())
        .map_err(|e| FetchError::Parse(format!("ytInitialData is not valid JSON: {e}")))?;
    Ok(parse_initial_data(&data, label, max_raw))
}

/// Map the `videoRenderer`s of `ytInitialData` to candidates, in page order.
pub fn parse_initial_data(data: &Value, label: &str, max_raw: usize) -> Vec<Candidate> {
    let sections = data
        .pointer("/contents/twoColumnSearchResultsRenderer/primaryContents/sectionListRenderer/contents")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    sections
        .iter()
        .filter_map(|s| s.pointer("/itemSectionRenderer/contents").and_then(Value::as_array))
        .flatten()
        .filter_map(|item| item.get("videoRenderer"))
        .take(max_raw)
        .map(|video| video_candidate(video, label))
        .collect()
}

fn video_candidate(video: &Value, label: &str) -> Candidate {
    let title = text_of(video.get("title"));
    let link = video
        .get("videoId")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(|id| format!("{WATCH_URL}{id}"));
    let mut candidate = Candidate::new(title.as_deref(), link.as_deref(), label);

    candidate.raw_date = text_of(video.get("publishedTimeText"));
    candidate.thumbnail_url = video
        .pointer("/thumbnail/thumbnails/0/url")
        .and_then(Value::as_str)
        .map(str::to_string);
    candidate.body_text = video
        .pointer("/detailedMetadataSnippets/0/snippetText")
        .or_else(|| video.get("descriptionSnippet"))
        .and_then(|snippet| text_of(Some(snippet)))
        .unwrap_or_default();
    candidate
}

/// Read a YouTube text object: either `{"simpleText": ..}` or `{"runs": [{"text": ..}, ..]}`.
fn text_of(node: Option<&Value>) -> Option<String> {
    let node = node?;
    if let Some(simple) = node.get("simpleText").and_then(Value::as_str) {
        let text = collapse_whitespace(simple);
        return (!text.is_empty()).then_some(text);
    }
    let runs = node.get("runs")?.as_array()?;
    let joined = runs
        .iter()
        .filter_map(|r| r.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join(" ");
    let text = collapse_whitespace(&joined);
    (!text.is_empty()).then_some(text)
}
