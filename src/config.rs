//! Runtime configuration: summarizer settings, source registry, and caps.
//!
//! Configuration comes from an optional YAML file. Every section has
//! defaults, so a partial file (or none at all) is valid. The whole
//! structure is validated before any search runs; a bad registry entry or a
//! missing API key stops the program instead of surfacing mid-search.
//!
//! ```yaml
//! summarizer:
//!   model: gpt-4
//!   temperature: 0.5
//! articles:
//!   per_source_cap: 3
//!   sources:
//!     - name: Medium
//!       endpoint_template: https://medium.com/feed/tag/{tag}
//!       date_style: absolute
//! unknown_age: exclude
//! ```

use crate::age::DateStyle;
use crate::pipeline::UnknownAgePolicy;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

/// Placeholder substituted with the topic tag in feed endpoint templates.
pub const TAG_PLACEHOLDER: &str = "{tag}";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("config file is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("no summarizer API key; set OPENAI_API_KEY or pass --api-key")]
    MissingCredential,

    #[error("unknown article source {name:?}; configured sources: {known}")]
    UnknownSource { name: String, known: String },
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub summarizer: SummarizerConfig,
    pub articles: ArticleConfig,
    pub videos: VideoConfig,
    /// What to do with results whose age cannot be determined.
    pub unknown_age: UnknownAgePolicy,
    /// User-Agent sent to feeds and the video provider.
    pub user_agent: String,
    pub http_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            summarizer: SummarizerConfig::default(),
            articles: ArticleConfig::default(),
            videos: VideoConfig::default(),
            unknown_age: UnknownAgePolicy::Keep,
            user_agent: concat!("topic_digest/", env!("CARGO_PKG_VERSION")).to_string(),
            http_timeout_secs: 60,
        }
    }
}

/// Settings for the OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    pub api_base: String,
    pub model: String,
    pub temperature: f32,
    /// Retries after the first failed attempt; 0 disables retrying.
    pub max_retries: usize,
    pub retry_base_delay_ms: u64,
    /// Maximum characters of body text embedded in each prompt.
    pub body_char_budget: usize,
    /// Maximum summarizer calls in flight. 1 keeps calls strictly sequential.
    pub concurrency: usize,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4".to_string(),
            temperature: 0.5,
            max_retries: 3,
            retry_base_delay_ms: 1_000,
            body_char_budget: 1_000,
            concurrency: 1,
        }
    }
}

/// One entry of the article source registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Human-readable name users select, e.g. `"Medium"`.
    pub name: String,
    /// Feed URL, optionally containing one `{tag}` placeholder.
    pub endpoint_template: String,
    #[serde(default = "default_feed_date_style")]
    pub date_style: DateStyle,
}

fn default_feed_date_style() -> DateStyle {
    DateStyle::Absolute
}

impl SourceConfig {
    pub fn new(name: &str, endpoint_template: &str) -> Self {
        Self {
            name: name.to_string(),
            endpoint_template: endpoint_template.to_string(),
            date_style: DateStyle::Absolute,
        }
    }

    /// Fill the template with a URL-encoded tag.
    pub fn endpoint_for(&self, tag: &str) -> String {
        self.endpoint_template
            .replace(TAG_PLACEHOLDER, &urlencoding::encode(tag))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("article source with an empty name".into()));
        }
        let placeholders = self.endpoint_template.matches(TAG_PLACEHOLDER).count();
        if placeholders > 1 {
            return Err(ConfigError::Invalid(format!(
                "source {:?}: endpoint template has {placeholders} {TAG_PLACEHOLDER} placeholders, expected at most one",
                self.name
            )));
        }
        validate_http_url(&self.endpoint_for("tag"), &format!("source {:?}", self.name))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticleConfig {
    pub per_source_cap: usize,
    /// Raw entries requested per source, as a multiple of the cap.
    pub overfetch_factor: usize,
    /// Tag used when the topic is blank.
    pub default_tag: String,
    /// Sources searched when the user selects none explicitly.
    pub default_sources: Vec<String>,
    pub sources: Vec<SourceConfig>,
}

impl Default for ArticleConfig {
    fn default() -> Self {
        Self {
            per_source_cap: 5,
            overfetch_factor: 3,
            default_tag: "python".to_string(),
            default_sources: vec!["Medium".to_string()],
            sources: vec![
                SourceConfig::new("Medium", "https://medium.com/feed/tag/{tag}"),
                SourceConfig::new("DEV", "https://dev.to/feed/tag/{tag}"),
                SourceConfig::new("Hacker News", "https://hnrss.org/newest?q={tag}"),
                SourceConfig::new("Towards Data Science", "https://towardsdatascience.com/feed"),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    pub label: String,
    pub per_source_cap: usize,
    pub overfetch_factor: usize,
    /// Search results page; the query is appended as `search_query`.
    pub endpoint: String,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            label: "YouTube".to_string(),
            per_source_cap: 5,
            overfetch_factor: 3,
            endpoint: "https://www.youtube.com/results".to_string(),
        }
    }
}

fn validate_http_url(candidate: &str, what: &str) -> Result<(), ConfigError> {
    let url = Url::parse(candidate)
        .map_err(|e| ConfigError::Invalid(format!("{what}: {candidate:?} is not a valid URL ({e})")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::Invalid(format!(
            "{what}: unsupported URL scheme {other:?}"
        ))),
    }
}

impl AppConfig {
    /// Parse a YAML document and validate it.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every invariant the pipeline relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (what, value) in [
            ("articles.per_source_cap", self.articles.per_source_cap),
            ("articles.overfetch_factor", self.articles.overfetch_factor),
            ("videos.per_source_cap", self.videos.per_source_cap),
            ("videos.overfetch_factor", self.videos.overfetch_factor),
            ("summarizer.concurrency", self.summarizer.concurrency),
            ("summarizer.body_char_budget", self.summarizer.body_char_budget),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{what} must be at least 1")));
            }
        }
        if !(0.0..=2.0).contains(&self.summarizer.temperature) {
            return Err(ConfigError::Invalid(format!(
                "summarizer.temperature must be within 0.0..=2.0, got {}",
                self.summarizer.temperature
            )));
        }
        if self.summarizer.model.trim().is_empty() {
            return Err(ConfigError::Invalid("summarizer.model is empty".into()));
        }
        validate_http_url(&self.summarizer.api_base, "summarizer.api_base")?;
        validate_http_url(&self.videos.endpoint, "videos.endpoint")?;
        if self.articles.default_tag.split_whitespace().count() != 1 {
            return Err(ConfigError::Invalid(
                "articles.default_tag must be a single word".into(),
            ));
        }

        let mut seen = HashSet::new();
        for source in &self.articles.sources {
            source.validate()?;
            if !seen.insert(source.name.to_lowercase()) {
                return Err(ConfigError::Invalid(format!(
                    "article source {:?} is configured twice",
                    source.name
                )));
            }
        }
        self.select_sources(&self.articles.default_sources)?;
        Ok(())
    }

    /// Resolve user-selected source names against the registry.
    ///
    /// Matching is case-insensitive, repeated names collapse to one, and the
    /// caller's order is kept.
    pub fn select_sources(&self, names: &[String]) -> Result<Vec<SourceConfig>, ConfigError> {
        names
            .iter()
            .map(|n| n.trim())
            .unique_by(|n| n.to_lowercase())
            .map(|name| {
                self.articles
                    .sources
                    .iter()
                    .find(|s| s.name.eq_ignore_ascii_case(name))
                    .cloned()
                    .ok_or_else(|| ConfigError::UnknownSource {
                        name: name.to_string(),
                        known: self.articles.sources.iter().map(|s| s.name.as_str()).join(", "),
                    })
            })
            .collect()
    }
}

/// Load and validate configuration. Without a path the built-in defaults
/// are used.
#[instrument(level = "info", skip_all)]
pub async fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let Some(path) = path else {
        info!("No config file given; using built-in defaults");
        let config = AppConfig::default();
        config.validate()?;
        return Ok(config);
    };
    let yaml = fs::read_to_string(path).await.map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let config = AppConfig::from_yaml(&yaml)?;
    info!(
        path = %path.display(),
        sources = config.articles.sources.len(),
        model = %config.summarizer.model,
        "Loaded configuration"
    );
    Ok(config)
}

/// Fail fast when the summarizer credential is absent or blank.
pub fn require_api_key(key: Option<&str>) -> Result<String, ConfigError> {
    key.map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .ok_or(ConfigError::MissingCredential)
}
