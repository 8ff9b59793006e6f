//! Command-line interface definitions for Topic Digest.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! The API key and config path can also come from environment variables.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Recency window offered to the user.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Recency {
    /// Any time
    Any,
    /// Past week
    Week,
    /// Past month
    Month,
    /// Past 3 months
    #[value(name = "3months")]
    ThreeMonths,
    /// Past year
    Year,
}

impl Recency {
    /// Threshold in days; `None` for "any time".
    pub fn max_age_days(self) -> Option<f64> {
        match self {
            Recency::Any => None,
            Recency::Week => Some(7.0),
            Recency::Month => Some(30.0),
            Recency::ThreeMonths => Some(90.0),
            Recency::Year => Some(365.0),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Recency::Any => "Any time",
            Recency::Week => "Past week",
            Recency::Month => "Past month",
            Recency::ThreeMonths => "Past 3 months",
            Recency::Year => "Past year",
        }
    }
}

/// Command-line arguments for the Topic Digest application.
///
/// # Examples
///
/// ```sh
/// # Articles from Medium and DEV plus YouTube, published in the past month
/// topic_digest "Rust async" -r month -s Medium -s DEV
///
/// # Videos only, with explicit interests, JSON written alongside
/// topic_digest "Python machine learning" --no-articles -i pandas -i sklearn -j out/results.json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Topic to search for
    #[arg(default_value = "Python machine learning")]
    pub topic: String,

    /// Only keep results published within this window
    #[arg(short, long, value_enum, default_value_t = Recency::Any)]
    pub recency: Recency,

    /// Article source to search (repeatable); defaults to the configured default sources
    #[arg(short = 's', long = "source")]
    pub sources: Vec<String>,

    /// Interest keyword for the recommendation (repeatable); defaults to the topic's words
    #[arg(short = 'i', long = "interest")]
    pub interests: Vec<String>,

    /// Skip the article search
    #[arg(long)]
    pub no_articles: bool,

    /// Skip the video search
    #[arg(long)]
    pub no_videos: bool,

    /// Optional path to config.yaml file
    #[arg(short, long, env = "TOPIC_DIGEST_CONFIG")]
    pub config: Option<PathBuf>,

    /// API key for the summarizer
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Also write the results as JSON to this file
    #[arg(short, long)]
    pub json_output: Option<PathBuf>,

    /// Write the Markdown page to this file instead of stdout
    #[arg(short, long)]
    pub markdown_output: Option<PathBuf>,
}

impl Cli {
    /// Keywords passed to the summarizer.
    pub fn interest_keywords(&self) -> Vec<String> {
        let explicit: Vec<String> = self
            .interests
            .iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        if !explicit.is_empty() {
            return explicit;
        }
        self.topic.split_whitespace().map(str::to_string).collect()
    }
}
