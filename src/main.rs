//! # Topic Digest
//!
//! Searches article feeds and YouTube for a topic, drops results older than
//! the chosen recency window, and asks an OpenAI-compatible LLM to summarize
//! each survivor in two lines ending with `RECOMMENDED` or `SKIP`.
//!
//! ## Usage
//!
//! ```sh
//! OPENAI_API_KEY=sk-... topic_digest "Python machine learning" -r month -s Medium -s DEV
//! ```
//!
//! ## Architecture
//!
//! One run per invocation:
//! 1. **Configuration**: CLI flags, optional YAML file, API key; validated up front
//! 2. **Articles**: each selected feed is fetched, aged, filtered, capped and summarized
//! 3. **Videos**: the same pipeline over the single video source
//! 4. **Output**: Markdown page on stdout (or a file) and optional JSON

use chrono::Utc;
use clap::Parser;
use reqwest::Client;
use std::error::Error;
use std::time::Duration as StdDuration;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod age;
mod api;
mod cli;
mod config;
mod gate;
mod models;
mod outputs;
mod pipeline;
mod sources;
mod utils;

use api::{OpenAiSummarizer, RetryAsk};
use cli::Cli;
use config::{AppConfig, load_config, require_api_key};
use gate::SummarizationGate;
use models::ResultsPage;
use outputs::{json, markdown};
use pipeline::{CategoryResults, PipelineOptions};
use sources::{FeedSource, YouTubeSource};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init (stderr; stdout carries the page) ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("topic_digest starting up");

    let args = Cli::parse();
    debug!(topic = %args.topic, recency = ?args.recency, sources = ?args.sources, "Parsed CLI arguments");

    // ---- Configuration: everything that can be wrong is caught here ----
    let config = load_config(args.config.as_deref()).await?;
    let api_key = require_api_key(args.api_key.as_deref())?;
    let selected = if args.sources.is_empty() {
        config.select_sources(&config.articles.default_sources)?
    } else {
        config.select_sources(&args.sources)?
    };
    let keywords = args.interest_keywords();
    info!(
        sources = ?selected.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
        keywords = ?keywords,
        recency = args.recency.label(),
        "Search configured"
    );

    let http = build_http_client(&config)?;
    let summarizer = RetryAsk::new(
        OpenAiSummarizer::new(http.clone(), &config.summarizer, api_key),
        config.summarizer.max_retries,
        StdDuration::from_millis(config.summarizer.retry_base_delay_ms),
    );
    let gate = SummarizationGate::new(summarizer, config.summarizer.body_char_budget);
    let now = Utc::now();

    // ---- Articles ----
    let articles = if args.no_articles {
        info!("Article search skipped");
        CategoryResults::default()
    } else {
        let feeds: Vec<FeedSource> = selected
            .into_iter()
            .map(|s| FeedSource::new(s, &config.articles.default_tag, http.clone()))
            .collect();
        let options = PipelineOptions {
            max_age_days: args.recency.max_age_days(),
            per_source_cap: config.articles.per_source_cap,
            overfetch_factor: config.articles.overfetch_factor,
            unknown_age: config.unknown_age,
            concurrency: config.summarizer.concurrency,
            now,
        };
        pipeline::run(&args.topic, &keywords, &feeds, &options, &gate).await
    };

    // ---- Videos ----
    let videos = if args.no_videos {
        info!("Video search skipped");
        CategoryResults::default()
    } else {
        let youtube = YouTubeSource::new(&config.videos, http.clone());
        let options = PipelineOptions {
            max_age_days: args.recency.max_age_days(),
            per_source_cap: config.videos.per_source_cap,
            overfetch_factor: config.videos.overfetch_factor,
            unknown_age: config.unknown_age,
            concurrency: config.summarizer.concurrency,
            now,
        };
        pipeline::run(&args.topic, &keywords, &[youtube], &options, &gate).await
    };

    let page = ResultsPage {
        topic: args.topic.clone(),
        generated_at: now.to_rfc3339(),
        recency: args.recency.label().to_string(),
        max_age_days: args.recency.max_age_days(),
        articles: articles.records,
        videos: videos.records,
        article_failures: articles.failures,
        video_failures: videos.failures,
    };

    // ---- Output ----
    if let Some(path) = args.json_output.as_deref() {
        if let Err(e) = json::write_results(&page, path).await {
            error!(path = %path.display(), error = %e, "Failed to write JSON");
        }
    }

    let md = markdown::results_to_markdown(&page);
    match args.markdown_output.as_deref() {
        Some(path) => {
            utils::ensure_parent_dir(path).await?;
            tokio::fs::write(path, md).await?;
            info!(path = %path.display(), "Wrote Markdown");
        }
        None => println!("{md}"),
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        articles = page.articles.len(),
        videos = page.videos.len(),
        "Execution complete"
    );
    Ok(())
}

/// Shared HTTP client for feeds, video search and the summarizer.
fn build_http_client(config: &AppConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(&config.user_agent)
        .connect_timeout(StdDuration::from_secs(5))
        .timeout(StdDuration::from_secs(config.http_timeout_secs))
        .build()
}
