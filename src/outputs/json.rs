//! JSON output of a results page.
//!
//! The document is the serialized [`ResultsPage`]: topic, generation time,
//! recency window, and the article and video records in display order.

use crate::models::ResultsPage;
use crate::utils::ensure_parent_dir;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write a [`ResultsPage`] as pretty-printed JSON, creating parent
/// directories as needed.
///
/// # Errors
///
/// Returns an error if serialization, directory creation or the write fails.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_results(page: &ResultsPage, path: &Path) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(page)?;

    if let Err(e) = ensure_parent_dir(path).await {
        error!(error = %e, "Failed to create JSON dir");
        return Err(e);
    }

    fs::write(path, json).await?;
    info!(
        articles = page.articles.len(),
        videos = page.videos.len(),
        "Wrote JSON results"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DisplayRecord, SourceFailure, Verdict};

    fn page() -> ResultsPage {
        ResultsPage {
            topic: "Rust".to_string(),
            generated_at: "2025-10-17T12:00:00+00:00".to_string(),
            recency: "Any time".to_string(),
            max_age_days: None,
            articles: vec![DisplayRecord {
                title: "Async Rust".to_string(),
                link: "https://medium.com/a".to_string(),
                raw_date: Some("Tue, 14 Oct 2025 10:00:00 GMT".to_string()),
                age_days: Some(3.0),
                thumbnail_url: None,
                source_label: "Medium".to_string(),
                summary: "Good.\nSKIP".to_string(),
                verdict: Some(Verdict::Skip),
                failed: false,
            }],
            videos: vec![],
            article_failures: vec![],
            video_failures: vec![SourceFailure {
                source_label: "YouTube".to_string(),
                error: "could not parse response: no ytInitialData".to_string(),
            }],
        }
    }

    #[tokio::test]
    async fn test_write_results_round_trip() {
        let dir = std::env::temp_dir().join(format!("topic_digest_json_{}", std::process::id()));
        let path = dir.join("out/results.json");
        write_results(&page(), &path).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let back: ResultsPage = serde_json::from_str(&text).unwrap();
        assert_eq!(back.topic, "Rust");
        assert_eq!(back.articles[0].verdict, Some(Verdict::Skip));
        assert!(text.contains("\"verdict\": \"SKIP\""));
        assert_eq!(back.video_failures[0].source_label, "YouTube");
        let _ = std::fs::remove_dir_all(&dir);
    }
}
