//! Markdown rendering of a results page.
//!
//! The page has two sections, Articles then Videos. Each record shows its
//! title, date label, source, link, optional thumbnail and the summary.
//! Sources that could not be fetched are listed at the top of their section,
//! and an empty section gets an explanatory line instead of silence.

use crate::age::display_date;
use crate::models::{DisplayRecord, ResultsPage, SourceFailure};
use std::fmt::Write;

/// Render the full page.
pub fn results_to_markdown(page: &ResultsPage) -> String {
    let mut md = String::new();
    let _ = writeln!(md, "# Recommendations for \"{}\"\n", page.topic);
    let _ = writeln!(
        md,
        "_Generated {} · {}_\n",
        page.generated_at, page.recency
    );

    write_section(
        &mut md,
        page,
        Section {
            heading: "Articles",
            noun: "articles",
            records: &page.articles,
            failures: &page.article_failures,
            link_text: "Read here",
        },
    );
    write_section(
        &mut md,
        page,
        Section {
            heading: "Videos",
            noun: "videos",
            records: &page.videos,
            failures: &page.video_failures,
            link_text: "Watch here",
        },
    );
    md
}

struct Section<'a> {
    heading: &'a str,
    noun: &'a str,
    records: &'a [DisplayRecord],
    failures: &'a [SourceFailure],
    link_text: &'a str,
}

fn write_section(md: &mut String, page: &ResultsPage, section: Section<'_>) {
    let _ = writeln!(md, "## {}\n", section.heading);
    for failure in section.failures {
        let _ = writeln!(md, "_{} unavailable: {}_\n", failure.source_label, failure.error);
    }
    if section.records.is_empty() {
        if !section.failures.is_empty() {
            return;
        }
        let window = if page.max_age_days.is_some() {
            " in the selected time range"
        } else {
            ""
        };
        let _ = writeln!(
            md,
            "_No {} found for \"{}\"{window}._\n",
            section.noun, page.topic
        );
        return;
    }
    for record in section.records {
        write_record(md, record, section.link_text);
    }
}

fn write_record(md: &mut String, record: &DisplayRecord, link_text: &str) {
    let _ = writeln!(md, "**{}**\n", record.title);

    let mut meta = Vec::new();
    if let Some(raw) = record.raw_date.as_deref() {
        meta.push(format!("*{}*", display_date(raw)));
    }
    meta.push(format!("`{}`", record.source_label));
    if let Some(verdict) = record.verdict {
        meta.push(format!("**{}**", verdict.as_str()));
    }
    if !record.link.is_empty() {
        meta.push(format!("[{link_text}]({})", record.link));
    }
    let _ = writeln!(md, "{}\n", meta.join(" | "));

    if let Some(thumb) = record.thumbnail_url.as_deref() {
        let _ = writeln!(md, "![thumbnail]({thumb})\n");
    }
    let _ = writeln!(md, "{}\n", record.summary.trim());
    let _ = writeln!(md, "---\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Verdict;

    fn record(title: &str, date: Option<&str>, link: &str, thumb: Option<&str>) -> DisplayRecord {
        DisplayRecord {
            title: title.to_string(),
            link: link.to_string(),
            raw_date: date.map(str::to_string),
            age_days: None,
            thumbnail_url: thumb.map(str::to_string),
            source_label: "Medium".to_string(),
            summary: "Covers the basics.\nRECOMMENDED".to_string(),
            verdict: Some(Verdict::Recommended),
            failed: false,
        }
    }

    fn page(articles: Vec<DisplayRecord>, videos: Vec<DisplayRecord>) -> ResultsPage {
        ResultsPage {
            topic: "Rust async".to_string(),
            generated_at: "2025-10-17T12:00:00+00:00".to_string(),
            recency: "Past month".to_string(),
            max_age_days: Some(30.0),
            articles,
            videos,
            article_failures: vec![],
            video_failures: vec![],
        }
    }

    #[test]
    fn test_markdown_sections_in_order() {
        let md = results_to_markdown(&page(
            vec![record(
                "Async Rust",
                Some("Tue, 14 Oct 2025 10:00:00 GMT"),
                "https://medium.com/a",
                None,
            )],
            vec![record(
                "Tokio in 10 minutes",
                Some("3 weeks ago"),
                "https://www.youtube.com/watch?v=x",
                Some("https://i.ytimg.com/vi/x/hq.jpg"),
            )],
        ));

        let articles_at = md.find("## Articles").unwrap();
        let videos_at = md.find("## Videos").unwrap();
        assert!(articles_at < videos_at);
        assert!(md.contains(
            "*Tue, 14 Oct 2025* | `Medium` | **RECOMMENDED** | [Read here](https://medium.com/a)"
        ));
        assert!(md.contains(
            "*3 weeks ago* | `Medium` | **RECOMMENDED** | [Watch here](https://www.youtube.com/watch?v=x)"
        ));
        assert!(md.contains("![thumbnail](https://i.ytimg.com/vi/x/hq.jpg)"));
        assert!(md.contains("Covers the basics.\nRECOMMENDED"));
    }

    #[test]
    fn test_markdown_empty_state() {
        let md = results_to_markdown(&page(vec![], vec![]));
        assert!(md.contains("_No articles found for \"Rust async\" in the selected time range._"));
        assert!(md.contains("_No videos found for \"Rust async\" in the selected time range._"));
    }

    #[test]
    fn test_markdown_empty_state_without_window() {
        let mut any_time = page(vec![], vec![]);
        any_time.max_age_days = None;
        let md = results_to_markdown(&any_time);
        assert!(md.contains("_No articles found for \"Rust async\"._"));
        assert!(!md.contains("time range"));
    }

    #[test]
    fn test_markdown_lists_failed_sources() {
        let mut failing = page(
            vec![],
            vec![record("Tokio", None, "https://www.youtube.com/watch?v=x", None)],
        );
        failing.article_failures = vec![SourceFailure {
            source_label: "Medium".to_string(),
            error: "https://medium.com/feed/tag/rust returned HTTP 503".to_string(),
        }];
        failing.video_failures = vec![SourceFailure {
            source_label: "Vimeo".to_string(),
            error: "request failed: timed out".to_string(),
        }];
        let md = results_to_markdown(&failing);

        assert!(md.contains("_Medium unavailable: https://medium.com/feed/tag/rust returned HTTP 503_"));
        assert!(!md.contains("No articles found"));
        assert!(md.contains("_Vimeo unavailable: request failed: timed out_"));
        assert!(md.contains("**Tokio**"));
    }

    #[test]
    fn test_markdown_omits_missing_link_and_date() {
        let mut untitled = record("Untitled", None, "", None);
        untitled.summary = "Error: request failed".to_string();
        untitled.verdict = None;
        untitled.failed = true;
        let md = results_to_markdown(&page(vec![untitled], vec![]));
        assert!(md.contains("**Untitled**\n\n`Medium`\n"));
        assert!(md.contains("Error: request failed"));
        assert!(!md.contains("Read here"));
    }
}
