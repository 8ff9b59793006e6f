//! Normalization of source dates into an age in days.
//!
//! Feeds publish machine timestamps (RFC 2822, occasionally RFC 3339 in Atom)
//! while video search publishes human phrases like `"10 months ago"`. Both are
//! reduced to fractional days so a single threshold applies to every source.

use chrono::{DateTime, FixedOffset, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: i64 = 86_400;

/// How a source writes its publish dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateStyle {
    /// `"3 weeks ago"`, `"Streamed 2 days ago"`
    Relative,
    /// `"Tue, 14 Oct 2025 10:00:00 GMT"`
    Absolute,
}

static RELATIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d+)\s+(second|minute|hour|day|week|month|year)s?\s+ago\b")
        .expect("relative date pattern is valid")
});

/// Age of `raw` in days relative to `now`.
///
/// Callers pass the clock explicitly so one run ages every entry against
/// the same instant.
///
/// Returns `None` for anything that cannot be parsed. A present value is
/// always finite and non-negative; timestamps in the future count as age 0.
pub fn normalize_at(raw: &str, style: DateStyle, now: DateTime<Utc>) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let days = match style {
        DateStyle::Absolute => absolute_age(raw, now)?,
        DateStyle::Relative => relative_age(raw)?,
    };
    if days.is_finite() {
        Some(days.max(0.0))
    } else {
        None
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
}

fn absolute_age(raw: &str, now: DateTime<Utc>) -> Option<f64> {
    let published = parse_timestamp(raw)?;
    let now_local = now.with_timezone(published.offset());
    let elapsed = (now_local - published).num_seconds();
    Some(elapsed.div_euclid(SECONDS_PER_DAY) as f64)
}

fn relative_age(raw: &str) -> Option<f64> {
    let caps = RELATIVE_RE.captures(raw)?;
    let count: f64 = caps[1].parse::<u64>().ok()? as f64;
    let multiplier = match caps[2].to_ascii_lowercase().as_str() {
        "second" => 1.0 / 86_400.0,
        "minute" => 1.0 / 1_440.0,
        "hour" => 1.0 / 24.0,
        "day" => 1.0,
        "week" => 7.0,
        "month" => 30.0,
        "year" => 365.0,
        _ => return None,
    };
    Some(count * multiplier)
}

/// Short date label for display.
///
/// Absolute timestamps are cut to the day part (`"Tue, 14 Oct 2025"`);
/// relative phrases are shown as-is.
pub fn display_date(raw: &str) -> String {
    let raw = raw.trim();
    if DateTime::parse_from_rfc2822(raw).is_ok() {
        raw.chars().take(16).collect::<String>().trim_end().to_string()
    } else if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        dt.format("%a, %d %b %Y").to_string()
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 17, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_absolute_whole_days() {
        for k in [0i64, 1, 2, 10, 40, 400] {
            let d = (now() - Duration::days(k)).to_rfc2822();
            assert_eq!(normalize_at(&d, DateStyle::Absolute, now()), Some(k as f64), "{d}");
        }
    }

    #[test]
    fn test_absolute_floors_partial_days() {
        let d = (now() - Duration::hours(47)).to_rfc2822();
        assert_eq!(normalize_at(&d, DateStyle::Absolute, now()), Some(1.0));
    }

    #[test]
    fn test_absolute_respects_offset() {
        // 12:00 UTC is 08:00 at -04:00; two days earlier at the same wall time
        let d = "Wed, 15 Oct 2025 08:00:00 -0400";
        assert_eq!(normalize_at(d, DateStyle::Absolute, now()), Some(2.0));
        let gmt = "Wed, 15 Oct 2025 12:00:00 GMT";
        assert_eq!(normalize_at(gmt, DateStyle::Absolute, now()), Some(2.0));
    }

    #[test]
    fn test_absolute_accepts_rfc3339() {
        let d = "2025-10-07T12:00:00+00:00";
        assert_eq!(normalize_at(d, DateStyle::Absolute, now()), Some(10.0));
    }

    #[test]
    fn test_absolute_future_clamps_to_zero() {
        let d = (now() + Duration::days(3)).to_rfc2822();
        assert_eq!(normalize_at(&d, DateStyle::Absolute, now()), Some(0.0));
    }

    #[test]
    fn test_absolute_malformed_is_unknown() {
        for d in ["", "   ", "yesterday", "14/10/2025", "Tue, 99 Oct 2025"] {
            assert_eq!(normalize_at(d, DateStyle::Absolute, now()), None, "{d:?}");
        }
    }

    #[test]
    fn test_relative_units() {
        let cases = [
            ("30 seconds ago", 30.0 / 86_400.0),
            ("1 minute ago", 1.0 / 1_440.0),
            ("5 hours ago", 5.0 / 24.0),
            ("1 day ago", 1.0),
            ("3 weeks ago", 21.0),
            ("5 months ago", 150.0),
            ("10 months ago", 300.0),
            ("2 years ago", 730.0),
        ];
        for (s, expected) in cases {
            let got = normalize_at(s, DateStyle::Relative, now()).unwrap();
            assert!((got - expected).abs() < 1e-9, "{s}: {got} != {expected}");
        }
    }

    #[test]
    fn test_relative_case_and_prefix() {
        assert_eq!(normalize_at("3 Weeks Ago", DateStyle::Relative, now()), Some(21.0));
        assert_eq!(normalize_at("Streamed 2 days ago", DateStyle::Relative, now()), Some(2.0));
        assert_eq!(normalize_at("1 weeks ago", DateStyle::Relative, now()), Some(7.0));
    }

    #[test]
    fn test_relative_non_matching_is_unknown() {
        for s in [
            "",
            "a month ago",
            "3 fortnights ago",
            "3 weeks",
            "in 3 weeks",
            "Tue, 14 Oct 2025 10:00:00 GMT",
        ] {
            assert_eq!(normalize_at(s, DateStyle::Relative, now()), None, "{s:?}");
        }
    }

    #[test]
    fn test_display_date() {
        assert_eq!(display_date("Tue, 14 Oct 2025 10:00:00 GMT"), "Tue, 14 Oct 2025");
        assert_eq!(display_date("2025-10-14T10:00:00Z"), "Tue, 14 Oct 2025");
        assert_eq!(display_date("3 weeks ago"), "3 weeks ago");
    }
}
