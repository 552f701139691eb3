//! Filename → publishing metadata
//!
//! Upstream ingestion names artifacts `<YYYY-MM-DD> - <title>.<ext>`. The date
//! and title are read back from that name; names that do not follow the
//! convention fall back to today's date and the bare file stem.

use crate::types::Metadata;
use crate::utils::{file_name, file_stem};
use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

#[allow(clippy::expect_used)]
fn dated_name() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{4}-\d{2}-\d{2})\s*-\s*(.*\S)\s*$").expect("static pattern compiles")
    })
}

/// Derive title, caption and date from an object key
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use media_autopost::metadata::extract;
///
/// let today = NaiveDate::from_ymd_opt(2025, 6, 3).unwrap();
///
/// let meta = extract("reels/2025-06-01 - My Title.mp4", today);
/// assert_eq!(meta.date, "2025-06-01");
/// assert_eq!(meta.title, "My Title");
/// assert_eq!(meta.caption, "My Title | 2025-06-01");
///
/// let meta = extract("noconvention.mp4", today);
/// assert_eq!(meta.date, "2025-06-03");
/// assert_eq!(meta.title, "noconvention");
/// ```
pub fn extract(key: &str, today: NaiveDate) -> Metadata {
    let stem = file_stem(file_name(key));

    let (title, date) = match parse_dated(stem) {
        Some((date, title)) => (title.to_string(), date.to_string()),
        None => (stem.trim().to_string(), today.format("%Y-%m-%d").to_string()),
    };

    Metadata {
        caption: format!("{title} | {date}"),
        title,
        date,
    }
}

fn parse_dated(stem: &str) -> Option<(&str, &str)> {
    let captures = dated_name().captures(stem)?;
    let date = captures.get(1)?.as_str();
    let title = captures.get(2)?.as_str();

    // Reject tokens that only look like dates (e.g. 2025-13-45)
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    Some((date, title))
}
