//! Candidate artifact selection
//!
//! Picks at most one artifact per slot run. The choice is a pure function of
//! the candidate set and the date, independent of listing order.

use crate::config::SelectionMode;
use crate::types::Artifact;
use crate::utils::has_extension;
use chrono::NaiveDate;
use std::cmp::Ordering;

/// Selection parameters shared by every slot in a run
#[derive(Clone, Copy, Debug)]
pub struct SelectionCriteria<'a> {
    /// The run's date; its `YYYY-MM-DD` form is the date token
    pub today: NaiveDate,
    /// Strict-date or latest
    pub mode: SelectionMode,
    /// Media extension candidates must carry
    pub media_extension: &'a str,
    /// Keys under this prefix are never candidates
    pub archive_prefix: &'a str,
}

/// Choose the artifact a slot should publish
///
/// - Non-media keys and archived keys are ignored.
/// - Same-day artifacts (key containing today's `YYYY-MM-DD`) win; among
///   several, the lexicographically greatest key.
/// - Without a same-day artifact, [`SelectionMode::StrictDate`] selects nothing
///   while [`SelectionMode::Latest`] falls back to the most recently modified
///   candidate (greatest key on equal timestamps).
pub fn select<'c>(candidates: &'c [Artifact], criteria: &SelectionCriteria<'_>) -> Option<&'c Artifact> {
    let token = criteria.today.format("%Y-%m-%d").to_string();

    let eligible = candidates.iter().filter(|a| {
        has_extension(&a.key, criteria.media_extension)
            && !a.key.starts_with(criteria.archive_prefix)
    });

    let mut same_day: Option<&Artifact> = None;
    let mut newest: Option<&Artifact> = None;

    for artifact in eligible {
        if artifact.key.contains(&token) {
            same_day = match same_day {
                Some(best) if best.key >= artifact.key => Some(best),
                _ => Some(artifact),
            };
        }
        newest = match newest {
            Some(best) if compare_recency(best, artifact) != Ordering::Less => Some(best),
            _ => Some(artifact),
        };
    }

    match (same_day, criteria.mode) {
        (Some(found), _) => Some(found),
        (None, SelectionMode::StrictDate) => None,
        (None, SelectionMode::Latest) => newest,
    }
}

fn compare_recency(a: &Artifact, b: &Artifact) -> Ordering {
    a.last_modified
        .cmp(&b.last_modified)
        .then_with(|| a.key.cmp(&b.key))
}
