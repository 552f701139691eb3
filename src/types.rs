//! Core types for media-autopost

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of artifact a slot publishes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Short-form vertical clip (reels, shorts)
    Short,
    /// Standard long-form video
    Standard,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Short => write!(f, "short"),
            ArtifactKind::Standard => write!(f, "standard"),
        }
    }
}

/// External publishing platform
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    /// Video host, single-shot multipart upload
    YouTube,
    /// Social feed page, resumable chunked upload
    Facebook,
    /// Short-form surface, asynchronous container publish
    Instagram,
}

impl Destination {
    /// All destinations in their canonical order
    pub const ALL: [Destination; 3] = [
        Destination::YouTube,
        Destination::Facebook,
        Destination::Instagram,
    ];

    /// Lowercase name used in logs and summaries
    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::YouTube => "youtube",
            Destination::Facebook => "facebook",
            Destination::Instagram => "instagram",
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A media object in the source store
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Full object key (location in the store)
    pub key: String,
    /// Last modification time reported by the store
    pub last_modified: DateTime<Utc>,
    /// Object size in bytes, when the store reports it
    pub size: Option<u64>,
}

impl Artifact {
    /// Create an artifact descriptor without a known size
    pub fn new(key: impl Into<String>, last_modified: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            last_modified,
            size: None,
        }
    }
}

/// Publishing metadata derived from an artifact key
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Video title
    pub title: String,
    /// Caption/description, `"<title> | <date>"`
    pub caption: String,
    /// `YYYY-MM-DD` date string
    pub date: String,
}

/// Result of one destination after retries
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// The destination confirmed the post
    Success,
    /// Every attempt failed
    Failure,
}

/// What happened at one destination during a slot run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishAttempt {
    /// The destination that was attempted
    pub destination: Destination,
    /// Final verdict after retries
    pub verdict: Verdict,
    /// Number of attempts made (at least 1)
    pub attempts: u32,
    /// Remote id on success, last error text on failure
    pub detail: Option<String>,
}

impl PublishAttempt {
    /// Whether the destination confirmed the post
    pub fn succeeded(&self) -> bool {
        self.verdict == Verdict::Success
    }
}

/// Terminal state of a slot run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotStatus {
    /// Every attempted destination succeeded (and archival, when enabled, succeeded)
    Success,
    /// At least one destination, the download, or archival failed
    Failed,
    /// Nothing to publish, or nowhere to publish it
    Skipped,
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotStatus::Success => write!(f, "SUCCESS"),
            SlotStatus::Failed => write!(f, "FAILED"),
            SlotStatus::Skipped => write!(f, "SKIPPED"),
        }
    }
}

/// Outcome of one executed slot
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotOutcome {
    /// Slot name
    pub slot: String,
    /// Selected artifact key, if any
    pub artifact: Option<String>,
    /// Per-destination results in attempt order
    pub attempts: Vec<PublishAttempt>,
    /// Terminal state
    pub status: SlotStatus,
    /// Whether the artifact was archived and removed from the source location
    pub archived: bool,
    /// Human-readable explanation for non-success states
    pub note: Option<String>,
}

impl SlotOutcome {
    /// Outcome for a slot that never reached the publish phase
    pub fn skipped(slot: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            slot: slot.into(),
            artifact: None,
            attempts: Vec::new(),
            status: SlotStatus::Skipped,
            archived: false,
            note: Some(note.into()),
        }
    }

    /// Outcome for a slot that failed before or without publishing
    pub fn failed(slot: impl Into<String>, artifact: Option<String>, note: impl Into<String>) -> Self {
        Self {
            slot: slot.into(),
            artifact,
            attempts: Vec::new(),
            status: SlotStatus::Failed,
            archived: false,
            note: Some(note.into()),
        }
    }
}

/// Result of the archive retention pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    /// Archived objects examined
    pub scanned: usize,
    /// Objects deleted for exceeding the retention window
    pub deleted: usize,
    /// Deletions that failed
    pub failed: usize,
}

/// Aggregated result of one invocation, handed to the notification sinks
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// The run's "today"
    pub date: NaiveDate,
    /// One outcome per executed slot, in slot declaration order
    pub outcomes: Vec<SlotOutcome>,
    /// Cleanup result, when cleanup ran
    pub cleanup: Option<CleanupReport>,
}

impl RunSummary {
    /// Number of outcomes with the given status
    pub fn count(&self, status: SlotStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    /// Outcome for a slot by name
    pub fn outcome(&self, slot: &str) -> Option<&SlotOutcome> {
        self.outcomes.iter().find(|o| o.slot == slot)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "RUN SUMMARY {} ({} success, {} failed, {} skipped)",
            self.date,
            self.count(SlotStatus::Success),
            self.count(SlotStatus::Failed),
            self.count(SlotStatus::Skipped),
        )?;

        for outcome in &self.outcomes {
            write!(f, "- {}: {}", outcome.slot, outcome.status)?;
            if let Some(key) = &outcome.artifact {
                write!(f, " | {key}")?;
            }
            if !outcome.attempts.is_empty() {
                let parts: Vec<String> = outcome
                    .attempts
                    .iter()
                    .map(|a| {
                        let verdict = if a.succeeded() { "ok" } else { "failed" };
                        format!("{}={}({})", a.destination, verdict, a.attempts)
                    })
                    .collect();
                write!(f, " | {}", parts.join(" "))?;
            }
            if outcome.archived {
                write!(f, " | archived")?;
            }
            if let Some(note) = &outcome.note {
                write!(f, " | {note}")?;
            }
            writeln!(f)?;
        }

        if let Some(cleanup) = &self.cleanup {
            writeln!(
                f,
                "cleanup: scanned {}, deleted {}, failed {}",
                cleanup.scanned, cleanup.deleted, cleanup.failed
            )?;
        }

        Ok(())
    }
}
