use super::test_helpers::*;
use super::*;
use crate::storage::MemoryObjectStore;
use crate::types::{Destination, SlotStatus, Verdict};
use chrono::{DateTime, TimeDelta};
use tempfile::TempDir;


fn hours_ago(hours: i64) -> DateTime<Utc> {
    test_context().now - TimeDelta::hours(hours)
}
