//! Artifact lifecycle: staging, archival and retention cleanup
//!
//! Archival is the idempotency boundary of a slot: once an artifact has been
//! moved under the archive prefix, the next run no longer sees it as a
//! candidate. The move is copy-then-delete so a crash between the two steps
//! can leave a duplicate but never lose the artifact.

use crate::error::{Error, Result};
use crate::storage::ObjectStore;
use crate::types::CleanupReport;
use crate::utils::file_name;
use chrono::{DateTime, TimeDelta, Utc};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info, warn};

/// Download an artifact into the staging directory
///
/// Any file already present at the target path is removed first so stale
/// content from an earlier run is never published.
///
/// # Returns
///
/// The local path of the staged file.
pub async fn stage(store: &dyn ObjectStore, key: &str, staging_dir: &Path) -> Result<PathBuf> {
    let name = file_name(key);
    if name.is_empty() {
        return Err(Error::Other(format!("object key {key:?} has no file name")));
    }

    fs::create_dir_all(staging_dir).await?;
    let target = staging_dir.join(name);

    if fs::try_exists(&target).await? {
        debug!(?target, "removing stale staged file");
        fs::remove_file(&target).await?;
    }

    store.download(key, &target).await?;
    debug!(key, ?target, "artifact staged");
    Ok(target)
}

/// Remove a staged file, logging rather than failing
pub async fn discard_staged(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => debug!(?path, "removed staged file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(?path, error = %e, "failed to remove staged file"),
    }
}

/// Location an artifact is archived to
///
/// ```
/// use media_autopost::lifecycle::archive_key;
///
/// assert_eq!(archive_key("archived/", "reels/a.mp4"), "archived/reels/a.mp4");
/// ```
pub fn archive_key(archive_prefix: &str, key: &str) -> String {
    format!("{archive_prefix}{key}")
}

/// Move an artifact under the archive prefix
///
/// A failed copy leaves the source untouched. A failed delete after a
/// successful copy leaves a duplicate; both are reported as errors so the
/// caller never treats the slot as fully done.
pub async fn archive(store: &dyn ObjectStore, key: &str, archive_prefix: &str) -> Result<String> {
    let destination = archive_key(archive_prefix, key);

    store.copy(key, &destination).await?;
    debug!(key, destination = %destination, "artifact copied to archive");

    store.delete(key).await.inspect_err(|e| {
        warn!(
            key,
            destination = %destination,
            error = %e,
            "archive copy exists but source could not be deleted"
        );
    })?;

    info!(key, destination = %destination, "artifact archived");
    Ok(destination)
}

/// Delete archived artifacts older than the retention window
///
/// An artifact is deleted when `now - last_modified` strictly exceeds
/// `retention`. Individual delete failures are counted and logged; only a
/// listing failure aborts the sweep.
pub async fn cleanup(
    store: &dyn ObjectStore,
    archive_prefix: &str,
    retention: Duration,
    now: DateTime<Utc>,
) -> Result<CleanupReport> {
    let retention = TimeDelta::from_std(retention)
        .map_err(|e| Error::config(format!("retention window out of range: {e}"), "RETENTION_HOURS"))?;

    let archived = store.list(archive_prefix).await?;
    let mut report = CleanupReport {
        scanned: archived.len(),
        ..CleanupReport::default()
    };

    for artifact in &archived {
        let age = now - artifact.last_modified;
        if age <= retention {
            continue;
        }

        match store.delete(&artifact.key).await {
            Ok(()) => {
                debug!(
                    key = %artifact.key,
                    age_hours = age.num_hours(),
                    "deleted expired archive"
                );
                report.deleted += 1;
            }
            Err(e) => {
                warn!(key = %artifact.key, error = %e, "failed to delete expired archive");
                report.failed += 1;
            }
        }
    }

    info!(
        scanned = report.scanned,
        deleted = report.deleted,
        failed = report.failed,
        "archive cleanup completed"
    );
    Ok(report)
}
