//! Per-slot execution

use super::{Orchestrator, RunContext};
use crate::config::SlotConfig;
use crate::lifecycle;
use crate::metadata;
use crate::publish::PublishRequest;
use crate::retry::with_retry;
use crate::selector::{SelectionCriteria, select};
use crate::types::{Destination, PublishAttempt, SlotOutcome, SlotStatus, Verdict};
use tracing::{debug, error, info, warn};

impl Orchestrator {
    /// Run one slot to a terminal state
    ///
    /// `SELECT -> (none -> SKIPPED) | (found -> DOWNLOAD -> EXTRACT -> PUBLISH
    /// each enabled destination -> DECIDE LIFECYCLE)`.
    ///
    /// Never returns an error: every failure ends up in the outcome. The
    /// artifact leaves the source location only when every attempted
    /// destination confirmed and archival succeeded.
    pub async fn run_slot(&self, slot: &SlotConfig, ctx: &RunContext) -> SlotOutcome {
        info!(slot = %slot.name, kind = %slot.kind, prefix = %slot.prefix, "starting slot");

        let candidates = match self.store.list(&slot.prefix).await {
            Ok(candidates) => candidates,
            Err(e) => {
                error!(slot = %slot.name, error = %e, "listing failed");
                return SlotOutcome::failed(&slot.name, None, format!("listing failed: {e}"));
            }
        };

        let criteria = SelectionCriteria {
            today: ctx.today,
            mode: self.config.selection.mode,
            media_extension: &self.config.selection.media_extension,
            archive_prefix: &self.config.lifecycle.archive_prefix,
        };
        let Some(artifact) = select(&candidates, &criteria) else {
            warn!(
                slot = %slot.name,
                prefix = %slot.prefix,
                candidates = candidates.len(),
                "no candidate artifact"
            );
            return SlotOutcome::skipped(&slot.name, format!("no candidate under '{}'", slot.prefix));
        };
        let key = artifact.key.clone();
        info!(slot = %slot.name, key = %key, size = ?artifact.size, "selected artifact");

        let destinations = self.attempted_destinations(slot);
        if destinations.is_empty() {
            warn!(slot = %slot.name, key = %key, "no enabled destination, artifact retained");
            let mut outcome = SlotOutcome::skipped(&slot.name, "no enabled destination");
            outcome.artifact = Some(key);
            return outcome;
        }

        let local_path =
            match lifecycle::stage(self.store.as_ref(), &key, &self.config.lifecycle.staging_dir).await {
                Ok(path) => path,
                Err(e) => {
                    error!(slot = %slot.name, key = %key, error = %e, "download failed");
                    return SlotOutcome::failed(&slot.name, Some(key), format!("download failed: {e}"));
                }
            };

        let meta = metadata::extract(&key, ctx.today);
        debug!(slot = %slot.name, title = %meta.title, date = %meta.date, "metadata extracted");

        let request = PublishRequest {
            key: &key,
            local_path: &local_path,
            kind: slot.kind,
            metadata: &meta,
        };

        let mut attempts = Vec::with_capacity(destinations.len());
        for destination in destinations {
            attempts.push(self.publish_to(destination, &request).await);
        }

        lifecycle::discard_staged(&local_path).await;

        self.decide_lifecycle(slot, key, attempts).await
    }

    /// Slot destinations that have an adapter, in slot order
    fn attempted_destinations(&self, slot: &SlotConfig) -> Vec<Destination> {
        let mut attempted = Vec::with_capacity(slot.destinations.len());
        for &destination in &slot.destinations {
            if self.adapters.is_enabled(destination) {
                attempted.push(destination);
            } else {
                info!(
                    slot = %slot.name,
                    destination = %destination,
                    "destination disabled globally (missing credentials)"
                );
            }
        }
        attempted
    }

    async fn publish_to(&self, destination: Destination, request: &PublishRequest<'_>) -> PublishAttempt {
        let Some(adapter) = self.adapters.get(destination) else {
            return PublishAttempt {
                destination,
                verdict: Verdict::Failure,
                attempts: 0,
                detail: Some("no adapter".to_string()),
            };
        };

        let retried = with_retry(&self.config.retry, &self.cancel, destination.as_str(), || {
            adapter.publish(request)
        })
        .await;

        match retried.result {
            Ok(receipt) => {
                info!(
                    destination = %destination,
                    key = request.key,
                    attempts = retried.attempts,
                    remote_id = ?receipt.remote_id,
                    "published"
                );
                PublishAttempt {
                    destination,
                    verdict: Verdict::Success,
                    attempts: retried.attempts,
                    detail: receipt.remote_id,
                }
            }
            Err(reason) => {
                error!(
                    destination = %destination,
                    key = request.key,
                    attempts = retried.attempts,
                    error = %reason,
                    "publish failed"
                );
                PublishAttempt {
                    destination,
                    verdict: Verdict::Failure,
                    attempts: retried.attempts,
                    detail: Some(reason),
                }
            }
        }
    }

    async fn decide_lifecycle(
        &self,
        slot: &SlotConfig,
        key: String,
        attempts: Vec<PublishAttempt>,
    ) -> SlotOutcome {
        let failed: Vec<&str> = attempts
            .iter()
            .filter(|a| !a.succeeded())
            .map(|a| a.destination.as_str())
            .collect();

        let (status, archived, note) = if !failed.is_empty() {
            warn!(slot = %slot.name, failed = ?failed, "partial failure, artifact retained");
            (
                SlotStatus::Failed,
                false,
                Some(format!("failed: {}; artifact retained", failed.join(", "))),
            )
        } else if !self.config.lifecycle.archive_on_success {
            warn!(slot = %slot.name, "archival disabled, artifact retained at source");
            (
                SlotStatus::Success,
                false,
                Some("archival disabled; artifact retained".to_string()),
            )
        } else {
            match lifecycle::archive(self.store.as_ref(), &key, &self.config.lifecycle.archive_prefix).await {
                Ok(_) => (SlotStatus::Success, true, None),
                Err(e) => {
                    error!(slot = %slot.name, key = %key, error = %e, "archival failed");
                    (SlotStatus::Failed, false, Some(format!("archive failed: {e}")))
                }
            }
        };

        info!(slot = %slot.name, status = %status, archived, "slot finished");
        SlotOutcome {
            slot: slot.name.clone(),
            artifact: Some(key),
            attempts,
            status,
            archived,
            note,
        }
    }
}
