//! Run coordination: slot iteration, cleanup and summary delivery

use super::{Orchestrator, RunContext};
use crate::error::Result;
use crate::lifecycle;
use crate::types::{CleanupReport, RunSummary, SlotStatus};
use tracing::{info, warn};

impl Orchestrator {
    /// Execute one scheduled invocation
    ///
    /// Runs every selected slot in declaration order, then the archive
    /// retention sweep, then hands the summary to every notification sink.
    ///
    /// # Errors
    ///
    /// Only configuration problems (invalid configuration, unknown slot
    /// filter) are returned, and always before any slot runs. Slot, cleanup
    /// and notification failures are recorded or logged instead.
    pub async fn run(&self, ctx: &RunContext) -> Result<RunSummary> {
        self.config.validate()?;
        let slots = self.config.selected_slots()?;

        info!(
            store = self.store.name(),
            destinations = ?self.adapters.enabled(),
            "run starting"
        );
        match &self.config.slot_filter {
            Some(filter) => info!(slot_filter = %filter, "slot filter active"),
            None => info!(slots = slots.len(), "processing all slots"),
        }

        let mut outcomes = Vec::with_capacity(slots.len());
        for (idx, slot) in slots.iter().enumerate() {
            if self.cancel.is_cancelled() {
                warn!(remaining = slots.len() - idx, "run cancelled, remaining slots not started");
                break;
            }
            outcomes.push(self.run_slot(slot, ctx).await);
        }

        let cleanup = self.run_cleanup(ctx).await;

        let summary = RunSummary {
            date: ctx.today,
            outcomes,
            cleanup,
        };
        info!(
            success = summary.count(SlotStatus::Success),
            failed = summary.count(SlotStatus::Failed),
            skipped = summary.count(SlotStatus::Skipped),
            "run finished"
        );
        for line in summary.to_string().lines() {
            info!("{line}");
        }

        self.notify(&summary).await;
        Ok(summary)
    }

    async fn run_cleanup(&self, ctx: &RunContext) -> Option<CleanupReport> {
        let lifecycle = &self.config.lifecycle;
        if !lifecycle.cleanup_enabled {
            info!("archive cleanup disabled");
            return None;
        }
        if self.cancel.is_cancelled() {
            warn!("run cancelled, archive cleanup skipped");
            return None;
        }

        match lifecycle::cleanup(
            self.store.as_ref(),
            &lifecycle.archive_prefix,
            lifecycle.retention,
            ctx.now,
        )
        .await
        {
            Ok(report) => Some(report),
            Err(e) => {
                warn!(error = %e, "archive cleanup failed");
                None
            }
        }
    }

    /// Send the summary to every sink; failures are logged only
    async fn notify(&self, summary: &RunSummary) {
        if self.sinks.is_empty() {
            return;
        }

        let text = summary.to_string();
        for sink in &self.sinks {
            match sink.send(&text).await {
                Ok(()) => info!(sink = %sink.describe(), "summary sent"),
                Err(e) => warn!(sink = %sink.describe(), error = %e, "failed to send summary"),
            }
        }
    }
}
