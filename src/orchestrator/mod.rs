//! Distribution orchestration engine
//!
//! The `Orchestrator` struct and its methods are organized by concern:
//! - [`slot_runner`] - Select, stage, publish and archive one slot
//! - [`coordinator`] - Run every selected slot, clean up, notify
//!
//! Control flow for one invocation:
//!
//! ```text
//! run -> for each slot: select -> stage -> extract -> publish (retry) -> archive
//!     -> cleanup -> summary -> notification sinks
//! ```

mod coordinator;
mod slot_runner;

use crate::config::Config;
use crate::notify::NotificationSink;
use crate::publish::AdapterRegistry;
use crate::storage::ObjectStore;
use chrono::{DateTime, Local, NaiveDate, Utc};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Clock readings fixed for the duration of one run
///
/// Every slot in a run sees the same "today", so selection and metadata
/// fallbacks stay consistent even if the run crosses midnight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunContext {
    /// Local calendar date used for selection and metadata fallback
    pub today: NaiveDate,
    /// Instant used for retention decisions
    pub now: DateTime<Utc>,
}

impl RunContext {
    /// Read the system clock
    pub fn now() -> Self {
        Self {
            today: Local::now().date_naive(),
            now: Utc::now(),
        }
    }

    /// Fixed clock readings, for tests and replays
    pub fn at(today: NaiveDate, now: DateTime<Utc>) -> Self {
        Self { today, now }
    }
}

/// Main orchestrator instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct Orchestrator {
    /// Immutable run configuration
    pub(crate) config: Arc<Config>,
    /// Source-of-truth object store
    pub(crate) store: Arc<dyn ObjectStore>,
    /// Publish adapters for enabled destinations
    pub(crate) adapters: AdapterRegistry,
    /// Summary sinks
    pub(crate) sinks: Vec<Arc<dyn NotificationSink>>,
    /// Cancelled on shutdown signal; no new slot or attempt starts afterwards
    pub(crate) cancel: CancellationToken,
}

impl Orchestrator {
    /// Create an orchestrator with no notification sinks
    pub fn new(config: Arc<Config>, store: Arc<dyn ObjectStore>, adapters: AdapterRegistry) -> Self {
        Self {
            config,
            store,
            adapters,
            sinks: Vec::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Attach notification sinks
    pub fn with_sinks(mut self, sinks: Vec<Arc<dyn NotificationSink>>) -> Self {
        self.sinks = sinks;
        self
    }

    /// Use an externally owned cancellation token
    ///
    /// Adapters that poll (the container publisher) should be built with the
    /// same token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops the run when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// The configuration this orchestrator runs with
    pub fn config(&self) -> &Config {
        &self.config
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
