//! # media-autopost
//!
//! Scheduled distribution of media artifacts from an object store to
//! several publishing platforms.
//!
//! ## Design Philosophy
//!
//! media-autopost is designed around a few rules:
//! - **No data loss** - An artifact leaves its source location only after
//!   every enabled destination confirmed the post
//! - **Re-runnable** - Archival is the idempotency boundary; running a slot
//!   again never re-posts an archived artifact
//! - **One contract, many protocols** - Single-shot, chunked and container
//!   uploads all sit behind [`PublishAdapter`]
//! - **Explicit configuration** - One immutable [`Config`] is built at startup
//!   and passed down; lower layers never read the environment
//!
//! ## Quick Start
//!
//! ```no_run
//! use media_autopost::{AdapterRegistry, Config, Orchestrator, RunContext, S3ObjectStore};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(Config::from_env()?);
//!     let store = Arc::new(S3ObjectStore::from_config(&config.storage));
//!     let cancel = CancellationToken::new();
//!
//!     let adapters = AdapterRegistry::from_config(
//!         &config.platforms,
//!         reqwest::Client::new(),
//!         store.clone(),
//!         cancel.clone(),
//!     );
//!
//!     let orchestrator = Orchestrator::new(config, store, adapters).with_cancellation(cancel);
//!     let summary = orchestrator.run(&RunContext::now()).await?;
//!     println!("{summary}");
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Staging, archival and retention cleanup
pub mod lifecycle;
/// Filename metadata extraction
pub mod metadata;
/// Run summary notifications
pub mod notify;
/// Slot execution and run coordination
pub mod orchestrator;
/// Destination publish protocols
pub mod publish;
/// Fixed-delay retry governor
pub mod retry;
/// Candidate artifact selection
pub mod selector;
/// Object storage access
pub mod storage;
/// Core types
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::{Config, SelectionMode, SlotConfig};
pub use error::{Error, PublishError, Result, StorageError};
pub use notify::{NotificationSink, WebhookSink};
pub use orchestrator::{Orchestrator, RunContext};
pub use publish::{
    AdapterRegistry, ChunkedUploader, ContainerPublisher, PublishAdapter, PublishReceipt,
    PublishRequest, SingleShotUploader,
};
pub use storage::{MemoryObjectStore, ObjectStore, S3ObjectStore};
pub use types::{
    Artifact, ArtifactKind, CleanupReport, Destination, Metadata, PublishAttempt, RunSummary,
    SlotOutcome, SlotStatus, Verdict,
};

use tokio_util::sync::CancellationToken;

/// Cancel `token` when a termination signal arrives.
///
/// Spawns a background task; the returned handle can be aborted once the run
/// has finished. Cancellation stops new slots and new publish attempts from
/// starting and interrupts container polling; an upload already in flight
/// runs to completion or to its HTTP timeout.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
pub fn cancel_on_signal(token: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let received = wait_for_signal().await;
        tracing::warn!(signal = received, "shutdown requested, finishing current step");
        token.cancel();
    })
}

/// Wait for SIGTERM or SIGINT; falls back to Ctrl+C if neither can be registered
#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{Signal, SignalKind, signal};

    async fn next(signal: &mut Option<Signal>) -> Option<()> {
        match signal {
            Some(signal) => signal.recv().await,
            None => std::future::pending().await,
        }
    }

    let register = |kind: SignalKind, name: &'static str| {
        signal(kind)
            .inspect_err(|e| tracing::warn!(signal = name, error = %e, "could not register signal handler"))
            .ok()
    };
    let mut sigterm = register(SignalKind::terminate(), "SIGTERM");
    let mut sigint = register(SignalKind::interrupt(), "SIGINT");

    if sigterm.is_none() && sigint.is_none() {
        tokio::signal::ctrl_c().await.ok();
        return "ctrl-c";
    }

    tokio::select! {
        Some(()) = next(&mut sigterm) => "SIGTERM",
        Some(()) = next(&mut sigint) => "SIGINT",
        else => "closed",
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
    }
    "ctrl-c"
}
