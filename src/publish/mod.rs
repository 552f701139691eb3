//! Destination publish protocols
//!
//! Each destination speaks a different protocol, but the slot runner only
//! sees the [`PublishAdapter`] trait:
//!
//! - [`SingleShotUploader`]: one multipart POST (YouTube)
//! - [`ChunkedUploader`]: start / transfer loop / finish (Facebook Page)
//! - [`ContainerPublisher`]: create / poll / publish (Instagram)
//!
//! [`AdapterRegistry`] builds one adapter per destination whose credentials
//! are configured. A destination without an adapter is disabled for the run.

mod chunked;
mod container;
mod single_shot;

pub use chunked::ChunkedUploader;
pub use container::ContainerPublisher;
pub use single_shot::SingleShotUploader;

use crate::config::PlatformConfig;
use crate::error::{PublishError, Result};
use crate::storage::ObjectStore;
use crate::types::{ArtifactKind, Destination, Metadata};
use crate::utils::body_excerpt;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Everything an adapter needs to publish one artifact
#[derive(Clone, Copy, Debug)]
pub struct PublishRequest<'a> {
    /// Object key in the source store
    pub key: &'a str,
    /// Staged local copy of the artifact
    pub local_path: &'a Path,
    /// Short-form or standard
    pub kind: ArtifactKind,
    /// Title, caption and date
    pub metadata: &'a Metadata,
}

/// Confirmation returned by a destination
#[must_use]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PublishReceipt {
    /// Platform-assigned id of the published media, when reported
    pub remote_id: Option<String>,
}

/// A destination publish protocol
///
/// `Ok` means the destination confirmed the post. Any `Err` is a failed
/// attempt; the retry governor decides whether to call again. Adapters hold no
/// per-call state, so every call starts the protocol from its first phase.
#[async_trait]
pub trait PublishAdapter: Send + Sync {
    /// The destination this adapter publishes to
    fn destination(&self) -> Destination;

    /// Run the full protocol once
    async fn publish(&self, request: &PublishRequest<'_>) -> Result<PublishReceipt>;
}

/// Adapters available for a run, keyed by destination
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: BTreeMap<Destination, Arc<dyn PublishAdapter>>,
}

impl AdapterRegistry {
    /// Empty registry; every destination is disabled
    pub fn new() -> Self {
        Self::default()
    }

    /// Build adapters for every destination with complete credentials
    pub fn from_config(
        platforms: &PlatformConfig,
        client: reqwest::Client,
        store: Arc<dyn ObjectStore>,
        cancel: CancellationToken,
    ) -> Self {
        let mut registry = Self::new();

        if let Some(youtube) = &platforms.youtube {
            registry.register(Arc::new(SingleShotUploader::new(youtube.clone(), client.clone())));
        }
        if let Some(facebook) = &platforms.facebook {
            registry.register(Arc::new(ChunkedUploader::new(facebook.clone(), client.clone())));
        }
        if let Some(instagram) = &platforms.instagram {
            registry.register(Arc::new(ContainerPublisher::new(
                instagram.clone(),
                client,
                store,
                cancel,
            )));
        }

        for destination in Destination::ALL {
            if platforms.is_enabled(destination) {
                tracing::info!(destination = %destination, "platform ENABLED");
            } else {
                tracing::warn!(destination = %destination, "platform DISABLED (missing credentials)");
            }
        }

        registry
    }

    /// Add or replace the adapter for its destination
    pub fn register(&mut self, adapter: Arc<dyn PublishAdapter>) {
        self.adapters.insert(adapter.destination(), adapter);
    }

    /// Adapter for a destination, if enabled
    pub fn get(&self, destination: Destination) -> Option<&Arc<dyn PublishAdapter>> {
        self.adapters.get(&destination)
    }

    /// Whether a destination has an adapter
    pub fn is_enabled(&self, destination: Destination) -> bool {
        self.adapters.contains_key(&destination)
    }

    /// Enabled destinations in canonical order
    pub fn enabled(&self) -> Vec<Destination> {
        self.adapters.keys().copied().collect()
    }
}

/// Fail the phase unless the response status is 200
pub(crate) async fn require_ok(phase: &'static str, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status == reqwest::StatusCode::OK {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(PublishError::UnexpectedStatus {
        phase,
        status: status.as_u16(),
        body: body_excerpt(&body),
    }
    .into())
}

/// Require status 200 and parse the body as JSON
pub(crate) async fn ok_json(phase: &'static str, response: reqwest::Response) -> Result<serde_json::Value> {
    let response = require_ok(phase, response).await?;
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| {
        PublishError::MalformedResponse {
            phase,
            reason: format!("invalid JSON ({e}): {}", body_excerpt(&text)),
        }
        .into()
    })
}

/// Read a required string field from a JSON body
pub(crate) fn string_field(phase: &'static str, body: &serde_json::Value, field: &str) -> Result<String> {
    match body.get(field) {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(serde_json::Value::Number(n)) => Ok(n.to_string()),
        _ => Err(PublishError::MalformedResponse {
            phase,
            reason: format!("missing `{field}`"),
        }
        .into()),
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
