//! Asynchronous container publish
//!
//! The platform fetches the video itself from a presigned share URL:
//!
//! ```text
//! CREATING -> POLLING -> FINISHED -> PUBLISHING -> DONE
//!                     \-> ERROR
//!                     \-> TIMEOUT
//! ```
//!
//! Short-form and standard artifacts differ only in the `media_type` sent at
//! create time and in the poll cadence.

use super::{PublishAdapter, PublishReceipt, PublishRequest, ok_json, string_field};
use crate::config::{InstagramConfig, PollConfig};
use crate::error::{PublishError, Result};
use crate::storage::ObjectStore;
use crate::types::{ArtifactKind, Destination};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Processing state reported while polling a container
#[derive(Clone, Debug, PartialEq, Eq)]
enum ContainerStatus {
    Finished,
    Failed(String),
    InProgress(String),
}

impl ContainerStatus {
    fn from_response(body: &serde_json::Value) -> Self {
        let code = body
            .get("status_code")
            .and_then(|v| v.as_str())
            .unwrap_or("UNKNOWN");
        match code {
            "FINISHED" | "PUBLISHED" => ContainerStatus::Finished,
            "ERROR" | "EXPIRED" => {
                let detail = body
                    .get("status")
                    .and_then(|v| v.as_str())
                    .unwrap_or(code);
                ContainerStatus::Failed(detail.to_string())
            }
            other => ContainerStatus::InProgress(other.to_string()),
        }
    }
}

/// Publishes through a server-side media container
pub struct ContainerPublisher {
    config: InstagramConfig,
    client: reqwest::Client,
    store: Arc<dyn ObjectStore>,
    cancel: CancellationToken,
}

impl ContainerPublisher {
    /// Create a publisher
    ///
    /// `store` supplies share URLs; `cancel` interrupts polling.
    pub fn new(
        config: InstagramConfig,
        client: reqwest::Client,
        store: Arc<dyn ObjectStore>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            client,
            store,
            cancel,
        }
    }

    fn graph(&self) -> &str {
        self.config.graph_url.trim_end_matches('/')
    }

    fn media_type(kind: ArtifactKind) -> &'static str {
        match kind {
            ArtifactKind::Short => "REELS",
            ArtifactKind::Standard => "VIDEO",
        }
    }

    fn poll_config(&self, kind: ArtifactKind) -> PollConfig {
        match kind {
            ArtifactKind::Short => self.config.short,
            ArtifactKind::Standard => self.config.long,
        }
    }

    async fn create(&self, request: &PublishRequest<'_>) -> Result<String> {
        let video_url = self
            .store
            .presigned_url(request.key, self.config.share_url_ttl)
            .await?;

        let url = format!("{}/{}/media", self.graph(), self.config.user_id);
        let response = self
            .client
            .post(&url)
            .form(&[
                ("media_type", Self::media_type(request.kind)),
                ("video_url", video_url.as_str()),
                ("caption", request.metadata.caption.as_str()),
                ("access_token", self.config.access_token.as_str()),
            ])
            .send()
            .await?;

        let body = ok_json("create", response).await?;
        string_field("create", &body, "id")
    }

    async fn status(&self, creation_id: &str) -> Result<ContainerStatus> {
        let url = format!("{}/{}", self.graph(), creation_id);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("fields", "status_code,status"),
                ("access_token", self.config.access_token.as_str()),
            ])
            .send()
            .await?;

        let body = ok_json("poll", response).await?;
        Ok(ContainerStatus::from_response(&body))
    }

    /// Poll until the container is ready, failed, or out of budget
    ///
    /// Both the waits and the status requests are bounded by the deadline and
    /// the cancellation token. Transient poll failures are logged and polling
    /// continues.
    async fn wait_until_ready(&self, creation_id: &str, poll: PollConfig) -> Result<()> {
        let started = Instant::now();
        let deadline = started + poll.max_wait;

        loop {
            let now = Instant::now();
            if now >= deadline {
                return Err(timed_out(creation_id, started, poll));
            }

            let wait = poll.interval.min(deadline - now);
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = self.cancel.cancelled() => {
                    return Err(PublishError::Cancelled.into());
                }
            }

            let checked = tokio::select! {
                checked = self.status(creation_id) => checked,
                _ = tokio::time::sleep_until(deadline) => {
                    return Err(timed_out(creation_id, started, poll));
                }
                _ = self.cancel.cancelled() => {
                    return Err(PublishError::Cancelled.into());
                }
            };

            match checked {
                Ok(ContainerStatus::Finished) => {
                    debug!(creation_id, elapsed_ms = started.elapsed().as_millis() as u64, "container ready");
                    return Ok(());
                }
                Ok(ContainerStatus::Failed(status)) => {
                    warn!(creation_id, status = %status, "container processing failed");
                    return Err(PublishError::ProcessingFailed {
                        creation_id: creation_id.to_string(),
                        status,
                    }
                    .into());
                }
                Ok(ContainerStatus::InProgress(status)) => {
                    debug!(creation_id, status = %status, "container still processing");
                }
                Err(e) => {
                    warn!(creation_id, error = %e, "status check failed, polling again");
                }
            }
        }
    }

    async fn publish_container(&self, creation_id: &str) -> Result<Option<String>> {
        let url = format!("{}/{}/media_publish", self.graph(), self.config.user_id);
        let response = self
            .client
            .post(&url)
            .form(&[
                ("creation_id", creation_id),
                ("access_token", self.config.access_token.as_str()),
            ])
            .send()
            .await?;

        let body = ok_json("publish", response).await?;
        Ok(string_field("publish", &body, "id").ok())
    }
}

fn timed_out(creation_id: &str, started: Instant, poll: PollConfig) -> crate::Error {
    warn!(
        creation_id,
        waited_ms = poll.max_wait.as_millis() as u64,
        "container not ready before poll budget ran out"
    );
    PublishError::ProcessingTimeout {
        creation_id: creation_id.to_string(),
        waited: started.elapsed(),
    }
    .into()
}

#[async_trait]
impl PublishAdapter for ContainerPublisher {
    fn destination(&self) -> Destination {
        Destination::Instagram
    }

    async fn publish(&self, request: &PublishRequest<'_>) -> Result<PublishReceipt> {
        let media_type = Self::media_type(request.kind);

        let creation_id = self.create(request).await?;
        debug!(key = request.key, media_type, creation_id = %creation_id, "container created");

        self.wait_until_ready(&creation_id, self.poll_config(request.kind))
            .await?;

        let media_id = self.publish_container(&creation_id).await?;
        info!(key = request.key, media_type, creation_id = %creation_id, "container published");
        Ok(PublishReceipt {
            remote_id: media_id.or(Some(creation_id)),
        })
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_codes_map_to_states() {
        assert_eq!(
            ContainerStatus::from_response(&json!({"status_code": "FINISHED"})),
            ContainerStatus::Finished
        );
        assert_eq!(
            ContainerStatus::from_response(&json!({"status_code": "IN_PROGRESS"})),
            ContainerStatus::InProgress("IN_PROGRESS".into())
        );
        assert_eq!(
            ContainerStatus::from_response(
                &json!({"status_code": "ERROR", "status": "Error: unsupported codec"})
            ),
            ContainerStatus::Failed("Error: unsupported codec".into())
        );
        assert_eq!(
            ContainerStatus::from_response(&json!({"id": "1"})),
            ContainerStatus::InProgress("UNKNOWN".into())
        );
    }

    #[test]
    fn media_type_follows_artifact_kind() {
        assert_eq!(ContainerPublisher::media_type(ArtifactKind::Short), "REELS");
        assert_eq!(ContainerPublisher::media_type(ArtifactKind::Standard), "VIDEO");
    }
}
