//! Run summary notifications
//!
//! Sinks are best effort: a failed delivery is reported to the caller, which
//! logs it and carries on. Nothing here can fail a run.

use crate::config::{NotificationConfig, WebhookConfig};
use crate::error::{Error, Result};
use crate::utils::body_excerpt;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

/// Destination for the human-readable run summary
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver a message
    async fn send(&self, text: &str) -> Result<()>;

    /// Short description for logs (never includes secrets)
    fn describe(&self) -> String;
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    text: &'a str,
}

/// POSTs `{"text": ...}` to a chat webhook (Slack-compatible)
pub struct WebhookSink {
    config: WebhookConfig,
    client: reqwest::Client,
}

impl WebhookSink {
    /// Create a sink with its own HTTP client
    pub fn new(config: WebhookConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    /// Create a sink sharing an HTTP client
    pub fn with_client(config: WebhookConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    async fn send(&self, text: &str) -> Result<()> {
        let mut request = self
            .client
            .post(&self.config.url)
            .json(&WebhookPayload { text })
            .timeout(self.config.timeout);

        if let Some(auth) = &self.config.auth_header {
            request = request.header("Authorization", auth);
        }

        let timeout = self.config.timeout;
        match tokio::time::timeout(timeout, request.send()).await {
            Ok(Ok(response)) => {
                let status = response.status();
                if status.is_success() {
                    tracing::debug!(sink = %self.describe(), "summary delivered");
                    Ok(())
                } else {
                    let body = response.text().await.unwrap_or_default();
                    Err(Error::Notification(format!(
                        "webhook returned status {status}: {}",
                        body_excerpt(&body)
                    )))
                }
            }
            Ok(Err(e)) => Err(Error::Notification(format!("failed to send webhook: {e}"))),
            Err(_) => Err(Error::Notification(format!(
                "webhook timed out after {timeout:?}"
            ))),
        }
    }

    fn describe(&self) -> String {
        // Webhook URLs embed their secret in the path; keep only the host
        match url::Url::parse(&self.config.url) {
            Ok(url) => format!("webhook({})", url.host_str().unwrap_or("unknown")),
            Err(_) => "webhook(invalid url)".to_string(),
        }
    }
}

/// Build a sink for every configured webhook
pub fn sinks_from_config(config: &NotificationConfig) -> Vec<Arc<dyn NotificationSink>> {
    let client = reqwest::Client::new();
    config
        .webhooks
        .iter()
        .map(|webhook| {
            Arc::new(WebhookSink::with_client(webhook.clone(), client.clone())) as Arc<dyn NotificationSink>
        })
        .collect()
}
