//! Single-shot multipart upload

use super::{PublishAdapter, PublishReceipt, PublishRequest, ok_json, string_field};
use crate::config::YouTubeConfig;
use crate::error::Result;
use crate::types::Destination;
use crate::utils::file_name;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::json;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

/// Uploads the whole file and its metadata in one request
///
/// There is no intermediate state: success is HTTP 200 with an `id` in the
/// response body, anything else is a failed attempt.
pub struct SingleShotUploader {
    config: YouTubeConfig,
    client: reqwest::Client,
}

impl SingleShotUploader {
    /// Create an uploader sharing the given HTTP client
    pub fn new(config: YouTubeConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn metadata_part(&self, request: &PublishRequest<'_>) -> Result<Part> {
        let metadata = json!({
            "snippet": {
                "title": request.metadata.title,
                "description": request.metadata.caption,
                "categoryId": self.config.category_id,
            },
            "status": {
                "privacyStatus": self.config.privacy_status,
            },
        });

        Ok(Part::text(serde_json::to_string(&metadata)?).mime_str("application/json")?)
    }
}

#[async_trait]
impl PublishAdapter for SingleShotUploader {
    fn destination(&self) -> Destination {
        Destination::YouTube
    }

    async fn publish(&self, request: &PublishRequest<'_>) -> Result<PublishReceipt> {
        let file = tokio::fs::File::open(request.local_path).await?;
        let size = file.metadata().await?.len();

        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
        let media = Part::stream_with_length(body, size)
            .file_name(file_name(request.key).to_string())
            .mime_str("video/mp4")?;
        let form = Form::new()
            .part("metadata", self.metadata_part(request)?)
            .part("media", media);

        debug!(key = request.key, size, "uploading video");
        let response = self
            .client
            .post(&self.config.upload_url)
            .bearer_auth(&self.config.access_token)
            .multipart(form)
            .send()
            .await?;

        let body = ok_json("upload", response).await?;
        let video_id = string_field("upload", &body, "id")?;

        info!(key = request.key, video_id = %video_id, "video uploaded");
        Ok(PublishReceipt {
            remote_id: Some(video_id),
        })
    }
}
