//! Resumable chunked upload
//!
//! Three phases against one endpoint:
//!
//! 1. `start` declares the file size and returns a session id plus the first
//!    byte range `[start, end)` the server wants.
//! 2. `transfer` sends exactly that range and receives the next one. The loop
//!    ends when the server answers with `start == end`.
//! 3. `finish` attaches the description and title and publishes the video.
//!
//! A session is never resumed: a failed attempt starts over from `start`.

use super::{PublishAdapter, PublishReceipt, PublishRequest, ok_json, require_ok, string_field};
use crate::config::FacebookConfig;
use crate::error::{PublishError, Result};
use crate::types::Destination;
use crate::utils::{file_name, truncate_chars};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::io::SeekFrom;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, info};

/// Longest title the platform accepts
const MAX_TITLE_CHARS: usize = 100;

/// Byte range requested by the server
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ChunkRange {
    start: u64,
    end: u64,
}

impl ChunkRange {
    fn from_response(phase: &'static str, body: &Value) -> Result<Self> {
        let start = offset_field(phase, body, "start_offset")?;
        let end = offset_field(phase, body, "end_offset")?;
        if end < start {
            return Err(PublishError::InvalidRange { start, end }.into());
        }
        Ok(Self { start, end })
    }

    fn is_done(&self) -> bool {
        self.start == self.end
    }

    fn len(&self) -> u64 {
        self.end - self.start
    }
}

/// Offsets arrive as decimal strings, occasionally as numbers
fn offset_field(phase: &'static str, body: &Value, field: &str) -> Result<u64> {
    let parsed = match body.get(field) {
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        Some(Value::Number(n)) => n.as_u64(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        PublishError::MalformedResponse {
            phase,
            reason: format!("missing or invalid `{field}`"),
        }
        .into()
    })
}

/// Uploads large files in server-directed chunks
pub struct ChunkedUploader {
    config: FacebookConfig,
    client: reqwest::Client,
}

impl ChunkedUploader {
    /// Create an uploader sharing the given HTTP client
    pub fn new(config: FacebookConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    async fn start(&self, url: &str, file_size: u64) -> Result<(String, Option<String>, ChunkRange)> {
        let file_size = file_size.to_string();
        let response = self
            .client
            .post(url)
            .form(&[
                ("upload_phase", "start"),
                ("file_size", file_size.as_str()),
                ("access_token", self.config.access_token.as_str()),
            ])
            .send()
            .await?;

        let body = ok_json("start", response).await?;
        let session_id = string_field("start", &body, "upload_session_id")?;
        let video_id = string_field("start", &body, "video_id").ok();
        let range = ChunkRange::from_response("start", &body)?;
        Ok((session_id, video_id, range))
    }

    async fn transfer(
        &self,
        url: &str,
        session_id: &str,
        file: &mut File,
        file_size: u64,
        file_label: &str,
        range: ChunkRange,
    ) -> Result<ChunkRange> {
        let chunk = read_chunk(file, file_size, range).await?;
        debug!(start = range.start, end = range.end, bytes = chunk.len(), "transferring chunk");

        let form = Form::new()
            .text("upload_phase", "transfer")
            .text("upload_session_id", session_id.to_string())
            .text("start_offset", range.start.to_string())
            .text("access_token", self.config.access_token.clone())
            .part(
                "video_file_chunk",
                Part::bytes(chunk)
                    .file_name(file_label.to_string())
                    .mime_str("application/octet-stream")?,
            );

        let response = self.client.post(url).multipart(form).send().await?;
        let body = ok_json("transfer", response).await?;
        let next = ChunkRange::from_response("transfer", &body)?;

        if !next.is_done() && next.start <= range.start {
            return Err(PublishError::MalformedResponse {
                phase: "transfer",
                reason: format!(
                    "server did not advance past offset {} (next range [{}, {}))",
                    range.start, next.start, next.end
                ),
            }
            .into());
        }
        Ok(next)
    }

    async fn finish(&self, url: &str, session_id: &str, request: &PublishRequest<'_>) -> Result<()> {
        let title = truncate_chars(&request.metadata.title, MAX_TITLE_CHARS);
        let response = self
            .client
            .post(url)
            .form(&[
                ("upload_phase", "finish"),
                ("upload_session_id", session_id),
                ("access_token", self.config.access_token.as_str()),
                ("description", request.metadata.caption.as_str()),
                ("title", title),
            ])
            .send()
            .await?;

        require_ok("finish", response).await?;
        Ok(())
    }
}

/// Read the bytes of `range` from a file of `file_size` bytes
///
/// A range starting at or past the end of the file yields
/// [`PublishError::EmptyChunk`]; one that starts inside the file but ends
/// past it is an [`PublishError::InvalidRange`].
async fn read_chunk(file: &mut File, file_size: u64, range: ChunkRange) -> Result<Vec<u8>> {
    if range.start >= file_size {
        return Err(PublishError::EmptyChunk {
            start: range.start,
            end: range.end,
        }
        .into());
    }
    if range.end > file_size {
        return Err(PublishError::InvalidRange {
            start: range.start,
            end: range.end,
        }
        .into());
    }

    file.seek(SeekFrom::Start(range.start)).await?;

    let mut chunk = Vec::with_capacity(usize::try_from(range.len()).unwrap_or(0));
    (&mut *file).take(range.len()).read_to_end(&mut chunk).await?;

    if chunk.is_empty() {
        return Err(PublishError::EmptyChunk {
            start: range.start,
            end: range.end,
        }
        .into());
    }
    Ok(chunk)
}

async fn file_size(path: &Path) -> Result<u64> {
    Ok(tokio::fs::metadata(path).await?.len())
}

#[async_trait]
impl PublishAdapter for ChunkedUploader {
    fn destination(&self) -> Destination {
        Destination::Facebook
    }

    async fn publish(&self, request: &PublishRequest<'_>) -> Result<PublishReceipt> {
        let url = self.config.videos_url();
        let size = file_size(request.local_path).await?;
        let file_label = file_name(request.key);

        let (session_id, video_id, mut range) = self.start(&url, size).await?;
        debug!(
            key = request.key,
            session_id = %session_id,
            size,
            start = range.start,
            end = range.end,
            "upload session started"
        );

        let mut file = File::open(request.local_path).await?;
        let mut chunks = 0u32;
        while !range.is_done() {
            range = self
                .transfer(&url, &session_id, &mut file, size, file_label, range)
                .await?;
            chunks += 1;
        }

        self.finish(&url, &session_id, request).await?;

        info!(key = request.key, session_id = %session_id, chunks, "chunked upload finished");
        Ok(PublishReceipt { remote_id: video_id })
    }
}
