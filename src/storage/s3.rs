//! S3-backed object store

use super::ObjectStore;
use crate::config::StorageConfig;
use crate::error::{Result, StorageError};
use crate::types::Artifact;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Object store backed by an S3 bucket
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Wrap an existing client
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Build a client from static credentials
    ///
    /// No request is made here; credential problems surface on the first call.
    pub fn from_config(config: &StorageConfig) -> Self {
        let credentials = Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            None,
            None,
            "media-autopost",
        );

        let mut builder = aws_sdk_s3::config::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials);

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        if config.force_path_style {
            builder = builder.force_path_style(true);
        }

        tracing::info!(bucket = %config.bucket, region = %config.region, "S3 object store configured");
        Self::new(Client::from_conf(builder.build()), config.bucket.clone())
    }

    /// The `x-amz-copy-source` value for a key in this bucket
    fn copy_source(&self, key: &str) -> String {
        let encoded: Vec<String> = key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}/{}", self.bucket, encoded.join("/"))
    }
}

fn backend_error<E>(operation: &'static str, err: E) -> crate::Error
where
    E: std::error::Error,
{
    StorageError::Backend {
        operation,
        message: DisplayErrorContext(err).to_string(),
    }
    .into()
}

fn to_chrono(value: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(value.secs(), value.subsec_nanos())
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list(&self, prefix: &str) -> Result<Vec<Artifact>> {
        let mut artifacts = Vec::new();
        let mut continuation: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let response = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|e| backend_error("list", e))?;
            pages += 1;

            for object in response.contents() {
                let Some(key) = object.key() else { continue };
                let Some(last_modified) = object.last_modified().and_then(to_chrono) else {
                    tracing::warn!(key, "object without last-modified timestamp, ignoring");
                    continue;
                };
                artifacts.push(Artifact {
                    key: key.to_string(),
                    last_modified,
                    size: object.size().and_then(|s| u64::try_from(s).ok()),
                });
            }

            match (response.is_truncated(), response.next_continuation_token()) {
                (Some(true), Some(token)) => continuation = Some(token.to_string()),
                _ => break,
            }
        }

        tracing::debug!(prefix, pages, objects = artifacts.len(), "listed objects");
        Ok(artifacts)
    }

    async fn download(&self, key: &str, local_path: &Path) -> Result<()> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let not_found = e
                    .as_service_error()
                    .is_some_and(|service| service.is_no_such_key());
                if not_found {
                    StorageError::NotFound {
                        key: key.to_string(),
                    }
                    .into()
                } else {
                    backend_error("download", e)
                }
            })?;

        let mut reader = response.body.into_async_read();
        let mut file = tokio::fs::File::create(local_path).await?;
        let copied = async {
            let bytes = tokio::io::copy(&mut reader, &mut file).await?;
            file.flush().await?;
            Ok::<_, std::io::Error>(bytes)
        }
        .await;

        match copied {
            Ok(bytes) => {
                tracing::debug!(key, bytes, "object downloaded");
                Ok(())
            }
            Err(e) => {
                drop(file);
                // Never leave a truncated file behind for the next stage
                let _ = tokio::fs::remove_file(local_path).await;
                Err(e.into())
            }
        }
    }

    async fn presigned_url(&self, key: &str, ttl: Duration) -> Result<String> {
        let presigning = PresigningConfig::expires_in(ttl).map_err(|e| backend_error("presign", e))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| backend_error("presign", e))?;

        Ok(request.uri().to_string())
    }

    async fn copy(&self, src: &str, dst: &str) -> Result<()> {
        self.client
            .copy_object()
            .bucket(&self.bucket)
            .copy_source(self.copy_source(src))
            .key(dst)
            .send()
            .await
            .map_err(|e| backend_error("copy", e))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| backend_error("delete", e))?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "s3"
    }
}
