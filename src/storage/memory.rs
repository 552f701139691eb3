//! In-process object store

use super::ObjectStore;
use crate::error::{Result, StorageError};
use crate::types::Artifact;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Clone, Debug)]
struct StoredObject {
    body: Vec<u8>,
    last_modified: DateTime<Utc>,
}

#[derive(Default)]
struct FailurePlan {
    copy: HashSet<String>,
    delete: HashSet<String>,
    list: bool,
}

/// Object store held entirely in memory
///
/// Keys are kept ordered so listings are deterministic. Individual copy and
/// delete operations can be made to fail, which is how archival and cleanup
/// failure paths are exercised.
#[derive(Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<RwLock<BTreeMap<String, StoredObject>>>,
    failures: Arc<RwLock<FailurePlan>>,
}

impl MemoryObjectStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an object
    pub async fn insert(&self, key: impl Into<String>, body: Vec<u8>, last_modified: DateTime<Utc>) {
        self.objects
            .write()
            .await
            .insert(key.into(), StoredObject { body, last_modified });
    }

    /// Whether an object exists
    pub async fn contains(&self, key: &str) -> bool {
        self.objects.read().await.contains_key(key)
    }

    /// All keys, in order
    pub async fn keys(&self) -> Vec<String> {
        self.objects.read().await.keys().cloned().collect()
    }

    /// Body of an object, if present
    pub async fn body(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.read().await.get(key).map(|o| o.body.clone())
    }

    /// Make every copy whose source is `key` fail
    pub async fn fail_copy(&self, key: impl Into<String>) {
        self.failures.write().await.copy.insert(key.into());
    }

    /// Make every delete of `key` fail
    pub async fn fail_delete(&self, key: impl Into<String>) {
        self.failures.write().await.delete.insert(key.into());
    }

    /// Make every listing fail
    pub async fn fail_list(&self) {
        self.failures.write().await.list = true;
    }
}

fn injected(operation: &'static str, key: &str) -> crate::Error {
    StorageError::Backend {
        operation,
        message: format!("injected failure for {key}"),
    }
    .into()
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn list(&self, prefix: &str) -> Result<Vec<Artifact>> {
        if self.failures.read().await.list {
            return Err(injected("list", prefix));
        }

        let objects = self.objects.read().await;
        Ok(objects
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, object)| Artifact {
                key: key.clone(),
                last_modified: object.last_modified,
                size: Some(object.body.len() as u64),
            })
            .collect())
    }

    async fn download(&self, key: &str, local_path: &Path) -> Result<()> {
        let body = self.body(key).await.ok_or_else(|| StorageError::NotFound {
            key: key.to_string(),
        })?;
        tokio::fs::write(local_path, body).await?;
        Ok(())
    }

    async fn presigned_url(&self, key: &str, ttl: Duration) -> Result<String> {
        if !self.contains(key).await {
            return Err(StorageError::NotFound {
                key: key.to_string(),
            }
            .into());
        }
        Ok(format!(
            "memory://{}?expires={}",
            urlencoding::encode(key),
            ttl.as_secs()
        ))
    }

    async fn copy(&self, src: &str, dst: &str) -> Result<()> {
        if self.failures.read().await.copy.contains(src) {
            return Err(injected("copy", src));
        }

        let mut objects = self.objects.write().await;
        let object = objects
            .get(src)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                key: src.to_string(),
            })?;
        objects.insert(
            dst.to_string(),
            StoredObject {
                body: object.body,
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        if self.failures.read().await.delete.contains(key) {
            return Err(injected("delete", key));
        }
        // Deleting a missing key succeeds, as on S3
        self.objects.write().await.remove(key);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
