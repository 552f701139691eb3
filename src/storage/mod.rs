//! Object storage access
//!
//! The orchestrator treats the source bucket as an opaque collaborator behind
//! the [`ObjectStore`] trait. Two implementations are provided:
//!
//! - [`S3ObjectStore`]: AWS S3 (or any S3-compatible endpoint) via `aws-sdk-s3`
//! - [`MemoryObjectStore`]: in-process map, used by tests and local dry runs
//!
//! ## Usage
//!
//! ```no_run
//! use media_autopost::storage::{MemoryObjectStore, ObjectStore};
//! use chrono::Utc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryObjectStore::new();
//! store.insert("reels/2025-06-01 - Clip.mp4", b"...".to_vec(), Utc::now()).await;
//!
//! for artifact in store.list("reels/").await? {
//!     println!("{} ({})", artifact.key, artifact.last_modified);
//! }
//! # Ok(())
//! # }
//! ```

mod memory;
mod s3;

pub use memory::MemoryObjectStore;
pub use s3::S3ObjectStore;

use crate::types::Artifact;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Narrow interface to the source-of-truth object store
///
/// Implementations must drain paginated listings completely before returning.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List every object under `prefix`
    async fn list(&self, prefix: &str) -> crate::Result<Vec<Artifact>>;

    /// Download an object to a local file, replacing any existing file
    async fn download(&self, key: &str, local_path: &Path) -> crate::Result<()>;

    /// Time-limited URL a third party can fetch the object from
    async fn presigned_url(&self, key: &str, ttl: Duration) -> crate::Result<String>;

    /// Server-side copy of `src` to `dst`
    async fn copy(&self, src: &str, dst: &str) -> crate::Result<()>;

    /// Delete an object
    async fn delete(&self, key: &str) -> crate::Result<()>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
