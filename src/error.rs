//! Error types for media-autopost
//!
//! This module provides the error taxonomy of the distribution engine:
//! - Configuration errors, which are fatal and abort a run before any slot executes
//! - Storage errors raised by the object-store collaborator
//! - Publish errors raised by the per-destination protocol adapters
//! - Machine-readable error codes for structured logs

use std::time::Duration;
use thiserror::Error;

/// Result type alias for media-autopost operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for media-autopost
///
/// Only [`Error::Config`] ever aborts a run. Every other variant is recovered
/// locally (by the retry governor or the slot runner) and ends up as text in a
/// slot outcome.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "S3_BUCKET_NAME")
        key: Option<String>,
    },

    /// Object storage operation failed
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A destination protocol failed
    #[error("publish error: {0}")]
    Publish(#[from] PublishError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Notification delivery failed
    #[error("notification error: {0}")]
    Notification(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Object storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// The requested object does not exist
    #[error("object {key} not found")]
    NotFound {
        /// The missing object key
        key: String,
    },

    /// The storage backend rejected or failed the operation
    #[error("{operation} failed: {message}")]
    Backend {
        /// The operation that failed (e.g., "list", "copy")
        operation: &'static str,
        /// Backend-provided failure description
        message: String,
    },
}

/// Publish protocol errors
#[derive(Debug, Error)]
pub enum PublishError {
    /// A protocol phase returned a non-success HTTP status
    #[error("{phase} returned HTTP {status}: {body}")]
    UnexpectedStatus {
        /// Protocol phase (e.g., "start", "transfer", "create")
        phase: &'static str,
        /// HTTP status code
        status: u16,
        /// Response body, truncated for logging
        body: String,
    },

    /// A protocol phase returned a body that lacks a required field
    #[error("{phase} returned a malformed response: {reason}")]
    MalformedResponse {
        /// Protocol phase
        phase: &'static str,
        /// What was missing or unparseable
        reason: String,
    },

    /// The local artifact yielded no bytes where the server expected more
    #[error("empty chunk read at offsets [{start}, {end})")]
    EmptyChunk {
        /// Requested start offset
        start: u64,
        /// Requested end offset
        end: u64,
    },

    /// The server asked for a byte range that cannot be satisfied
    #[error("invalid byte range [{start}, {end})")]
    InvalidRange {
        /// Requested start offset
        start: u64,
        /// Requested end offset
        end: u64,
    },

    /// The remote platform reported a processing error for a media container
    #[error("container {creation_id} failed processing: {status}")]
    ProcessingFailed {
        /// Server-assigned creation id
        creation_id: String,
        /// Status text reported by the platform
        status: String,
    },

    /// The media container did not finish processing within the poll budget
    #[error("container {creation_id} not ready after {waited:?}")]
    ProcessingTimeout {
        /// Server-assigned creation id
        creation_id: String,
        /// Total time spent polling
        waited: Duration,
    },

    /// The run was cancelled while the protocol was in progress
    #[error("cancelled")]
    Cancelled,
}

impl Error {
    /// Create a configuration error for a specific key
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Whether this error is a fatal configuration error
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config { .. })
    }

    /// Machine-readable error code, used as a structured log field
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Storage(e) => match e {
                StorageError::NotFound { .. } => "object_not_found",
                StorageError::Backend { .. } => "storage_error",
            },
            Error::Publish(e) => match e {
                PublishError::UnexpectedStatus { .. } => "unexpected_status",
                PublishError::MalformedResponse { .. } => "malformed_response",
                PublishError::EmptyChunk { .. } => "empty_chunk",
                PublishError::InvalidRange { .. } => "invalid_range",
                PublishError::ProcessingFailed { .. } => "processing_failed",
                PublishError::ProcessingTimeout { .. } => "processing_timeout",
                PublishError::Cancelled => "cancelled",
            },
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::Notification(_) => "notification_error",
            Error::Other(_) => "internal_error",
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_helper_records_key() {
        let err = Error::config("S3_BUCKET_NAME is not set", "S3_BUCKET_NAME");

        assert!(err.is_config());
        match err {
            Error::Config { key, message } => {
                assert_eq!(key.as_deref(), Some("S3_BUCKET_NAME"));
                assert_eq!(message, "S3_BUCKET_NAME is not set");
            }
            other => panic!("expected Config, got {other:?}"),
        }
    }

    #[test]
    fn only_config_errors_are_fatal() {
        let errors = [
            Error::Storage(StorageError::NotFound { key: "a.mp4".into() }),
            Error::Publish(PublishError::Cancelled),
            Error::Io(std::io::Error::other("disk")),
            Error::Notification("webhook down".into()),
            Error::Other("boom".into()),
        ];

        for err in errors {
            assert!(!err.is_config(), "{err} must not be fatal");
        }
    }

    #[test]
    fn publish_errors_map_to_distinct_codes() {
        let timeout = Error::from(PublishError::ProcessingTimeout {
            creation_id: "17890".into(),
            waited: Duration::from_secs(60),
        });
        let failed = Error::from(PublishError::ProcessingFailed {
            creation_id: "17890".into(),
            status: "ERROR".into(),
        });

        assert_eq!(timeout.code(), "processing_timeout");
        assert_eq!(failed.code(), "processing_failed");
        assert_ne!(timeout.code(), failed.code());
    }

    #[test]
    fn display_includes_phase_and_status() {
        let err = Error::from(PublishError::UnexpectedStatus {
            phase: "transfer",
            status: 500,
            body: "internal".into(),
        });

        assert_eq!(
            err.to_string(),
            "publish error: transfer returned HTTP 500: internal"
        );
    }

    #[test]
    fn storage_backend_display() {
        let err = StorageError::Backend {
            operation: "copy",
            message: "AccessDenied".into(),
        };

        assert_eq!(err.to_string(), "copy failed: AccessDenied");
    }
}
