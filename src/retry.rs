//! Retry governor with a fixed inter-attempt delay
//!
//! Every destination is wrapped in the same bounded policy: up to
//! `max_attempts` calls, a fixed `delay` between them, and a single verdict at
//! the end. Errors and panics raised by the operation are absorbed into that
//! verdict; nothing propagates to the caller.
//!
//! # Example
//!
//! ```no_run
//! use media_autopost::config::RetryConfig;
//! use media_autopost::retry::with_retry;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() {
//! let policy = RetryConfig::default();
//! let cancel = CancellationToken::new();
//! let retried = with_retry(&policy, &cancel, "youtube", || async {
//!     // Your operation here
//!     Ok::<_, media_autopost::Error>("video-id")
//! })
//! .await;
//!
//! if retried.succeeded() {
//!     println!("published after {} attempt(s)", retried.attempts);
//! }
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::Result;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio_util::sync::CancellationToken;

/// Final verdict of a retried operation
#[derive(Debug)]
pub struct Retried<T> {
    /// Number of times the operation was invoked
    pub attempts: u32,
    /// The first successful value, or the last failure reason
    pub result: std::result::Result<T, String>,
}

impl<T> Retried<T> {
    /// Whether any attempt succeeded
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Execute an async operation under the fixed-delay retry policy
///
/// # Arguments
///
/// * `policy` - Attempt budget and inter-attempt delay
/// * `cancel` - Run-wide cancellation; no attempt starts after it fires
/// * `label` - Name used in log fields (usually the destination)
/// * `operation` - Async closure returning `Result<T>`
///
/// # Returns
///
/// A [`Retried`] carrying the first success or the last failure reason. An
/// `Err` or a panic inside the operation counts as a failed attempt.
pub async fn with_retry<F, Fut, T>(
    policy: &RetryConfig,
    cancel: &CancellationToken,
    label: &str,
    mut operation: F,
) -> Retried<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    let mut last_error = String::from("not attempted");

    while attempt < max_attempts {
        if cancel.is_cancelled() {
            tracing::warn!(label, attempt, "run cancelled, no further attempts");
            last_error = format!("cancelled after {attempt} attempt(s): {last_error}");
            break;
        }

        attempt += 1;
        let outcome = AssertUnwindSafe(operation()).catch_unwind().await;

        match outcome {
            Ok(Ok(value)) => {
                if attempt > 1 {
                    tracing::info!(label, attempts = attempt, "operation succeeded after retry");
                } else {
                    tracing::debug!(label, "operation succeeded on first attempt");
                }
                return Retried {
                    attempts: attempt,
                    result: Ok(value),
                };
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    label,
                    attempt,
                    max_attempts,
                    error = %e,
                    error_code = e.code(),
                    "attempt failed"
                );
                last_error = e.to_string();
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(label, attempt, max_attempts, panic = %message, "attempt panicked");
                last_error = format!("panicked: {message}");
            }
        }

        if attempt < max_attempts {
            tokio::select! {
                _ = tokio::time::sleep(policy.delay) => {}
                _ = cancel.cancelled() => {}
            }
        }
    }

    tracing::error!(
        label,
        attempts = attempt,
        error = %last_error,
        "operation failed after all retry attempts exhausted"
    );
    Retried {
        attempts: attempt,
        result: Err(last_error),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
