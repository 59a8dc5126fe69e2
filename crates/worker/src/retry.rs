//! Bounded retry middleware for task handlers
//!
//! Retries a failing handler with exponential backoff up to a fixed number
//! of retries. Non-retriable error kinds (truncation, configuration,
//! validation, CAS conflicts, remote rejections) abort immediately.

use backoff::future::retry;
use backoff::{Error as BackoffError, ExponentialBackoffBuilder};
use corpora_common::errors::{AppError, Result};
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_INITIAL_INTERVAL: Duration = Duration::from_secs(1);

/// Run an operation, retrying retriable failures up to `max_retries` times.
pub async fn run_with_retry<F, Fut>(
    max_retries: u32,
    initial_interval: Duration,
    mut operation: F,
) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let attempts = AtomicU32::new(0);

    let policy = ExponentialBackoffBuilder::new()
        .with_initial_interval(initial_interval)
        .with_max_elapsed_time(None)
        .build();

    retry(policy, || {
        let future = operation();
        let attempts = &attempts;
        async move {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;

            match future.await {
                Ok(()) => Ok(()),
                Err(e) if e.is_retriable() && attempt <= max_retries => {
                    warn!(attempt, max_retries, error = %e, "Handler failed, retrying");
                    Err(BackoffError::transient(e))
                }
                Err(e) => Err(BackoffError::permanent(e)),
            }
        }
    })
    .await
}

/// Convert a join error (usually a panic inside the handler) into an error
/// value so a poisoned handler cannot take the worker down.
pub fn recover_panic(err: tokio::task::JoinError) -> AppError {
    if err.is_panic() {
        AppError::Fatal {
            message: format!("task handler panicked: {}", err),
        }
    } else {
        AppError::Internal {
            message: format!("task handler aborted: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn test_retries_transient_until_success() {
        let calls = AtomicUsize::new(0);

        let result = run_with_retry(3, Duration::from_millis(1), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(AppError::Transient {
                        message: "flaky".into(),
                    })
                } else {
                    Ok(())
                }
            }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_budget_is_bounded() {
        let calls = AtomicUsize::new(0);

        let result = run_with_retry(3, Duration::from_millis(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(AppError::Transient {
                    message: "always fails".into(),
                })
            }
        })
        .await;

        assert!(result.is_err());
        // Initial attempt plus three retries.
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_truncated_is_never_retried() {
        let calls = AtomicUsize::new(0);

        let result = run_with_retry(3, Duration::from_millis(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(AppError::Truncated {
                    message: "cut short".into(),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(AppError::Truncated { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
