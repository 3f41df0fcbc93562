//! Bounded retry over `tokio-retry2`.

use continuum_error::RetryableError;
use derive_getters::Getters;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_retry2::strategy::{FixedInterval, jitter};
use tokio_retry2::{Retry, RetryError};
use tracing::warn;

/// How many attempts to make and how long to pause between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters)]
pub struct RetryPolicy {
    max_attempts: usize,
    delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy; at least one attempt is always made.
    pub fn new(max_attempts: usize, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

/// The error that ended a retry loop, with the number of attempts made.
#[derive(Debug)]
pub struct RetryFailure<E> {
    /// Attempts made, including the failing one
    pub attempts: usize,
    /// Error of the last attempt
    pub error: E,
}

impl<E: RetryableError> RetryFailure<E> {
    /// True when every attempt failed with a retryable error.
    pub fn exhausted(&self) -> bool {
        self.error.is_retryable()
    }
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or
/// `policy.max_attempts` attempts have been made.
///
/// The operation receives the 1-based attempt number. Errors are classified
/// with [`RetryableError`].
pub async fn retry_bounded<T, E, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, RetryFailure<E>>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RetryableError + std::fmt::Display,
{
    let attempts = AtomicUsize::new(0);
    let max_attempts = policy.max_attempts;
    let strategy = FixedInterval::new(policy.delay)
        .map(jitter)
        .take(max_attempts - 1);

    let result = Retry::spawn(strategy, || {
        let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let future = operation(attempt);
        async move {
            match future.await {
                Ok(value) => Ok(value),
                Err(e) if e.is_retryable() => {
                    if attempt < max_attempts {
                        warn!(attempt, max_attempts, error = %e, "Attempt failed, will retry");
                    }
                    Err(RetryError::Transient {
                        err: e,
                        retry_after: None,
                    })
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Permanent error, failing immediately");
                    Err(RetryError::Permanent(e))
                }
            }
        }
    })
    .await;

    result.map_err(|error| RetryFailure {
        attempts: attempts.load(Ordering::SeqCst),
        error,
    })
}
