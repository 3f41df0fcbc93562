//! Retry classification shared by every error that can reach the retry loop.

use crate::{ContinuumError, ContinuumErrorKind, GenerationError};

/// Trait for errors that support retry logic.
///
/// # Examples
///
/// ```
/// use continuum_error::{ContinuumError, GenerationError, GenerationErrorKind, RetryableError};
///
/// let err: ContinuumError = GenerationError::new(GenerationErrorKind::IncompleteBatch {
///     expected: 5,
///     received: 2,
/// })
/// .into();
/// assert!(err.is_retryable());
/// ```
pub trait RetryableError {
    /// Returns true if this error should trigger another attempt.
    ///
    /// Incomplete, timed-out, malformed and session failures are retryable.
    /// Corrupt continuity state, invalid input and configuration errors are fatal.
    fn is_retryable(&self) -> bool;
}

impl RetryableError for GenerationError {
    fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl RetryableError for ContinuumError {
    fn is_retryable(&self) -> bool {
        match self.kind() {
            ContinuumErrorKind::Generation(e) => e.is_retryable(),
            ContinuumErrorKind::Backend(_) => true,
            _ => false,
        }
    }
}
