//! Backend and session traits.

use crate::{CompletionStatus, WorkerId};
use async_trait::async_trait;
use continuum_core::BatchPayload;
use continuum_error::ContinuumResult;

/// A structured-generation backend reachable through a fixed worker pool.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Open a fresh session on the given worker.
    ///
    /// Every attempt gets its own session; a stalled session is never resumed.
    async fn open_session(
        &self,
        worker: WorkerId,
        story_id: &str,
    ) -> ContinuumResult<Box<dyn BackendSession>>;

    /// Cancel attempts for `story_id` still in flight from an earlier, aborted run.
    ///
    /// Must be idempotent. Returns the number of attempts cancelled.
    async fn cancel_in_flight(&self, story_id: &str) -> ContinuumResult<usize>;

    /// Backend name for logs.
    fn backend_name(&self) -> &str;
}

/// One attempt's channel to the backend.
#[async_trait]
pub trait BackendSession: Send {
    /// Attempt id assigned by the backend, for logs.
    fn attempt_id(&self) -> &str;

    /// Submit the batch.
    async fn submit(&mut self, payload: &BatchPayload) -> ContinuumResult<()>;

    /// Raw structured output text, once the backend has produced it.
    async fn poll_output(&mut self) -> ContinuumResult<Option<String>>;

    /// Completion status after the output has been taken.
    async fn poll_completion(&mut self) -> ContinuumResult<CompletionStatus>;

    /// Cancel the attempt. Best effort; callers log failures and move on.
    async fn cancel(&mut self) -> ContinuumResult<()>;
}
