//! File-backed backend that replays canned replies.
//!
//! Replies are looked up as `<dir>/<story_id>/batch_<n>.json` and then
//! `<dir>/batch_<n>.json`, where `n` is the zero-based batch index. The file
//! content is returned verbatim as the raw structured output, so it goes
//! through the same lenient decoding as a live reply.

use async_trait::async_trait;
use continuum_core::BatchPayload;
use continuum_error::{ContinuumResult, StorageError, StorageErrorKind};
use continuum_interface::{BackendSession, CompletionStatus, GenerationBackend, WorkerId};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Offline backend reading replies from a directory.
#[derive(Debug, Clone, derive_getters::Getters)]
pub struct ReplayBackend {
    dir: PathBuf,
}

impl ReplayBackend {
    /// Creates a backend reading from `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn reply_path(&self, story_id: &str, batch_index: usize) -> Option<PathBuf> {
        let file = format!("batch_{batch_index}.json");
        [self.dir.join(story_id).join(&file), self.dir.join(&file)]
            .into_iter()
            .find(|p| p.is_file())
    }
}

#[async_trait]
impl GenerationBackend for ReplayBackend {
    async fn open_session(
        &self,
        worker: WorkerId,
        story_id: &str,
    ) -> ContinuumResult<Box<dyn BackendSession>> {
        let session = ReplaySession {
            backend: self.clone(),
            story_id: story_id.to_string(),
            attempt_id: format!("{worker}-{}", uuid::Uuid::new_v4()),
            batch_index: None,
        };
        debug!(attempt_id = %session.attempt_id, "Opened replay session");
        Ok(Box::new(session))
    }

    async fn cancel_in_flight(&self, _story_id: &str) -> ContinuumResult<usize> {
        Ok(0)
    }

    fn backend_name(&self) -> &str {
        "replay"
    }
}

struct ReplaySession {
    backend: ReplayBackend,
    story_id: String,
    attempt_id: String,
    batch_index: Option<usize>,
}

#[async_trait]
impl BackendSession for ReplaySession {
    fn attempt_id(&self) -> &str {
        &self.attempt_id
    }

    async fn submit(&mut self, payload: &BatchPayload) -> ContinuumResult<()> {
        self.batch_index = Some(payload.batch_index);
        Ok(())
    }

    async fn poll_output(&mut self) -> ContinuumResult<Option<String>> {
        let Some(batch_index) = self.batch_index else {
            return Ok(None);
        };
        let path = self
            .backend
            .reply_path(&self.story_id, batch_index)
            .ok_or_else(|| {
                StorageError::new(StorageErrorKind::FileRead(format!(
                    "no canned reply for story '{}' batch {} in {}",
                    self.story_id,
                    batch_index,
                    self.backend.dir.display()
                )))
            })?;
        let raw = tokio::fs::read_to_string(&path).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileRead(format!("{}: {}", path.display(), e)))
        })?;
        Ok(Some(raw))
    }

    async fn poll_completion(&mut self) -> ContinuumResult<CompletionStatus> {
        Ok(CompletionStatus::Completed {
            reported_success: true,
        })
    }

    async fn cancel(&mut self) -> ContinuumResult<()> {
        Ok(())
    }
}
