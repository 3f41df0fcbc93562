//! Types exchanged between the orchestrator and a backend.

use serde::{Deserialize, Serialize};

/// Index of a pre-provisioned backend session identity in the worker pool.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct WorkerId(pub usize);

impl std::fmt::Display for WorkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "worker-{}", self.0)
    }
}

/// Backend view of whether a submitted batch has finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum CompletionStatus {
    /// Still running
    Pending,
    /// Backend reports the batch finished
    Completed {
        /// Whether the backend considers the run successful.
        ///
        /// Informational only: an incomplete batch is a failure whatever this says.
        reported_success: bool,
    },
    /// Backend reports the batch failed
    Failed(String),
}
