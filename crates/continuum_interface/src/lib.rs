//! Trait definitions for structured-generation backends.
//!
//! The raw client protocol lives outside this workspace. A backend only has
//! to hand out stateful sessions bound to a pool worker; the orchestrator
//! drives those sessions through submit, output polling, completion polling
//! and cancellation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;
mod types;

pub use traits::{BackendSession, GenerationBackend};
pub use types::{CompletionStatus, WorkerId};
