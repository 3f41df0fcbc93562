//! Error types for the Continuum workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use continuum_error::{ContinuumResult, GenerationError, GenerationErrorKind};
//!
//! fn run_batch() -> ContinuumResult<()> {
//!     Err(GenerationError::new(GenerationErrorKind::IncompleteBatch {
//!         expected: 4,
//!         received: 3,
//!     }))?
//! }
//!
//! assert!(run_batch().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod config;
mod continuity;
mod error;
mod generation;
mod json;
mod retryable;
mod storage;

pub use backend::BackendError;
pub use config::ConfigError;
pub use continuity::{ContinuityError, ContinuityErrorKind};
pub use error::{ContinuumError, ContinuumErrorKind, ContinuumResult};
pub use generation::{GenerationError, GenerationErrorKind};
pub use json::JsonError;
pub use retryable::RetryableError;
pub use storage::{StorageError, StorageErrorKind};
