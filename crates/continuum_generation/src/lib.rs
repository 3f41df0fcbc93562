//! Batch generation orchestrator.
//!
//! Drives an untrusted structured-generation backend batch by batch: each
//! batch gets deterministic continuity references, is requested on a fresh
//! session from a round-robin worker pool, is retried on the next worker when
//! the reply is late, malformed or incomplete, and is fused into final
//! prompts before its continuity state is persisted.
//!
//! # Example
//!
//! ```no_run
//! use continuum_continuity::ContinuityStore;
//! use continuum_core::Segment;
//! use continuum_generation::{
//!     ContinuumConfig, GenerationOrchestrator, ReplayBackend, StoryRequest, WorkerPool,
//! };
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ContinuumConfig::load()?;
//! let pool = Arc::new(WorkerPool::new(*config.generation().pool_size())?);
//! let store = ContinuityStore::new(config.state().dir())?;
//! let orchestrator =
//!     GenerationOrchestrator::new(Arc::new(ReplayBackend::new("replies")), pool, store, config);
//!
//! let request = StoryRequest::builder()
//!     .story_id("lighthouse")
//!     .segments(vec![Segment::new("s1", 0)])
//!     .build()?;
//! let outcome = orchestrator.generate(&request).await?;
//! for segment in outcome.fused_segments() {
//!     println!("{}", segment.final_prompt);
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod attempt;
mod brief;
mod config;
mod decode;
mod orchestrator;
mod pool;
mod replay;
mod retry;
mod story;

pub use attempt::{Attempt, AttemptState, AttemptTimeouts, select_requested};
pub use brief::{BRIEF_RECENT_PROMPTS, batch_brief};
pub use config::{
    ContinuumConfig, GenerationSettings, GenerationSettingsBuilder, PromptSettings,
    PromptSettingsBuilder, StateSettings,
};
pub use decode::{
    decode_reply, extract_first_object, normalize_quotes, strip_code_fences, strip_comments,
};
pub use orchestrator::GenerationOrchestrator;
pub use pool::WorkerPool;
pub use replay::ReplayBackend;
pub use retry::{RetryFailure, RetryPolicy, retry_bounded};
pub use story::{BatchOutcome, StoryOutcome, StoryRequest, StoryRequestBuilder};
