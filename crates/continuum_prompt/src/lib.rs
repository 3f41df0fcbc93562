//! Prompt assembly and quality control.
//!
//! Everything in this crate is synchronous, deterministic and infallible:
//! missing input degrades to "no flags" or "no compression", never an error.
//!
//! # Example
//!
//! ```
//! use continuum_core::{ContinuityRefs, StructuredFields};
//! use continuum_prompt::{PromptCompressor, PromptFuser};
//!
//! let fields = StructuredFields {
//!     segment_id: "s1".to_string(),
//!     actions: vec!["John lifts the lantern".to_string()],
//!     shot: "slow dolly in".to_string(),
//!     lighting: "warm lamplight".to_string(),
//!     ..Default::default()
//! };
//! let prompt = PromptFuser::fuse(&fields, &ContinuityRefs::default());
//! assert_eq!(prompt, "John lifts the lantern; slow dolly in; warm lamplight");
//!
//! let compressor = PromptCompressor::new();
//! assert_eq!(compressor.compress(&prompt, 60), prompt);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod camera;
mod compressor;
mod fuser;
mod linter;
mod metrics;
mod ngram;
mod phrases;
mod pipeline;

pub use camera::{CAMERA_MOVES, CameraMoveExtractor};
pub use compressor::{CompressionOutcome, PromptCompressor};
pub use fuser::PromptFuser;
pub use linter::{ContinuityLinter, LintReport};
pub use metrics::BatchMetricsCalculator;
pub use ngram::{
    DEFAULT_NGRAM_SIZE, DEFAULT_SIMILARITY_THRESHOLD, NgramSimilarityDetector, SimilarMatch,
    ngrams,
};
pub use phrases::{FILLER_PHRASES, FILLER_WORDS, PhraseSet};
pub use pipeline::{FusionPipeline, NEAR_DUPLICATE};
