//! Continuum - prompt continuity for AI video generation
//!
//! Continuum turns ordered narrative segments into final video prompts that
//! stay visually consistent across a story. The continuity engine decides
//! deterministically which earlier segment each character and location
//! continues from; an untrusted structured-generation backend only fills in
//! per-segment fields, which are then fused, compressed and linted locally.
//!
//! # Architecture
//!
//! - `continuum_error` - Error types
//! - `continuum_core` - Segments, refs, fused segments, continuity state, telemetry
//! - `continuum_interface` - Generation backend traits
//! - `continuum_continuity` - Alias normalization, profiles, continuity maps, state store
//! - `continuum_prompt` - Fusion, compression, linting, similarity, metrics
//! - `continuum_generation` - Worker pool, retries, batch orchestration, configuration
//!
//! This crate (`continuum`) re-exports everything for convenience.
//!
//! # Example
//!
//! ```
//! use continuum::{AliasNormalizer, ContinuityMapBuilder, PromptCompressor, Segment};
//! use std::collections::BTreeMap;
//!
//! let builder = ContinuityMapBuilder::new(
//!     BTreeMap::new(),
//!     AliasNormalizer::new([("Johnny", "John")]),
//! );
//! let map = builder.build(
//!     &[
//!         Segment::new("s1", 0).with_character_names(vec!["John".to_string()]),
//!         Segment::new("s2", 1).with_character_names(vec!["Johnny".to_string()]),
//!     ],
//!     None,
//! );
//! assert_eq!(map.refs["s2"].continuity_refs_by_character["John"], "s1");
//!
//! let prompt = PromptCompressor::new().compress("a truly stunning harbor", 60);
//! assert_eq!(prompt, "a truly stunning harbor");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod input;

pub use input::{read_json, write_json};

pub use continuum_continuity::*;
pub use continuum_core::*;
pub use continuum_error::*;
pub use continuum_generation::*;
pub use continuum_interface::*;
pub use continuum_prompt::*;
