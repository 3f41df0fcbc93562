//! Deterministic continuity engine.
//!
//! Computes, for every segment, which earlier segment each character and
//! location should visually continue from, and persists the state that
//! carries those decisions from one batch to the next.
//!
//! # Example
//!
//! ```
//! use continuum_continuity::{AliasNormalizer, ContinuityMapBuilder};
//! use continuum_core::Segment;
//! use std::collections::BTreeMap;
//!
//! let builder = ContinuityMapBuilder::new(BTreeMap::new(), AliasNormalizer::default());
//! let segments = vec![
//!     Segment::new("s1", 0).with_character_names(vec!["John".to_string()]),
//!     Segment::new("s2", 1).with_character_names(vec!["Mary".to_string()]),
//!     Segment::new("s3", 2).with_character_names(vec!["John".to_string()]),
//! ];
//!
//! let map = builder.build(&segments, None);
//! assert_eq!(map.refs["s3"].continuity_refs_by_character["John"], "s1");
//! assert_eq!(map.refs["s1"].first_appearance_by_character, vec!["John"]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod alias;
mod builder;
mod profile;
mod store;

pub use alias::AliasNormalizer;
pub use builder::{ContinuityMap, ContinuityMapBuilder};
pub use profile::{CharacterProfileLoader, TraitCategory};
pub use store::ContinuityStore;
