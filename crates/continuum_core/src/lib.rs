//! Core data types for the Continuum workspace.
//!
//! Every stage of the pipeline exchanges one of these explicit records:
//! [`Segment`] in, [`ContinuityRefs`] from the continuity engine,
//! [`StructuredFields`] from the backend, [`FusedSegment`] out, with
//! [`ContinuityState`] persisted between batches.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod asset;
mod fields;
mod fused;
mod metrics;
mod payload;
mod profile;
mod refs;
mod segment;
mod state;
mod telemetry;
mod words;

pub use asset::{Asset, AssetType, VisualAttributes};
pub use fields::{BatchReply, StructuredFields, MAX_ACTIONS};
pub use fused::{DriftFlag, FusedSegment};
pub use metrics::BatchMetrics;
pub use payload::{BatchPayload, SegmentRequest};
pub use profile::{AppearanceState, CharacterProfile, DEFAULT_STATE_ID};
pub use refs::ContinuityRefs;
pub use segment::Segment;
pub use state::{ContinuityState, LastSeen, RECENT_PROMPT_LIMIT};
pub use telemetry::{LogFormat, TelemetryOptions, init_telemetry, shutdown_telemetry};
pub use words::word_count;
