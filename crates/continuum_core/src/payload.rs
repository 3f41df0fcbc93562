//! The request sent to the generation backend for one batch.

use crate::ContinuityRefs;
use serde::{Deserialize, Serialize};

/// One segment of a batch request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentRequest {
    /// Segment id the reply must echo as `segment_id`
    pub id: String,
    /// Segment index
    pub index: u32,
    /// Narrative text
    pub text: String,
    /// Host-computed continuity references
    pub continuity_hints: ContinuityRefs,
}

/// Batch payload submitted to a backend session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPayload {
    /// Story id
    pub story_id: String,
    /// Zero-based batch index within the story
    pub batch_index: usize,
    /// Requested segments in index order
    pub segments: Vec<SegmentRequest>,
    /// Free-form guidance lines for the whole batch
    pub batch_brief: Vec<String>,
}

impl BatchPayload {
    /// Ids of the requested segments, in request order.
    pub fn segment_ids(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(|s| s.id.as_str())
    }
}
