//! Story-level request and outcome records.

use continuum_core::{Asset, BatchMetrics, FusedSegment, Segment};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Everything needed to generate prompts for one story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_builder::Builder)]
#[serde(rename_all = "camelCase")]
#[builder(setter(into))]
pub struct StoryRequest {
    /// Story id; also names the continuity state file
    story_id: String,
    /// Segments in any order; processed by ascending index
    segments: Vec<Segment>,
    /// Read-only asset records for character profiles
    #[builder(default)]
    #[serde(default)]
    assets: Vec<Asset>,
    /// First batch to generate; earlier batches are assumed persisted
    #[builder(default)]
    #[serde(default)]
    start_batch: usize,
}

impl StoryRequest {
    /// Create a request builder.
    pub fn builder() -> StoryRequestBuilder {
        StoryRequestBuilder::default()
    }
}

/// Result of one generated batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    /// Zero-based batch index
    batch_index: usize,
    /// Attempts it took
    attempts: usize,
    /// One fused segment per requested segment, in index order
    segments: Vec<FusedSegment>,
    /// Quality metrics for the batch
    metrics: BatchMetrics,
}

impl BatchOutcome {
    /// Creates a batch outcome.
    pub fn new(
        batch_index: usize,
        attempts: usize,
        segments: Vec<FusedSegment>,
        metrics: BatchMetrics,
    ) -> Self {
        Self {
            batch_index,
            attempts,
            segments,
            metrics,
        }
    }
}

/// Result of a story generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct StoryOutcome {
    /// Story id
    story_id: String,
    /// Attempts for a prior run that were cancelled before starting
    cancelled_in_flight: usize,
    /// Batches skipped because of `start_batch`
    skipped_batches: usize,
    /// Batches generated by this call, ascending
    batches: Vec<BatchOutcome>,
}

impl StoryOutcome {
    pub(crate) fn new(story_id: impl Into<String>, cancelled_in_flight: usize) -> Self {
        Self {
            story_id: story_id.into(),
            cancelled_in_flight,
            skipped_batches: 0,
            batches: Vec::new(),
        }
    }

    pub(crate) fn skip(&mut self) {
        self.skipped_batches += 1;
    }

    pub(crate) fn push(&mut self, batch: BatchOutcome) {
        self.batches.push(batch);
    }

    /// All fused segments generated by this call, in index order.
    pub fn fused_segments(&self) -> impl Iterator<Item = &FusedSegment> {
        self.batches.iter().flat_map(|b| b.segments.iter())
    }
}
