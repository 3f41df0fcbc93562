//! Per-batch quality summary.

use serde::{Deserialize, Serialize};

/// Aggregate quality metrics over one batch of fused segments.
///
/// Recomputed from the batch every time; never updated incrementally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchMetrics {
    /// Segments in the batch
    pub segment_count: usize,
    /// Fraction of segments with no drift and no critic flag
    pub clean_rate: f64,
    /// Mean n-gram overlap
    pub avg_ngram_overlap: f64,
    /// Segments that went through over-budget compression
    pub compressed_count: usize,
    /// Segments with at least one drift flag
    pub drift_count: usize,
    /// Segments with at least one critic flag
    pub critic_count: usize,
    /// Mean redundancy over segments that reported it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_redundancy_score: Option<f64>,
    /// Mean novelty over segments that reported it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_novelty_score: Option<f64>,
    /// Mean continuity confidence over segments that reported it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_continuity_confidence: Option<f64>,
}
