//! Per-batch quality aggregation.

use continuum_core::{BatchMetrics, FusedSegment, StructuredFields};

/// Aggregates [`BatchMetrics`] from a batch of fused segments.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchMetricsCalculator;

impl BatchMetricsCalculator {
    /// Computes metrics over `segments`.
    ///
    /// Score averages only include segments that reported the score. An empty
    /// batch yields zeroes and no score averages.
    pub fn calculate(segments: &[FusedSegment]) -> BatchMetrics {
        if segments.is_empty() {
            return BatchMetrics::default();
        }
        let count = segments.len() as f64;

        let clean = segments.iter().filter(|s| s.is_clean()).count();
        let overlap: f64 = segments.iter().map(|s| s.ngram_overlap).sum();

        BatchMetrics {
            segment_count: segments.len(),
            clean_rate: clean as f64 / count,
            avg_ngram_overlap: overlap / count,
            compressed_count: segments.iter().filter(|s| s.compressed).count(),
            drift_count: segments.iter().filter(|s| !s.drift_flags.is_empty()).count(),
            critic_count: segments.iter().filter(|s| !s.critic_flags.is_empty()).count(),
            avg_redundancy_score: mean_reported(segments, |f| f.redundancy_score),
            avg_novelty_score: mean_reported(segments, |f| f.novelty_score),
            avg_continuity_confidence: mean_reported(segments, |f| f.continuity_confidence),
        }
    }
}

fn mean_reported<F>(segments: &[FusedSegment], score: F) -> Option<f64>
where
    F: Fn(&StructuredFields) -> Option<f64>,
{
    let reported: Vec<f64> = segments.iter().filter_map(|s| score(&s.fields)).collect();
    if reported.is_empty() {
        None
    } else {
        Some(reported.iter().sum::<f64>() / reported.len() as f64)
    }
}
