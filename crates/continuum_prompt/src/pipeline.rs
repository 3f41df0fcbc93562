//! Per-segment fusion and review.

use crate::{
    CameraMoveExtractor, ContinuityLinter, NgramSimilarityDetector, PromptCompressor, PromptFuser,
};
use continuum_core::{CharacterProfile, ContinuityRefs, ContinuityState, FusedSegment, StructuredFields};
use std::collections::BTreeMap;

/// Critic flag for a prompt too similar to a recent prompt.
pub const NEAR_DUPLICATE: &str = "near_duplicate";

/// Turns one segment's structured fields into an annotated [`FusedSegment`].
///
/// Fuse, compress, lint, compare with recent prompts, then collect critic
/// flags. The state is only read; recording the prompt and camera moves is
/// left to the caller so that batches stay all-or-nothing.
#[derive(Debug, Clone, derive_getters::Getters)]
pub struct FusionPipeline {
    linter: ContinuityLinter,
    compressor: PromptCompressor,
    detector: NgramSimilarityDetector,
    camera: CameraMoveExtractor,
    target_words: usize,
}

impl FusionPipeline {
    /// Creates a pipeline for canonical-name keyed `profiles`.
    pub fn new(
        profiles: &BTreeMap<String, CharacterProfile>,
        target_words: usize,
        detector: NgramSimilarityDetector,
    ) -> Self {
        Self {
            linter: ContinuityLinter::new(profiles),
            compressor: PromptCompressor::new(),
            detector,
            camera: CameraMoveExtractor::new(),
            target_words,
        }
    }

    /// Camera moves named in a shot description.
    pub fn camera_moves(&self, shot: &str) -> Vec<String> {
        self.camera.extract(shot)
    }

    /// Fuses and reviews one segment against `state`.
    ///
    /// Critic flags: filler in the fused prompt (even when compression removed
    /// it), tag format problems, [`NEAR_DUPLICATE`], every trait the backend
    /// reports having used as `forbidden_trait_reported:<trait>`, and
    /// `repeated_camera_move:<move>` for moves already recorded in `state`.
    pub fn process(
        &self,
        index: u32,
        fields: StructuredFields,
        refs: ContinuityRefs,
        state: &ContinuityState,
    ) -> FusedSegment {
        let fused = PromptFuser::fuse(&fields, &refs);
        let outcome = self.compressor.compress_with_stats(&fused, self.target_words);
        let over_budget = *outcome.over_budget();

        let mut segment = FusedSegment::new(index, fields, refs, outcome.into_prompt());
        segment.compressed = over_budget;

        let report = self.linter.lint(&segment);
        segment.drift_flags = report.drift_flags;

        let mut critic: Vec<String> = Vec::new();
        critic.extend(self.linter.filler_flags(&fused));
        critic.extend(report.filler_flags);
        critic.extend(report.format_flags);

        segment.ngram_overlap = self
            .detector
            .find_similar_segment(&segment.final_prompt, &state.recent_prompts)
            .map(|m| m.ratio)
            .unwrap_or(0.0);
        if segment.ngram_overlap > *self.detector.threshold() {
            critic.push(NEAR_DUPLICATE.to_string());
        }

        critic.extend(
            segment
                .fields
                .forbidden_traits_used
                .iter()
                .map(|t| format!("forbidden_trait_reported:{}", t.trim().to_lowercase())),
        );
        critic.extend(
            self.camera
                .extract(&segment.fields.shot)
                .into_iter()
                .filter(|m| state.used_camera_moves.contains(m))
                .map(|m| format!("repeated_camera_move:{m}")),
        );

        let mut seen = std::collections::HashSet::new();
        critic.retain(|flag| seen.insert(flag.clone()));
        segment.critic_flags = critic;
        segment
    }
}
