//! Final per-segment output handed downstream.

use crate::{ContinuityRefs, StructuredFields};
use serde::{Deserialize, Serialize};

/// A forbidden trait restated for a continuing character.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DriftFlag {
    /// Character whose trait was restated
    pub character: String,
    /// The forbidden keyword found in the prompt
    #[serde(rename = "trait")]
    pub keyword: String,
}

impl DriftFlag {
    /// Creates a drift flag.
    pub fn new(character: impl Into<String>, keyword: impl Into<String>) -> Self {
        Self {
            character: character.into(),
            keyword: keyword.into(),
        }
    }
}

impl std::fmt::Display for DriftFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "drift:{}:{}", self.character, self.keyword)
    }
}

/// Structured output fused into a final prompt, with QA annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FusedSegment {
    /// Segment id
    pub segment_id: String,
    /// Segment index
    pub index: u32,
    /// Backend output the prompt was fused from
    pub fields: StructuredFields,
    /// Continuity references used for fusion
    pub continuity: ContinuityRefs,
    /// Final prompt
    pub final_prompt: String,
    /// Restated forbidden traits
    #[serde(default)]
    pub drift_flags: Vec<DriftFlag>,
    /// Quality issues other than drift
    #[serde(default)]
    pub critic_flags: Vec<String>,
    /// Highest n-gram overlap with a recent prompt
    #[serde(default)]
    pub ngram_overlap: f64,
    /// True when the prompt went through over-budget compression
    #[serde(default)]
    pub compressed: bool,
}

impl FusedSegment {
    /// Creates an unannotated fused segment.
    pub fn new(
        index: u32,
        fields: StructuredFields,
        continuity: ContinuityRefs,
        final_prompt: impl Into<String>,
    ) -> Self {
        Self {
            segment_id: fields.segment_id.clone(),
            index,
            fields,
            continuity,
            final_prompt: final_prompt.into(),
            drift_flags: Vec::new(),
            critic_flags: Vec::new(),
            ngram_overlap: 0.0,
            compressed: false,
        }
    }

    /// True when no drift and no critic flag was raised.
    pub fn is_clean(&self) -> bool {
        self.drift_flags.is_empty() && self.critic_flags.is_empty()
    }
}
