//! Structured creative output returned by the generation backend.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Maximum number of actions kept per segment.
pub const MAX_ACTIONS: usize = 3;

/// Decomposed creative output for one segment, later fused into a prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredFields {
    /// Id of the requested segment this record answers
    pub segment_id: String,
    /// Up to three on-screen actions
    #[serde(default)]
    pub actions: Vec<String>,
    /// Shot / camera description
    #[serde(default)]
    pub shot: String,
    /// Lighting description
    #[serde(default)]
    pub lighting: String,
    /// What changed in the environment since the referenced segment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_delta: Option<String>,
    /// What changed in props since the referenced segment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props_delta: Option<String>,
    /// Self-reported redundancy in [0, 1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redundancy_score: Option<f64>,
    /// Self-reported novelty in [0, 1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub novelty_score: Option<f64>,
    /// Self-reported continuity confidence in [0, 1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuity_confidence: Option<f64>,
    /// Forbidden traits the backend admits to having used
    #[serde(default)]
    pub forbidden_traits_used: Vec<String>,
}

impl StructuredFields {
    /// Normalizes a decoded record at the backend boundary.
    ///
    /// Blank and duplicate actions are dropped (case-insensitive), actions past
    /// [`MAX_ACTIONS`] are discarded, and scores that are not finite or fall
    /// outside `[0, 1]` are treated as not reported.
    pub fn validated(mut self) -> Self {
        let mut seen = std::collections::HashSet::new();
        self.actions = self
            .actions
            .into_iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty() && seen.insert(a.to_lowercase()))
            .collect();
        if self.actions.len() > MAX_ACTIONS {
            warn!(
                segment_id = %self.segment_id,
                actions = self.actions.len(),
                "Dropping actions beyond limit"
            );
            self.actions.truncate(MAX_ACTIONS);
        }

        let segment_id = self.segment_id.clone();
        let check = |name: &str, score: Option<f64>| match score {
            Some(v) if v.is_finite() && (0.0..=1.0).contains(&v) => Some(v),
            Some(v) => {
                warn!(segment_id = %segment_id, score = name, value = v, "Discarding out-of-range score");
                None
            }
            None => None,
        };
        self.redundancy_score = check("redundancy_score", self.redundancy_score);
        self.novelty_score = check("novelty_score", self.novelty_score);
        self.continuity_confidence = check("continuity_confidence", self.continuity_confidence);

        self.forbidden_traits_used.retain(|t| !t.trim().is_empty());
        self
    }
}

/// The document a backend reply must decode into.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReply {
    /// One record per requested segment
    #[serde(default)]
    pub segments: Vec<StructuredFields>,
}
