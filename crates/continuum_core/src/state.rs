//! Persisted continuity state, one document per story.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of recent prompts retained for repetition checks.
pub const RECENT_PROMPT_LIMIT: usize = 8;

/// Where an entity was last seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastSeen {
    /// Segment id
    pub segment_id: String,
    /// Segment index
    pub index: u32,
    /// Storyline of that segment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storyline_id: Option<String>,
}

impl LastSeen {
    /// True when a segment on `storyline` may continue from this record.
    ///
    /// An unset storyline on either side is compatible with everything.
    pub fn storyline_compatible(&self, storyline: Option<&str>) -> bool {
        match (self.storyline_id.as_deref(), storyline) {
            (Some(last), Some(current)) => last == current,
            _ => true,
        }
    }
}

/// Continuity state carried from batch to batch of one story.
///
/// `lastSeen*` entries are never removed and their indices never decrease.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinuityState {
    /// Character name -> last appearance
    #[serde(default)]
    pub last_seen_character: BTreeMap<String, LastSeen>,
    /// Location name -> last appearance
    #[serde(default)]
    pub last_seen_location: BTreeMap<String, LastSeen>,
    /// Most recent final prompts, oldest first
    #[serde(default)]
    pub recent_prompts: Vec<String>,
    /// Camera moves already used in the story
    #[serde(default)]
    pub used_camera_moves: Vec<String>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl Default for ContinuityState {
    fn default() -> Self {
        Self::new()
    }
}

impl ContinuityState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self {
            last_seen_character: BTreeMap::new(),
            last_seen_location: BTreeMap::new(),
            recent_prompts: Vec::new(),
            used_camera_moves: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Appends a prompt, keeping at most [`RECENT_PROMPT_LIMIT`].
    pub fn remember_prompt(&mut self, prompt: impl Into<String>) {
        self.remember_prompt_bounded(prompt, RECENT_PROMPT_LIMIT);
    }

    /// Appends a prompt, keeping at most `limit` (itself capped at [`RECENT_PROMPT_LIMIT`]).
    pub fn remember_prompt_bounded(&mut self, prompt: impl Into<String>, limit: usize) {
        let limit = limit.clamp(1, RECENT_PROMPT_LIMIT);
        self.recent_prompts.push(prompt.into());
        if self.recent_prompts.len() > limit {
            let excess = self.recent_prompts.len() - limit;
            self.recent_prompts.drain(..excess);
        }
    }

    /// Records a camera move. Returns false if it was already recorded.
    pub fn record_camera_move(&mut self, camera_move: impl Into<String>) -> bool {
        let camera_move = camera_move.into();
        if self.used_camera_moves.contains(&camera_move) {
            return false;
        }
        self.used_camera_moves.push(camera_move);
        true
    }

    /// Stamps the state with the current time.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
