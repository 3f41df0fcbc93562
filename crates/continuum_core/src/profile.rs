//! Character profiles derived from assets.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// State id assigned to the appearance every profile starts in.
pub const DEFAULT_STATE_ID: &str = "default";

/// One appearance of a character (a wardrobe/look).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppearanceState {
    /// State id
    pub id: String,
    /// Canonical one-line physical description (the identity lockline)
    pub summary: String,
    /// Keywords that must not be restated once the character is established
    pub forbidden_traits: Vec<String>,
}

/// Per-character appearance profile. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
#[serde(rename_all = "camelCase")]
pub struct CharacterProfile {
    name: String,
    default_state_id: String,
    states: BTreeMap<String, AppearanceState>,
}

impl CharacterProfile {
    /// Creates a profile holding a single default state.
    pub fn with_default_state(name: impl Into<String>, state: AppearanceState) -> Self {
        let mut states = BTreeMap::new();
        let default_state_id = state.id.clone();
        states.insert(state.id.clone(), state);
        Self {
            name: name.into(),
            default_state_id,
            states,
        }
    }

    /// The default appearance state.
    pub fn default_state(&self) -> Option<&AppearanceState> {
        self.states.get(&self.default_state_id)
    }

    /// Looks up a state by id, falling back to the default state.
    pub fn state_or_default(&self, state_id: Option<&str>) -> Option<&AppearanceState> {
        state_id
            .and_then(|id| self.states.get(id))
            .or_else(|| self.default_state())
    }
}
