//! Per-segment continuity references.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which earlier segments a segment visually continues from.
///
/// Every referenced segment id belongs to a segment whose index is strictly
/// smaller than the index of the segment these refs describe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinuityRefs {
    /// Character name -> id of the nearest preceding segment featuring them
    #[serde(default)]
    pub continuity_refs_by_character: BTreeMap<String, String>,
    /// Id of the nearest preceding segment at the same location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_ref: Option<String>,
    /// Characters appearing for the first time, in segment character order
    #[serde(default)]
    pub first_appearance_by_character: Vec<String>,
    /// Character name -> appearance state id
    #[serde(default)]
    pub appearance_by_character: BTreeMap<String, String>,
    /// Character name -> identity lockline
    #[serde(default)]
    pub identity_lockline_by_character: BTreeMap<String, String>,
}

impl ContinuityRefs {
    /// True when the character continues from an earlier segment.
    pub fn is_continuing(&self, character: &str) -> bool {
        self.continuity_refs_by_character.contains_key(character)
    }

    /// Characters that continue from an earlier segment.
    pub fn continuing_characters(&self) -> impl Iterator<Item = &str> {
        self.continuity_refs_by_character.keys().map(String::as_str)
    }

    /// True when no reference, appearance or lockline is recorded.
    pub fn is_empty(&self) -> bool {
        self.continuity_refs_by_character.is_empty()
            && self.location_ref.is_none()
            && self.first_appearance_by_character.is_empty()
            && self.appearance_by_character.is_empty()
            && self.identity_lockline_by_character.is_empty()
    }
}
