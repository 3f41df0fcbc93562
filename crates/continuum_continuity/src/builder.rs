//! Per-segment continuity reference computation.

use crate::AliasNormalizer;
use continuum_core::{CharacterProfile, ContinuityRefs, ContinuityState, LastSeen, Segment};
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};

/// Output of [`ContinuityMapBuilder::build`].
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuityMap {
    /// Segment id -> references
    pub refs: BTreeMap<String, ContinuityRefs>,
    /// State after every segment has been recorded
    pub state: ContinuityState,
}

/// Computes continuity references for ordered segments.
///
/// A reference always points at the nearest preceding segment that shares the
/// entity and has a compatible storyline, never at the segment itself.
#[derive(Debug, Clone, derive_getters::Getters)]
pub struct ContinuityMapBuilder {
    profiles: BTreeMap<String, CharacterProfile>,
    normalizer: AliasNormalizer,
}

impl ContinuityMapBuilder {
    /// Creates a builder. Profile keys are normalized with the same alias table
    /// as segment names.
    pub fn new(profiles: BTreeMap<String, CharacterProfile>, normalizer: AliasNormalizer) -> Self {
        let profiles = profiles
            .into_iter()
            .map(|(name, profile)| (normalizer.normalize(&name), profile))
            .collect();
        Self {
            profiles,
            normalizer,
        }
    }

    /// Computes refs for `segments` in ascending index order, continuing from
    /// `prior` when given.
    #[instrument(skip_all, fields(segments = segments.len(), has_prior = prior.is_some()))]
    pub fn build(&self, segments: &[Segment], prior: Option<&ContinuityState>) -> ContinuityMap {
        let mut state = prior.cloned().unwrap_or_default();
        let mut ordered: Vec<&Segment> = segments.iter().collect();
        ordered.sort_by_key(|s| s.index);

        let mut refs = BTreeMap::new();
        for segment in ordered {
            let segment_refs = self.refs_for(segment, &state);
            self.record(segment, &mut state);
            refs.insert(segment.id.clone(), segment_refs);
        }

        debug!(
            characters = state.last_seen_character.len(),
            locations = state.last_seen_location.len(),
            "Continuity map built"
        );
        ContinuityMap { refs, state }
    }

    /// Canonical character names of a segment, duplicates removed.
    pub fn characters_of(&self, segment: &Segment) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(segment.character_names.len());
        for raw in &segment.character_names {
            let name = self.normalizer.normalize(raw);
            if !name.trim().is_empty() && !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    fn location_of(&self, segment: &Segment) -> Option<String> {
        segment
            .location_name
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .map(|l| self.normalizer.normalize(l))
    }

    /// Returns the record `segment` may reference, if any.
    fn usable<'a>(last: Option<&'a LastSeen>, segment: &Segment) -> Option<&'a LastSeen> {
        let last = last?;
        if last.index >= segment.index {
            warn!(
                segment_id = %segment.id,
                index = segment.index,
                last_index = last.index,
                "Ignoring continuity record at or after the current segment"
            );
            return None;
        }
        last.storyline_compatible(segment.storyline_id.as_deref())
            .then_some(last)
    }

    fn refs_for(&self, segment: &Segment, state: &ContinuityState) -> ContinuityRefs {
        let mut refs = ContinuityRefs::default();

        for name in self.characters_of(segment) {
            match Self::usable(state.last_seen_character.get(&name), segment) {
                Some(last) => {
                    refs.continuity_refs_by_character
                        .insert(name.clone(), last.segment_id.clone());
                }
                None => refs.first_appearance_by_character.push(name.clone()),
            }

            if let Some(profile) = self.profiles.get(&name) {
                refs.appearance_by_character
                    .insert(name.clone(), profile.default_state_id().clone());
                if let Some(default_state) = profile.default_state() {
                    refs.identity_lockline_by_character
                        .insert(name, default_state.summary.clone());
                }
            }
        }

        if let Some(location) = self.location_of(segment) {
            refs.location_ref = Self::usable(state.last_seen_location.get(&location), segment)
                .map(|last| last.segment_id.clone());
        }

        refs
    }

    fn record(&self, segment: &Segment, state: &mut ContinuityState) {
        let seen = LastSeen {
            segment_id: segment.id.clone(),
            index: segment.index,
            storyline_id: segment.storyline_id.clone(),
        };
        for name in self.characters_of(segment) {
            Self::advance(&mut state.last_seen_character, name, &seen);
        }
        if let Some(location) = self.location_of(segment) {
            Self::advance(&mut state.last_seen_location, location, &seen);
        }
    }

    /// Moves a record forward; indices never decrease.
    fn advance(map: &mut BTreeMap<String, LastSeen>, name: String, seen: &LastSeen) {
        match map.get(&name) {
            Some(existing) if existing.index >= seen.index => {}
            _ => {
                map.insert(name, seen.clone());
            }
        }
    }
}
