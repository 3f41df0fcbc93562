//! Rule-based continuity and format checks on fused prompts.

use crate::phrases::{FILLER_PHRASES, PhraseSet};
use continuum_core::{CharacterProfile, DriftFlag, FusedSegment};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Characters that never belong in a prompt outside of tag syntax.
const STRAY_MARKERS: &[char] = &['{', '}', '<', '>', '|', '*', '#', '`', '~'];

/// Findings for one fused segment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LintReport {
    /// Forbidden traits restated for continuing characters
    pub drift_flags: Vec<DriftFlag>,
    /// Stock filler phrases, as `filler:<phrase>`
    pub filler_flags: Vec<String>,
    /// Malformed tag syntax, as `format:<problem>`
    pub format_flags: Vec<String>,
    /// Every flag above, drift flags rendered as `drift:<character>:<trait>`
    pub all_flags: Vec<String>,
}

impl LintReport {
    /// True when nothing was flagged.
    pub fn is_clean(&self) -> bool {
        self.all_flags.is_empty()
    }
}

/// Detects drift, filler and malformed tags in fused prompts.
///
/// Drift is only checked for characters that continue from an earlier
/// segment; a first appearance is expected to state the character's traits.
#[derive(Debug, Clone)]
pub struct ContinuityLinter {
    traits: BTreeMap<(String, String), PhraseSet>,
    default_states: BTreeMap<String, String>,
    filler: PhraseSet,
}

impl ContinuityLinter {
    /// Compiles the forbidden traits of every appearance state of every
    /// profile. Profile keys must be canonical character names.
    pub fn new(profiles: &BTreeMap<String, CharacterProfile>) -> Self {
        let traits = profiles
            .iter()
            .flat_map(|(name, profile)| {
                profile.states().iter().map(move |(state_id, state)| {
                    (
                        (name.clone(), state_id.clone()),
                        PhraseSet::new(&state.forbidden_traits),
                    )
                })
            })
            .collect();
        let default_states = profiles
            .iter()
            .map(|(name, profile)| (name.clone(), profile.default_state_id().clone()))
            .collect();
        Self {
            traits,
            default_states,
            filler: PhraseSet::new(FILLER_PHRASES),
        }
    }

    fn traits_for(&self, character: &str, state_id: Option<&str>) -> Option<&PhraseSet> {
        let lookup = |id: &str| self.traits.get(&(character.to_string(), id.to_string()));
        state_id.and_then(lookup).or_else(|| {
            self.default_states
                .get(character)
                .and_then(|id| lookup(id))
        })
    }

    /// Lints the final prompt of `segment`.
    pub fn lint(&self, segment: &FusedSegment) -> LintReport {
        let prompt = segment.final_prompt.as_str();
        let refs = &segment.continuity;

        let mut drift_flags = Vec::new();
        for character in refs.continuing_characters() {
            let state_id = refs.appearance_by_character.get(character).map(String::as_str);
            if let Some(traits) = self.traits_for(character, state_id) {
                drift_flags.extend(
                    traits
                        .find(prompt)
                        .into_iter()
                        .map(|keyword| DriftFlag::new(character, keyword)),
                );
            }
        }

        let filler_flags = self.filler_flags(prompt);
        let format_flags = self.format_flags(prompt);

        let all_flags = drift_flags
            .iter()
            .map(ToString::to_string)
            .chain(filler_flags.iter().cloned())
            .chain(format_flags.iter().cloned())
            .collect();

        let report = LintReport {
            drift_flags,
            filler_flags,
            format_flags,
            all_flags,
        };
        if !report.is_clean() {
            debug!(segment_id = %segment.segment_id, flags = ?report.all_flags, "Lint findings");
        }
        report
    }

    /// Stock filler phrases in `text`, as `filler:<phrase>`.
    pub fn filler_flags(&self, text: &str) -> Vec<String> {
        self.filler
            .find(text)
            .into_iter()
            .map(|p| format!("filler:{p}"))
            .collect()
    }

    /// Tag syntax problems in `text`, as `format:<problem>`.
    pub fn format_flags(&self, text: &str) -> Vec<String> {
        format_problems(text)
            .into_iter()
            .map(|p| format!("format:{p}"))
            .collect()
    }
}

/// Distinct tag syntax problems in `prompt`, sorted.
fn format_problems(prompt: &str) -> BTreeSet<String> {
    let mut problems = BTreeSet::new();
    let mut depth = 0usize;
    let mut tag_has_content = false;
    let mut previous: Option<char> = None;

    for ch in prompt.chars() {
        match ch {
            '[' => {
                if previous == Some('[') {
                    problems.insert("duplicated_bracket".to_string());
                }
                if depth > 0 {
                    problems.insert("nested_bracket".to_string());
                }
                depth += 1;
                tag_has_content = false;
            }
            ']' => {
                if previous == Some(']') {
                    problems.insert("duplicated_bracket".to_string());
                }
                if depth == 0 {
                    problems.insert("unmatched_bracket".to_string());
                } else {
                    if !tag_has_content && previous != Some(']') {
                        problems.insert("empty_tag".to_string());
                    }
                    depth -= 1;
                }
            }
            c if STRAY_MARKERS.contains(&c) => {
                problems.insert(format!("stray_marker:{c}"));
            }
            c => {
                if depth > 0 && !c.is_whitespace() {
                    tag_has_content = true;
                }
            }
        }
        previous = Some(ch);
    }

    if depth > 0 {
        problems.insert("unclosed_bracket".to_string());
    }
    problems
}
