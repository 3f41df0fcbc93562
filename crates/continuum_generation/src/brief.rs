//! Batch-level instructions sent alongside the segments.

use continuum_core::{ContinuityRefs, ContinuityState};
use std::collections::BTreeSet;

/// Recent prompts quoted in a brief.
pub const BRIEF_RECENT_PROMPTS: usize = 3;

/// Builds the brief for one batch.
///
/// Lines, in order: a header naming the story, batch and expected segment
/// ids; camera moves already used; continuing characters whose fixed traits
/// must not be restated; up to [`BRIEF_RECENT_PROMPTS`] recent prompts, newest
/// last. Lines with nothing to say are omitted.
pub fn batch_brief<'a>(
    story_id: &str,
    batch_index: usize,
    batch_count: usize,
    segment_ids: &[&str],
    refs: impl IntoIterator<Item = &'a ContinuityRefs>,
    state: &ContinuityState,
) -> Vec<String> {
    let mut brief = vec![format!(
        "Story {story_id}, batch {} of {batch_count}: return exactly one record per segment id ({})",
        batch_index + 1,
        segment_ids.join(", ")
    )];

    if !state.used_camera_moves.is_empty() {
        brief.push(format!(
            "Camera moves already used, prefer others: {}",
            state.used_camera_moves.join(", ")
        ));
    }

    let continuing: BTreeSet<&str> = refs
        .into_iter()
        .flat_map(ContinuityRefs::continuing_characters)
        .collect();
    if !continuing.is_empty() {
        brief.push(format!(
            "Do not restate fixed physical traits of continuing characters: {}",
            continuing.into_iter().collect::<Vec<_>>().join(", ")
        ));
    }

    let skip = state.recent_prompts.len().saturating_sub(BRIEF_RECENT_PROMPTS);
    brief.extend(
        state
            .recent_prompts
            .iter()
            .skip(skip)
            .map(|p| format!("Recent prompt, do not repeat: {p}")),
    );
    brief
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_batch_has_header_only() {
        let none: [&ContinuityRefs; 0] = [];
        let brief = batch_brief("tale", 0, 2, &["s1", "s2"], none, &ContinuityState::new());
        assert_eq!(
            brief,
            vec!["Story tale, batch 1 of 2: return exactly one record per segment id (s1, s2)"]
        );
    }

    #[test]
    fn later_batches_carry_history() {
        let mut state = ContinuityState::new();
        for prompt in ["p1", "p2", "p3", "p4"] {
            state.remember_prompt(prompt);
        }
        state.record_camera_move("dolly in");

        let mut refs = ContinuityRefs::default();
        refs.continuity_refs_by_character
            .insert("John".to_string(), "s1".to_string());
        let mut more = ContinuityRefs::default();
        more.continuity_refs_by_character
            .insert("John".to_string(), "s3".to_string());
        more.continuity_refs_by_character
            .insert("Ana".to_string(), "s2".to_string());

        let brief = batch_brief("tale", 1, 2, &["s4", "s5"], [&refs, &more], &state);
        assert_eq!(brief[1], "Camera moves already used, prefer others: dolly in");
        assert_eq!(
            brief[2],
            "Do not restate fixed physical traits of continuing characters: Ana, John"
        );
        assert_eq!(brief.len(), 6);
        assert!(brief[3].ends_with("p2"));
        assert!(brief[5].ends_with("p4"));
    }
}
