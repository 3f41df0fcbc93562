//! Deterministic prompt composition.

use continuum_core::{ContinuityRefs, StructuredFields};

/// Composes a final prompt from structured fields and continuity refs.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptFuser;

impl PromptFuser {
    /// Joins the non-blank parts with `"; "` in a fixed order:
    /// identity locklines for first appearances, actions, environment delta,
    /// props delta, shot, lighting.
    ///
    /// Locklines render as `"<Name>: <summary>"` and only for characters in
    /// `first_appearance_by_character`; continuing characters get none.
    pub fn fuse(fields: &StructuredFields, refs: &ContinuityRefs) -> String {
        let mut parts: Vec<String> = Vec::new();

        for name in &refs.first_appearance_by_character {
            if let Some(summary) = refs
                .identity_lockline_by_character
                .get(name)
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
            {
                parts.push(format!("{name}: {summary}"));
            }
        }

        let actions = fields
            .actions
            .iter()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        parts.push(actions);

        parts.extend(fields.environment_delta.iter().map(|d| d.trim().to_string()));
        parts.extend(fields.props_delta.iter().map(|d| d.trim().to_string()));
        parts.push(fields.shot.trim().to_string());
        parts.push(fields.lighting.trim().to_string());

        parts.retain(|p| !p.is_empty());
        parts.join("; ")
    }
}
