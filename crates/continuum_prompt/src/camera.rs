//! Camera move vocabulary.

use crate::PhraseSet;

/// Camera moves recognised in shot descriptions. Longer moves win over the
/// shorter moves they contain.
pub const CAMERA_MOVES: &[&str] = &[
    "dolly in",
    "dolly out",
    "dolly zoom",
    "dolly",
    "push in",
    "pull back",
    "pull out",
    "tracking shot",
    "tracking",
    "whip pan",
    "pan left",
    "pan right",
    "pan",
    "tilt up",
    "tilt down",
    "tilt",
    "crane up",
    "crane down",
    "crane",
    "zoom in",
    "zoom out",
    "crash zoom",
    "zoom",
    "orbit",
    "arc shot",
    "handheld",
    "steadicam",
    "aerial",
    "drone shot",
    "static shot",
    "locked-off",
    "rack focus",
];

/// Extracts known camera moves from a shot description.
#[derive(Debug, Clone)]
pub struct CameraMoveExtractor {
    moves: PhraseSet,
}

impl Default for CameraMoveExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraMoveExtractor {
    /// Creates an extractor over [`CAMERA_MOVES`].
    pub fn new() -> Self {
        Self {
            moves: PhraseSet::new(CAMERA_MOVES),
        }
    }

    /// Distinct moves in order of appearance, lowercase.
    ///
    /// ```
    /// use continuum_prompt::CameraMoveExtractor;
    ///
    /// let moves = CameraMoveExtractor::new().extract("Slow dolly in, then a whip pan");
    /// assert_eq!(moves, vec!["dolly in", "whip pan"]);
    /// ```
    pub fn extract(&self, shot: &str) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        let mut claimed_until = 0;
        for (start, end, name) in self.moves.spans(shot) {
            if start < claimed_until {
                continue;
            }
            claimed_until = end;
            if !found.iter().any(|m| m == name) {
                found.push(name.to_string());
            }
        }
        found
    }
}
