//! Case-insensitive whole-phrase matching.

use regex::Regex;
use tracing::warn;

/// Stock camera and mood clichés that add words without adding picture.
pub const FILLER_PHRASES: &[&str] = &[
    "the camera captures",
    "the camera shows",
    "the camera reveals",
    "we see",
    "in this shot",
    "in this scene",
    "cinematic masterpiece",
    "visually stunning",
    "breathtaking view",
    "stunning visuals",
    "evoking a sense of",
    "creating a sense of",
    "a feeling of",
    "masterfully composed",
    "beautifully composed",
    "award-winning",
];

/// Words dropped when a prompt is over its word budget.
pub const FILLER_WORDS: &[&str] = &[
    "the",
    "a",
    "an",
    "very",
    "really",
    "quite",
    "just",
    "extremely",
    "incredibly",
    "truly",
    "somewhat",
    "rather",
    "highly",
];

/// A fixed list of phrases compiled to case-insensitive, whole-word patterns.
///
/// Whitespace inside a phrase matches any run of whitespace, so
/// `"the camera captures"` also matches `"The  camera\ncaptures"`.
#[derive(Debug, Clone, Default)]
pub struct PhraseSet {
    entries: Vec<(String, Regex)>,
}

impl PhraseSet {
    /// Compiles `phrases`; blank phrases are skipped.
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries = Vec::new();
        for phrase in phrases {
            let phrase = phrase.as_ref().trim().to_lowercase();
            if phrase.is_empty() || entries.iter().any(|(p, _)| *p == phrase) {
                continue;
            }
            match Regex::new(&Self::pattern(&phrase)) {
                Ok(regex) => entries.push((phrase, regex)),
                Err(e) => warn!(phrase = %phrase, error = %e, "Skipping phrase that failed to compile"),
            }
        }
        Self { entries }
    }

    fn pattern(phrase: &str) -> String {
        let is_word = |c: char| c.is_alphanumeric() || c == '_';
        let body = phrase
            .split_whitespace()
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(r"\s+");
        let lead = if phrase.starts_with(is_word) { r"\b" } else { "" };
        let tail = if phrase.ends_with(is_word) { r"\b" } else { "" };
        format!("(?i){lead}{body}{tail}")
    }

    /// Phrases present in `text`, in list order.
    pub fn find(&self, text: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, regex)| regex.is_match(text))
            .map(|(phrase, _)| phrase.as_str())
            .collect()
    }

    /// Every occurrence as `(start, end, phrase)`, sorted by start and, for
    /// equal starts, longest first. Occurrences may overlap.
    pub fn spans(&self, text: &str) -> Vec<(usize, usize, &str)> {
        let mut spans: Vec<(usize, usize, &str)> = self
            .entries
            .iter()
            .flat_map(|(phrase, regex)| {
                regex
                    .find_iter(text)
                    .map(move |m| (m.start(), m.end(), phrase.as_str()))
            })
            .collect();
        spans.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));
        spans
    }

    /// Removes every phrase until none is left. May leave doubled whitespace.
    pub fn strip(&self, text: &str) -> String {
        let mut current = text.to_string();
        loop {
            let next = self
                .entries
                .iter()
                .fold(current.clone(), |acc, (_, regex)| {
                    regex.replace_all(&acc, "").into_owned()
                });
            if next == current {
                return current;
            }
            current = next;
        }
    }

    /// Number of compiled phrases.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no phrase compiled.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_whole_words_only() {
        let set = PhraseSet::new(["the", "beard"]);
        assert_eq!(set.find("The bearded man"), vec!["the"]);
        assert!(set.find("theatre").is_empty());
    }

    #[test]
    fn phrase_whitespace_is_flexible() {
        let set = PhraseSet::new(FILLER_PHRASES);
        assert_eq!(set.find("The  camera\ncaptures a ship"), vec!["the camera captures"]);
    }

    #[test]
    fn strip_reaches_fixpoint() {
        let set = PhraseSet::new(["we see"]);
        assert_eq!(set.strip("we we see see a gull").trim(), "a gull");
    }

    #[test]
    fn hyphenated_phrases_match() {
        let set = PhraseSet::new(["clean-shaven"]);
        assert_eq!(set.find("a Clean-Shaven sailor"), vec!["clean-shaven"]);
    }

    #[test]
    fn spans_prefer_longest_at_same_start() {
        let set = PhraseSet::new(["dolly", "dolly in"]);
        let spans = set.spans("slow dolly in");
        assert_eq!(spans[0].2, "dolly in");
        assert_eq!(spans[1].2, "dolly");
    }
}
