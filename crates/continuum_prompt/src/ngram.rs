//! Word n-gram overlap between prompts.

use serde::Serialize;
use std::collections::HashSet;

/// Shingle length used when none is configured.
pub const DEFAULT_NGRAM_SIZE: usize = 4;

/// Overlap above which a prompt counts as a near duplicate.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.25;

/// Set of contiguous `n`-word shingles of `text`.
///
/// Text is lowercased and stripped of everything that is neither alphanumeric
/// nor whitespace before splitting. Texts shorter than `n` words have no
/// shingles; `n == 0` is treated as 1.
///
/// # Examples
///
/// ```
/// use continuum_prompt::ngrams;
///
/// let grams = ngrams("Waves break, gulls cry!", 2);
/// assert!(grams.contains("break gulls"));
/// assert_eq!(grams.len(), 3);
/// ```
pub fn ngrams(text: &str, n: usize) -> HashSet<String> {
    let n = n.max(1);
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    let tokens: Vec<&str> = cleaned.split_whitespace().collect();
    tokens.windows(n).map(|w| w.join(" ")).collect()
}

/// The most similar earlier text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimilarMatch {
    /// Position of the text in the candidate list
    pub index: usize,
    /// Overlap ratio with that text
    pub ratio: f64,
}

/// Flags prompts that repeat recent prompts.
#[derive(Debug, Clone, Copy, PartialEq, derive_getters::Getters)]
pub struct NgramSimilarityDetector {
    n: usize,
    threshold: f64,
}

impl Default for NgramSimilarityDetector {
    fn default() -> Self {
        Self::new(DEFAULT_NGRAM_SIZE, DEFAULT_SIMILARITY_THRESHOLD)
    }
}

impl NgramSimilarityDetector {
    /// Creates a detector; `n` is at least 1.
    pub fn new(n: usize, threshold: f64) -> Self {
        Self {
            n: n.max(1),
            threshold,
        }
    }

    /// `|A ∩ B| / min(|A|, |B|)` over the shingle sets, 0 when either is empty.
    pub fn overlap_ratio(&self, a: &str, b: &str) -> f64 {
        let a = ngrams(a, self.n);
        let b = ngrams(b, self.n);
        let smaller = a.len().min(b.len());
        if smaller == 0 {
            return 0.0;
        }
        a.intersection(&b).count() as f64 / smaller as f64
    }

    /// True when `text` overlaps any of `recent` by more than the threshold.
    pub fn is_too_similar<S: AsRef<str>>(&self, text: &str, recent: &[S]) -> bool {
        recent
            .iter()
            .any(|r| self.overlap_ratio(text, r.as_ref()) > self.threshold)
    }

    /// The candidate with the highest overlap, first one on ties.
    ///
    /// Returns `None` when no candidate shares a shingle with `text`.
    pub fn find_similar_segment<S: AsRef<str>>(
        &self,
        text: &str,
        candidates: &[S],
    ) -> Option<SimilarMatch> {
        let mut best: Option<SimilarMatch> = None;
        for (index, candidate) in candidates.iter().enumerate() {
            let ratio = self.overlap_ratio(text, candidate.as_ref());
            if ratio > 0.0 && best.is_none_or(|b| ratio > b.ratio) {
                best = Some(SimilarMatch { index, ratio });
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HARBOR: &str = "fishing boats rock gently in the harbor at dusk";

    #[test]
    fn identical_text_overlaps_fully() {
        let detector = NgramSimilarityDetector::default();
        assert_eq!(detector.overlap_ratio(HARBOR, HARBOR), 1.0);
        assert_eq!(
            detector.overlap_ratio(HARBOR, "FISHING boats, rock gently; in the harbor at dusk!"),
            1.0
        );
    }

    #[test]
    fn disjoint_vocabularies_do_not_overlap() {
        let detector = NgramSimilarityDetector::default();
        assert_eq!(
            detector.overlap_ratio(HARBOR, "a lone hawk circles over burning wheat fields"),
            0.0
        );
    }

    #[test]
    fn short_texts_have_no_shingles() {
        let detector = NgramSimilarityDetector::default();
        assert!(ngrams("three words only", 4).is_empty());
        assert_eq!(detector.overlap_ratio("three words only", HARBOR), 0.0);
    }

    #[test]
    fn ratio_uses_smaller_set() {
        let detector = NgramSimilarityDetector::new(2, 0.25);
        // 1 of 2 bigrams in the shorter text are shared.
        assert_eq!(detector.overlap_ratio("boats rock hard", HARBOR), 0.5);
    }

    #[test]
    fn threshold_is_exclusive() {
        let detector = NgramSimilarityDetector::new(2, 0.5);
        assert!(!detector.is_too_similar("boats rock hard", &[HARBOR]));
        let detector = NgramSimilarityDetector::new(2, 0.49);
        assert!(detector.is_too_similar("boats rock hard", &[HARBOR]));
        assert!(!detector.is_too_similar::<&str>(HARBOR, &[]));
    }

    #[test]
    fn finds_most_similar_candidate() {
        let detector = NgramSimilarityDetector::default();
        let candidates = [
            "a lone hawk circles over burning wheat fields",
            "fishing boats rock gently beside the pier",
            HARBOR,
        ];
        let found = detector.find_similar_segment(HARBOR, &candidates);
        assert_eq!(found, Some(SimilarMatch { index: 2, ratio: 1.0 }));
        assert_eq!(detector.find_similar_segment(HARBOR, &candidates[..1]), None);
    }
}
