//! Word-budget prompt compression.

use crate::phrases::{FILLER_PHRASES, FILLER_WORDS, PhraseSet};
use continuum_core::word_count;
use serde::Serialize;
use tracing::debug;

/// Result of [`PromptCompressor::compress_with_stats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, derive_getters::Getters)]
pub struct CompressionOutcome {
    prompt: String,
    words_before: usize,
    words_after: usize,
    over_budget: bool,
}

impl CompressionOutcome {
    /// Consumes the outcome, returning the prompt.
    pub fn into_prompt(self) -> String {
        self.prompt
    }
}

/// Shrinks prompts toward a word budget without reordering or splitting
/// clauses.
///
/// The output never has more words than the input, and compressing a
/// within-budget output again returns it unchanged.
#[derive(Debug, Clone)]
pub struct PromptCompressor {
    phrases: PhraseSet,
    words: PhraseSet,
}

impl Default for PromptCompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptCompressor {
    /// Creates a compressor with the stock filler phrase and word lists.
    pub fn new() -> Self {
        Self {
            phrases: PhraseSet::new(FILLER_PHRASES),
            words: PhraseSet::new(FILLER_WORDS),
        }
    }

    /// Compresses `prompt` toward `target_words`.
    ///
    /// # Examples
    ///
    /// ```
    /// use continuum_prompt::PromptCompressor;
    ///
    /// let compressor = PromptCompressor::new();
    /// let out = compressor.compress(
    ///     "the camera captures a very dramatic shot of the ancient temple at golden hour; wind howls; dust rises",
    ///     8,
    /// );
    /// assert_eq!(out, "dramatic shot of ancient temple at golden hour");
    /// ```
    pub fn compress(&self, prompt: &str, target_words: usize) -> String {
        self.compress_with_stats(prompt, target_words).into_prompt()
    }

    /// Same as [`compress`](Self::compress), also reporting word counts and
    /// whether the over-budget path ran.
    pub fn compress_with_stats(&self, prompt: &str, target_words: usize) -> CompressionOutcome {
        let words_before = word_count(prompt);

        if words_before <= target_words {
            let prompt = normalize_clauses(&self.phrases.strip(prompt));
            return CompressionOutcome {
                words_after: word_count(&prompt),
                prompt,
                words_before,
                over_budget: false,
            };
        }

        // Dropping a filler word can bring a filler phrase together.
        let mut stripped = prompt.to_string();
        loop {
            let next = self.words.strip(&self.phrases.strip(&stripped));
            if next == stripped {
                break;
            }
            stripped = next;
        }
        let mut compressed = normalize_clauses(&stripped);
        if word_count(&compressed) > target_words {
            compressed = truncate_at_clause(&compressed, target_words);
        }

        let words_after = word_count(&compressed);
        debug!(words_before, words_after, target_words, "Compressed prompt");
        CompressionOutcome {
            prompt: compressed,
            words_before,
            words_after,
            over_budget: true,
        }
    }
}

/// Splits on `;`, tidies each clause, drops empty ones and rejoins with `"; "`.
fn normalize_clauses(text: &str) -> String {
    text.split(';')
        .map(tidy_clause)
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Collapses whitespace, removes space before commas and repeated commas, and
/// trims commas off both ends.
fn tidy_clause(clause: &str) -> String {
    let collapsed = clause.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut out = String::with_capacity(collapsed.len());
    for ch in collapsed.chars() {
        if ch == ',' {
            let keep = out.trim_end().len();
            out.truncate(keep);
            if out.ends_with(',') {
                continue;
            }
        }
        out.push(ch);
    }
    out.trim_matches(|c: char| c == ',' || c.is_whitespace())
        .to_string()
}

/// Keeps whole clauses until the running word count reaches `target_words`.
fn truncate_at_clause(normalized: &str, target_words: usize) -> String {
    let mut kept = Vec::new();
    let mut words = 0;
    for clause in normalized.split("; ") {
        kept.push(clause);
        words += word_count(clause);
        if words >= target_words {
            break;
        }
    }
    kept.join("; ")
}
