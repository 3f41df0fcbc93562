//! Word counting shared by the compressor and the orchestrator.

/// Counts words, treating whitespace and `;` as separators.
///
/// Tokens without any alphanumeric character (stray punctuation) are not words,
/// so re-spacing clause separators never changes the count.
///
/// # Examples
///
/// ```
/// use continuum_core::word_count;
///
/// assert_eq!(word_count("wind howls; dust rises"), 4);
/// assert_eq!(word_count("wind howls;dust rises"), 4);
/// assert_eq!(word_count(" , ; "), 0);
/// ```
pub fn word_count(text: &str) -> usize {
    text.split(|c: char| c.is_whitespace() || c == ';')
        .filter(|w| w.chars().any(char::is_alphanumeric))
        .count()
}
