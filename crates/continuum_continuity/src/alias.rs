//! Canonical entity names.

use std::collections::HashMap;

/// Maps name variants to one canonical name.
///
/// Lookup is case-insensitive and ignores surrounding whitespace; names with
/// no entry pass through untouched, original casing included.
///
/// # Examples
///
/// ```
/// use continuum_continuity::AliasNormalizer;
///
/// let aliases = AliasNormalizer::new([("Johnny", "John"), ("J.", "John")]);
/// assert_eq!(aliases.normalize("JOHNNY"), "John");
/// assert_eq!(aliases.normalize("mary"), "mary");
/// ```
#[derive(Debug, Clone, Default)]
pub struct AliasNormalizer {
    table: HashMap<String, String>,
}

impl AliasNormalizer {
    /// Builds a normalizer from `(alias, canonical)` pairs.
    pub fn new<I, A, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, C)>,
        A: AsRef<str>,
        C: Into<String>,
    {
        let table = pairs
            .into_iter()
            .map(|(alias, canonical)| (Self::key(alias.as_ref()), canonical.into()))
            .collect();
        Self { table }
    }

    fn key(name: &str) -> String {
        name.trim().to_lowercase()
    }

    /// Returns the canonical form of `name`.
    pub fn normalize(&self, name: &str) -> String {
        self.table
            .get(&Self::key(name))
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    /// Number of aliases in the table.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// True when the table is empty.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmapped_keeps_casing() {
        let aliases = AliasNormalizer::default();
        assert_eq!(aliases.normalize("McGregor"), "McGregor");
    }

    #[test]
    fn test_lookup_ignores_case_and_whitespace() {
        let aliases = AliasNormalizer::new([("the old man", "Elias")]);
        assert_eq!(aliases.normalize("  The Old Man "), "Elias");
        assert_eq!(aliases.len(), 1);
    }
}
