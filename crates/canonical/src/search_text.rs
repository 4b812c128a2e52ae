//! Diacritic-insensitive normalization for search and suggestion text.
//!
//! Where [`crate::canonicalize`] produces a versioned, hashable fingerprint of a
//! document, the functions in this module serve a different caller: the search
//! and suggestion paths, which need a normalized string to compare queries
//! against stored text. They are pure, total, and idempotent, but unlike
//! `canonicalize` they never fail and never produce tokens with offsets.

use std::borrow::Cow;

use unicode_categories::UnicodeCategories;
use unicode_normalization::UnicodeNormalization;

/// Fold diacritics, case, and whitespace so that text can be compared for
/// search purposes regardless of accent marks or capitalization.
///
/// Decomposes to NFD, drops every character in the Unicode `Mn` (nonspacing
/// mark) category, recomposes to NFC, optionally lowercases, then collapses
/// whitespace. Idempotent: `normalize(normalize(s)) == normalize(s)`.
pub fn normalize(text: &str, lowercase: bool) -> String {
    let stripped: String = text.nfd().filter(|c| !c.is_mark_nonspacing()).nfc().collect();
    let folded: Cow<str> = if lowercase {
        Cow::Owned(stripped.to_lowercase())
    } else {
        Cow::Owned(stripped)
    };
    crate::collapse_whitespace(&folded)
}

/// Normalize a user query: diacritic-insensitive and lowercased.
pub fn normalize_query(text: &str) -> String {
    normalize(text, true)
}

/// Normalize text destined for an embedding call: diacritic-insensitive but
/// case-preserving, since embedding models are generally case-aware.
pub fn normalize_for_embedding(text: &str) -> String {
    normalize(text, false)
}

/// Build the searchable-text field for a chunk: drop empty parts, join the
/// rest with single spaces, then run through [`normalize_query`].
pub fn create_searchable_text<'a, I>(parts: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let joined = parts
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    normalize_query(&joined)
}

/// Split normalized text into search tokens, dropping anything shorter than
/// two characters. Delimiters are whitespace and common punctuation that
/// would otherwise glue unrelated words together (`hello,world` -> two
/// tokens, not one).
pub fn tokenize_for_search(text: &str) -> Vec<String> {
    let normalized = normalize_query(text);
    normalized
        .split(|c: char| {
            c.is_whitespace() || "-_.,;:!?(){}[]<>/\"'".contains(c)
        })
        .filter(|tok| tok.chars().count() >= 2)
        .map(|tok| tok.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diacritic_insensitive() {
        assert_eq!(normalize_query("datová"), normalize_query("datova"));
        assert_eq!(normalize_query("Článek"), normalize_query("clanek"));
    }

    #[test]
    fn idempotent() {
        let once = normalize_query("  Héllo   Wörld  ");
        let twice = normalize_query(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn ascii_passthrough_is_trim_collapse_lowercase() {
        assert_eq!(normalize_query("  Hello   World  "), "hello world");
    }

    #[test]
    fn searchable_text_drops_empty_parts() {
        let text = create_searchable_text(["", "Invoice", "", "from Google"]);
        assert_eq!(text, "invoice from google");
    }

    #[test]
    fn tokenize_drops_short_tokens() {
        let toks = tokenize_for_search("a hello, world! I'm ok");
        assert_eq!(toks, vec!["hello", "world", "ok"]);
    }

    #[test]
    fn normalize_for_embedding_preserves_case() {
        assert_eq!(normalize_for_embedding("Café Paris"), "Cafe Paris");
    }
}
