//! Per-tenant autocomplete index: five lexicographically ordered term sets
//! (`filenames`, `vendors`, `entities`, `keywords`, `all_terms`), each stored
//! as a single [`IndexBackend`] entry holding a sorted, deduplicated set.
//!
//! The backend trait only offers whole-value get/put, not a native
//! range-by-prefix scan, so prefix matching happens in-process over the
//! retrieved set. Tenant vocabularies are small enough (bounded by distinct
//! filenames/vendors/entities/keywords/terms, not by document count) that
//! this is cheap; a future backend could expose a native sorted-set range
//! scan without changing this module's public surface.

use std::collections::BTreeSet;

use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};

use crate::backend::IndexBackend;
use crate::IndexError;

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "this", "that", "with", "from", "have", "has",
];
const MIN_TERM_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[allow(dead_code)]
enum SetName {
    Filenames,
    Vendors,
    Entities,
    Keywords,
    AllTerms,
}

impl SetName {
    fn key_suffix(self) -> &'static str {
        match self {
            SetName::Filenames => "filenames",
            SetName::Vendors => "vendors",
            SetName::Entities => "entities",
            SetName::Keywords => "keywords",
            SetName::AllTerms => "all_terms",
        }
    }

    fn priority(self) -> f32 {
        match self {
            SetName::Filenames => 1.0,
            SetName::Vendors => 0.9,
            SetName::Entities => 0.8,
            SetName::Keywords => 0.7,
            SetName::AllTerms => 0.5,
        }
    }

    fn suggestion_type(self) -> &'static str {
        match self {
            SetName::Filenames => "file",
            SetName::Vendors => "vendor",
            SetName::Entities => "entity",
            SetName::Keywords => "keyword",
            SetName::AllTerms => "term",
        }
    }

    const ALL: [SetName; 5] = [
        SetName::Filenames,
        SetName::Vendors,
        SetName::Entities,
        SetName::Keywords,
        SetName::AllTerms,
    ];
}

fn set_key(tenant: &str, set: SetName) -> String {
    format!("{tenant}:suggestions:{}", set.key_suffix())
}

/// One autocomplete candidate returned by [`SuggestionIndex::suggest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub text: String,
    pub suggestion_type: String,
    pub score: f32,
}

/// Autocomplete index over a [`IndexBackend`], scoped per tenant.
pub struct SuggestionIndex<'a> {
    backend: &'a dyn IndexBackend,
}

impl<'a> SuggestionIndex<'a> {
    pub fn new(backend: &'a dyn IndexBackend) -> Self {
        Self { backend }
    }

    fn load_set(&self, tenant: &str, set: SetName) -> Result<BTreeSet<String>, IndexError> {
        match self.backend.get(&set_key(tenant, set))? {
            Some(bytes) => {
                let (set, _) = decode_from_slice(&bytes, standard())
                    .map_err(|e| IndexError::Decode(e.to_string()))?;
                Ok(set)
            }
            None => Ok(BTreeSet::new()),
        }
    }

    fn store_set(&self, tenant: &str, set: SetName, members: &BTreeSet<String>) -> Result<(), IndexError> {
        let encoded = encode_to_vec(members, standard()).map_err(|e| IndexError::Encode(e.to_string()))?;
        self.backend.put(&set_key(tenant, set), &encoded)
    }

    fn insert_into(&self, tenant: &str, set: SetName, value: &str) -> Result<(), IndexError> {
        let normalized = canonical::normalize_query(value);
        if normalized.is_empty() {
            return Ok(());
        }
        let mut members = self.load_set(tenant, set)?;
        if members.insert(normalized) {
            self.store_set(tenant, set, &members)?;
        }
        Ok(())
    }

    /// Add the terms extracted from one ingested artifact: filename, each
    /// entity/keyword/vendor, and tokenized/phrase-built content terms.
    pub fn add_terms(
        &self,
        tenant: &str,
        filename: Option<&str>,
        entities: &[String],
        keywords: &[String],
        vendor: Option<&str>,
        content: Option<&str>,
    ) -> Result<(), IndexError> {
        if let Some(filename) = filename {
            self.insert_into(tenant, SetName::Filenames, filename)?;
        }
        for entity in entities {
            self.insert_into(tenant, SetName::Entities, entity)?;
        }
        for keyword in keywords {
            self.insert_into(tenant, SetName::Keywords, keyword)?;
        }
        if let Some(vendor) = vendor {
            self.insert_into(tenant, SetName::Vendors, vendor)?;
        }
        if let Some(content) = content {
            self.add_content_terms(tenant, content)?;
        }
        Ok(())
    }

    /// Single terms come from the normalized, stopword-filtered token list;
    /// phrases are built over the raw whitespace-split words *before* any
    /// normalization, so a window spanning a sentence boundary can be
    /// rejected by checking for terminator punctuation still present in the
    /// joined phrase. Normalizing first would strip that punctuation and
    /// create phantom adjacency between words that were never truly next to
    /// each other in the source text.
    fn add_content_terms(&self, tenant: &str, content: &str) -> Result<(), IndexError> {
        let words: Vec<String> = canonical::tokenize_for_search(content)
            .into_iter()
            .filter(|w| w.chars().count() >= MIN_TERM_LEN && !STOP_WORDS.contains(&w.as_str()))
            .collect();

        let mut members = self.load_set(tenant, SetName::AllTerms)?;
        let mut changed = false;

        for word in &words {
            changed |= members.insert(word.clone());
        }

        let raw_words: Vec<&str> = content.split_whitespace().collect();
        for size in [2usize, 3] {
            for window in raw_words.windows(size) {
                let phrase = window.join(" ");
                if phrase.contains(['.', '!', '?', ';']) {
                    continue;
                }
                let normalized = canonical::normalize_query(&phrase);
                if !normalized.is_empty() {
                    changed |= members.insert(normalized);
                }
            }
        }

        if changed {
            self.store_set(tenant, SetName::AllTerms, &members)?;
        }
        Ok(())
    }

    /// Prefix-match `prefix` across all five sets in fixed priority order,
    /// merge, dedupe by text (keeping the highest score), truncate to
    /// `limit`. Returns empty for a prefix shorter than two characters.
    pub fn suggest(&self, tenant: &str, prefix: &str, limit: usize) -> Result<Vec<Suggestion>, IndexError> {
        let normalized_prefix = canonical::normalize_query(prefix);
        if normalized_prefix.chars().count() < 2 {
            return Ok(Vec::new());
        }

        let mut out: Vec<Suggestion> = Vec::new();
        for set in SetName::ALL {
            let members = self.load_set(tenant, set)?;
            for member in members.range(normalized_prefix.clone()..) {
                if !member.starts_with(&normalized_prefix) {
                    break;
                }
                out.push(Suggestion {
                    text: member.clone(),
                    suggestion_type: set.suggestion_type().to_string(),
                    score: set.priority(),
                });
            }
        }

        out.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
        let mut seen = std::collections::HashSet::new();
        out.retain(|s| seen.insert(s.text.clone()));
        out.truncate(limit);
        Ok(out)
    }

    /// Remove `filename` from the `filenames` set. Per-artifact removal of
    /// any other contribution (entities, keywords, vendor, content terms)
    /// is intentionally not supported: without an artifact-to-term
    /// attribution table those terms cannot be safely removed without
    /// risking removal of a term another artifact still needs.
    pub fn remove_filename(&self, tenant: &str, filename: &str) -> Result<(), IndexError> {
        let normalized = canonical::normalize_query(filename);
        let mut members = self.load_set(tenant, SetName::Filenames)?;
        if members.remove(&normalized) {
            self.store_set(tenant, SetName::Filenames, &members)?;
        }
        Ok(())
    }

    /// Delete every set for `tenant`.
    pub fn clear_tenant(&self, tenant: &str) -> Result<(), IndexError> {
        for set in SetName::ALL {
            self.backend.delete(&set_key(tenant, set))?;
        }
        Ok(())
    }
}
