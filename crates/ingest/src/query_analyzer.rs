//! Extract structured signal out of a free-text search query: money, IDs,
//! dates, emails, IBANs, phone numbers, file-type hints, and capitalized
//! entities, plus a lightweight [`QueryRouter`] that turns those signals
//! into search-strategy hints.

use serde::{Deserialize, Serialize};

use crate::structured_extract::{
    extract_capitalized_entities, extract_dates, extract_emails, extract_file_type_hints,
    extract_ibans, extract_ids, extract_money, extract_phone_numbers, IdMatch, MoneyMatch,
};

/// Everything [`analyze_query`] was able to pull out of a query string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryAnalysis {
    pub money: Vec<MoneyMatch>,
    pub ids: Vec<IdMatch>,
    pub emails: Vec<String>,
    pub ibans: Vec<String>,
    pub phone_numbers: Vec<String>,
    pub dates: Vec<String>,
    pub file_type_hints: Vec<String>,
    pub entities: Vec<String>,
    pub vendors: Vec<String>,
    pub clean_text: String,
}

const STOP_ENTITIES: &[&str] = &["The", "This", "That", "These", "Those", "Please", "Find"];

/// Known vendor names detected verbatim (lowercase) in the query text, for
/// the exact-match scoring branch in the search service's keyword strategy.
const KNOWN_VENDORS: &[&str] = &[
    "google",
    "t-mobile",
    "tmobile",
    "amazon",
    "aws",
    "microsoft",
    "apple",
    "adobe",
    "salesforce",
    "zoom",
    "slack",
];

fn extract_vendors(query: &str) -> Vec<String> {
    let lower = query.to_lowercase();
    KNOWN_VENDORS
        .iter()
        .filter(|v| lower.contains(*v))
        .map(|v| v.to_string())
        .collect()
}

/// Run every extraction pass over `query` and build a [`QueryAnalysis`].
/// `clean_text` is the query with every recognized entity span removed,
/// whitespace-collapsed, for callers that want the residual free text.
pub fn analyze_query(query: &str) -> QueryAnalysis {
    let money = extract_money(query);
    let ids = extract_ids(query);
    let emails = extract_emails(query);
    let ibans = extract_ibans(query);
    let phone_numbers = extract_phone_numbers(query);
    let dates = extract_dates(query);
    let file_type_hints = extract_file_type_hints(query);
    let entities: Vec<String> = extract_capitalized_entities(query)
        .into_iter()
        .filter(|e| !STOP_ENTITIES.contains(&e.as_str()))
        .collect();
    let vendors = extract_vendors(query);

    let mut clean_text = query.to_string();
    for raw in money.iter().map(|m| m.raw.as_str()).chain(ids.iter().map(|i| i.value.as_str())) {
        clean_text = clean_text.replace(raw, " ");
    }
    let clean_text = canonical::collapse_whitespace(&clean_text);

    QueryAnalysis {
        money,
        ids,
        emails,
        ibans,
        phone_numbers,
        dates,
        file_type_hints,
        entities,
        vendors,
        clean_text,
    }
}

/// Coarse search-strategy hints derived from a [`QueryAnalysis`].
pub struct QueryRouter;

impl QueryRouter {
    /// Exact match is worth trying when the query names something with a
    /// narrow, unambiguous surface: an ID, IBAN, email, or phone number.
    pub fn should_use_exact_match(analysis: &QueryAnalysis) -> bool {
        !analysis.ids.is_empty()
            || !analysis.ibans.is_empty()
            || !analysis.emails.is_empty()
            || !analysis.phone_numbers.is_empty()
    }

    /// Image search is worth trying when the query names an image file type
    /// or otherwise mentions visual content.
    pub fn should_search_images(analysis: &QueryAnalysis) -> bool {
        analysis
            .file_type_hints
            .iter()
            .any(|hint| matches!(hint.as_str(), "png" | "jpg" | "jpeg" | "gif" | "image" | "photo"))
    }

    /// A rough strategy label: "exact", "structured", or "semantic",
    /// ordered by how much of the query the analysis was able to pin down.
    pub fn estimate_search_strategy(analysis: &QueryAnalysis) -> &'static str {
        if Self::should_use_exact_match(analysis) {
            "exact"
        } else if !analysis.money.is_empty() || !analysis.dates.is_empty() {
            "structured"
        } else {
            "semantic"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_picks_up_every_signal() {
        let q = "Find invoice INV-2024 from $1,200.00 due 2024-05-01, contact a@b.com";
        let a = analyze_query(q);
        assert_eq!(a.ids[0].value, "INV-2024");
        assert_eq!(a.money[0].amount, 1200.0);
        assert!(a.dates.iter().any(|d| d == "2024-05-01"));
        assert_eq!(a.emails, vec!["a@b.com"]);
    }

    #[test]
    fn router_prefers_exact_for_id_queries() {
        let a = analyze_query("status of INV-2024");
        assert!(QueryRouter::should_use_exact_match(&a));
        assert_eq!(QueryRouter::estimate_search_strategy(&a), "exact");
    }

    #[test]
    fn router_flags_image_queries() {
        let a = analyze_query("find the screenshot.png from last week");
        assert!(QueryRouter::should_search_images(&a));
    }

    #[test]
    fn router_falls_back_to_semantic() {
        let a = analyze_query("what did we discuss about the new roadmap");
        assert_eq!(QueryRouter::estimate_search_strategy(&a), "semantic");
    }
}
