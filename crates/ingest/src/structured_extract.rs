//! Regex-based structured extraction shared by the query analyzer and the
//! metadata extractor: money amounts, identifiers, dates, emails, IBANs,
//! phone numbers, and capitalized-entity heuristics.
//!
//! Patterns are compiled once via `once_cell::sync::Lazy` and reused across
//! calls; none of this allocates a fresh `Regex` per invocation.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A monetary amount pulled out of free text, with the currency it was
/// tagged with (symbol, ISO code, or the default when neither is present).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoneyMatch {
    pub amount: f64,
    pub currency: String,
    pub raw: String,
}

/// An identifier-shaped token: either a letter-prefixed code (`INV-2024`) or
/// a bare alphanumeric run long enough to not be an ordinary word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdMatch {
    pub value: String,
}

static MONEY_SYMBOL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([$€£¥])\s?([0-9][0-9,]*(?:\.[0-9]{1,2})?)").unwrap()
});

static MONEY_CODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([0-9][0-9,]*(?:\.[0-9]{1,2})?)\s?(USD|EUR|GBP|JPY|INR|CAD|AUD|CHF|CNY)").unwrap()
});

static ID_PREFIXED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Z]{2,}-\d{4,}\b").unwrap());
static ID_BARE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Z0-9]{8,}\b").unwrap());

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap());

static IBAN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Z]{2}\d{2}[A-Z0-9]{10,30}\b").unwrap());

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\+?\d{1,3}[\s.-]?)?\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}\b").unwrap()
});

static DATE_ISO_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{4}-\d{2}-\d{2}\b").unwrap());
static DATE_US_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{1,2}/\d{1,2}/\d{2,4}\b").unwrap());
static DATE_EU_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{1,2}\.\d{1,2}\.\d{2,4}\b").unwrap());
static DATE_QUARTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bQ[1-4]\s?20\d{2}\b").unwrap());
static DATE_MONTH_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(Jan(?:uary)?|Feb(?:ruary)?|Mar(?:ch)?|Apr(?:il)?|May|Jun(?:e)?|Jul(?:y)?|Aug(?:ust)?|Sep(?:t(?:ember)?)?|Oct(?:ober)?|Nov(?:ember)?|Dec(?:ember)?)\s+\d{1,2},?\s+\d{4}\b").unwrap()
});
static DATE_RELATIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(today|yesterday|tomorrow|last week|last month|next week|next month)\b")
        .unwrap()
});

static CAPITALIZED_ENTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:[A-Z][a-z]+(?:\s+[A-Z][a-z]+){0,3})\b").unwrap());

static FILE_TYPE_HINT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(pdf|csv|xlsx?|docx?|pptx?|png|jpe?g|gif|txt|json|ya?ml|invoice|receipt|contract|spreadsheet|document|image|photo)\b",
    )
    .unwrap()
});

/// Extract every money match in `text`, preferring a currency symbol over an
/// ISO code when both patterns could plausibly match the same span, and
/// falling back to `USD` when neither tags the amount explicitly.
pub fn extract_money(text: &str) -> Vec<MoneyMatch> {
    let mut out = Vec::new();
    for caps in MONEY_SYMBOL_RE.captures_iter(text) {
        let symbol = &caps[1];
        let currency = match symbol {
            "€" => "EUR",
            "£" => "GBP",
            "¥" => "JPY",
            _ => "USD",
        };
        if let Some(amount) = parse_amount(&caps[2]) {
            out.push(MoneyMatch {
                amount,
                currency: currency.to_string(),
                raw: caps[0].to_string(),
            });
        }
    }
    for caps in MONEY_CODE_RE.captures_iter(text) {
        if let Some(amount) = parse_amount(&caps[1]) {
            out.push(MoneyMatch {
                amount,
                currency: caps[2].to_uppercase(),
                raw: caps[0].to_string(),
            });
        }
    }
    out
}

fn parse_amount(raw: &str) -> Option<f64> {
    raw.replace(',', "").parse::<f64>().ok()
}

/// Extract ID-shaped tokens: prefixed codes first (`INV-2024`), then bare
/// alphanumeric runs of at least 8 characters that are not already part of
/// a prefixed match.
pub fn extract_ids(text: &str) -> Vec<IdMatch> {
    let mut spans: Vec<(usize, usize)> = Vec::new();
    let mut out = Vec::new();
    for m in ID_PREFIXED_RE.find_iter(text) {
        spans.push((m.start(), m.end()));
        out.push(IdMatch {
            value: m.as_str().to_string(),
        });
    }
    for m in ID_BARE_RE.find_iter(text) {
        if spans.iter().any(|(s, e)| m.start() >= *s && m.end() <= *e) {
            continue;
        }
        out.push(IdMatch {
            value: m.as_str().to_string(),
        });
    }
    out
}

pub fn extract_emails(text: &str) -> Vec<String> {
    EMAIL_RE.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

pub fn extract_ibans(text: &str) -> Vec<String> {
    IBAN_RE.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

pub fn extract_phone_numbers(text: &str) -> Vec<String> {
    PHONE_RE.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

/// Raw date-like substrings found in `text`, in the order the underlying
/// patterns are tried: ISO, US, European, quarter, month-name, relative.
pub fn extract_dates(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    for re in [
        &*DATE_ISO_RE,
        &*DATE_US_RE,
        &*DATE_EU_RE,
        &*DATE_QUARTER_RE,
        &*DATE_MONTH_NAME_RE,
        &*DATE_RELATIVE_RE,
    ] {
        out.extend(re.find_iter(text).map(|m| m.as_str().to_string()));
    }
    out
}

/// File-extension hints found in `text` (e.g. a query mentioning "the pdf").
pub fn extract_file_type_hints(text: &str) -> Vec<String> {
    FILE_TYPE_HINT_RE
        .find_iter(text)
        .map(|m| m.as_str().trim_start_matches('.').to_lowercase())
        .collect()
}

/// Heuristic capitalized-entity spans: runs of 1-4 Title Case words. Cheap
/// and deliberately over-inclusive; callers filter against stop words.
pub fn extract_capitalized_entities(text: &str) -> Vec<String> {
    CAPITALIZED_ENTITY_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}
