//! Vendor name normalization: maps common aliases and legal-suffix variants
//! of a vendor name to one canonical spelling so that search and suggestion
//! don't treat "Google Inc." and "Google LLC" as different vendors.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

static LEGAL_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*,?\s*(inc\.?|llc\.?|ltd\.?|corp\.?|co\.?|gmbh|s\.a\.|plc)\s*$").unwrap()
});

static ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("google inc", "google"),
        ("google llc", "google"),
        ("alphabet inc", "google"),
        ("amazon.com inc", "amazon"),
        ("amazon web services", "amazon"),
        ("aws", "amazon"),
        ("microsoft corp", "microsoft"),
        ("msft", "microsoft"),
        ("meta platforms inc", "meta"),
        ("facebook inc", "meta"),
        ("t-mobile us inc", "t-mobile"),
        ("tmobile", "t-mobile"),
        ("verizon wireless", "verizon"),
        ("verizon communications", "verizon"),
    ])
});

/// Normalize a raw vendor string: strip a trailing legal suffix, collapse
/// whitespace, and map through the alias table (case-insensitively). Falls
/// back to the suffix-stripped, lowercased input when no alias matches.
pub struct VendorNormalizer;

impl VendorNormalizer {
    pub fn normalize(raw: &str) -> String {
        let stripped = LEGAL_SUFFIX_RE.replace(raw.trim(), "").trim().to_string();
        let key = stripped.to_lowercase();
        if let Some(canonical) = ALIASES.get(key.as_str()) {
            return canonical.to_string();
        }
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_legal_suffix() {
        assert_eq!(VendorNormalizer::normalize("Acme Corp."), "acme");
        assert_eq!(VendorNormalizer::normalize("Acme Corp"), "acme");
    }

    #[test]
    fn maps_known_aliases() {
        assert_eq!(VendorNormalizer::normalize("Google Inc."), "google");
        assert_eq!(VendorNormalizer::normalize("AWS"), "amazon");
        assert_eq!(VendorNormalizer::normalize("Facebook Inc"), "meta");
        assert_eq!(VendorNormalizer::normalize("T-Mobile US Inc"), "t-mobile");
        assert_eq!(VendorNormalizer::normalize("Verizon Wireless"), "verizon");
    }

    #[test]
    fn unrecognized_vendor_passes_through_lowercased() {
        assert_eq!(VendorNormalizer::normalize("  Local Hardware Store  "), "local hardware store");
    }
}
