//! Canonical identifier extraction.
//!
//! Legacy registry exports embed 9-digit identifiers in free-form strings, often zero-padded or
//! wrapped in prefixes and suffixes. The canonical identifier is the first 9-character window
//! whose first character is anything but `0` and whose remaining eight characters are digits.
//! The first character is deliberately not required to be a digit.

use regex::Regex;
use std::sync::LazyLock;

static CANONICAL_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0][0-9]{8}").expect("Invalid canonical identifier regex"));

/// Returns the first canonical identifier window in `raw`, if any.
pub fn find_canonical_identifier(raw: &str) -> Option<&str> {
    CANONICAL_ID_REGEX.find(raw).map(|m| m.as_str())
}

/// Extracts the canonical identifier from `raw`.
///
/// A miss is a data-quality outcome, not an error: a warning naming the input is logged and an
/// empty string is returned so the caller can carry on without the identifier.
pub fn normalize_identifier(raw: &str) -> String {
    match find_canonical_identifier(raw) {
        Some(id) => id.to_owned(),
        None => {
            tracing::warn!(
                "identifier to convert does not have 9 digits without leading '0': {}",
                raw
            );
            String::new()
        }
    }
}
