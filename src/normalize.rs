// Normalization of identifiers and display names before comparison

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref WHITESPACE_RUNS_REGEX: Regex = Regex::new(r"\s+").unwrap();
}

/// Onestop IDs are case-insensitive keys. Comparisons happen on the
/// normalized form only, the stored identifier keeps its original casing.
pub fn normalize_onestop_id(id: &str) -> String {
    id.trim().to_lowercase()
}

/// Lowercases and collapses whitespace runs so that e.g.
/// "Main  St " and "main st" compare equal.
pub fn normalize_name(name: &str) -> String {
    WHITESPACE_RUNS_REGEX
        .replace_all(name.trim(), " ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_onestop_id_case_and_padding() {
        assert_eq!(
            normalize_onestop_id(" S-9q9P1bbq5-MainSt "),
            "s-9q9p1bbq5-mainst"
        );
    }

    #[test]
    fn test_name_whitespace_collapse() {
        assert_eq!(normalize_name("  Main   St &  5th "), "main st & 5th");
    }

    #[test]
    fn test_empty_name_stays_empty() {
        assert_eq!(normalize_name("   "), "");
    }
}
