//! Parsing of free-text country lists.

use std::sync::OnceLock;

use regex::Regex;

use crate::country::{CountryRegistry, CountrySelection};

/// Separator between countries in a list.
pub const LIST_SEPARATOR: &str = ", ";

/// Latin letters and spaces, entries separated by `", "`.
fn country_list_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(?:[A-Za-z ]+(?:, )?)+$").unwrap())
}

/// Returns true if `text` is a well-formed country list.
pub fn is_country_list(text: &str) -> bool {
    country_list_pattern().is_match(text)
}

/// Result of resolving a country list against the registry.
#[derive(Debug, Default, PartialEq)]
pub struct ParsedSelection {
    /// Recognised countries, first mention first.
    pub selection: CountrySelection,
    /// Inputs that matched no country, deduplicated, in input order.
    pub unrecognized: Vec<String>,
}

/// Splits `text` on `", "` and resolves each entry.
///
/// Blank entries are skipped. The text is expected to be trimmed and to
/// have passed [`is_country_list`].
pub fn parse_selection(registry: &CountryRegistry, text: &str) -> ParsedSelection {
    let mut parsed = ParsedSelection::default();
    for input in text.split(LIST_SEPARATOR) {
        if input.trim().is_empty() {
            continue;
        }
        match registry.resolve(input) {
            Some(id) => {
                parsed.selection.insert(id);
            }
            None => {
                if !parsed.unrecognized.iter().any(|u| u == input) {
                    parsed.unrecognized.push(input.to_string());
                }
            }
        }
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::country::sample_registry;

    #[test]
    fn test_pattern_accepts_lists() {
        assert!(is_country_list("France"));
        assert!(is_country_list("France, Spain"));
        assert!(is_country_list("kingdom of spain, italy, "));
    }

    #[test]
    fn test_pattern_rejects_other_text() {
        assert!(!is_country_list(""));
        assert!(!is_country_list("France,Spain"));
        assert!(!is_country_list("France; Spain"));
        assert!(!is_country_list("España"));
        assert!(!is_country_list("France, 42"));
    }

    #[test]
    fn test_parse_resolves_and_dedupes() {
        let registry = sample_registry();

        let parsed = parse_selection(&registry, "Spain, France, espana, Atlantis, Atlantis");

        let names: Vec<_> = parsed
            .selection
            .iter()
            .map(|id| registry.get(id).name.as_str())
            .collect();
        assert_eq!(names, vec!["Spain", "France"]);
        assert_eq!(parsed.unrecognized, vec!["Atlantis"]);
    }

    #[test]
    fn test_padded_entry_is_unrecognized() {
        let registry = sample_registry();

        let parsed = parse_selection(&registry, "France , Spain");

        assert_eq!(parsed.selection.len(), 1);
        assert_eq!(parsed.unrecognized, vec!["France "]);
    }

    #[test]
    fn test_parse_skips_blank_entries() {
        let registry = sample_registry();

        let parsed = parse_selection(&registry, "Italy,  , ");

        assert_eq!(parsed.selection.len(), 1);
        assert!(parsed.unrecognized.is_empty());
    }
}
