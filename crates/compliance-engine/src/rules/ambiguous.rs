use lazy_static::lazy_static;
use regex::Regex;

use super::Finding;
use crate::patterns::{compile_word_matchers, whole_word_matches, AMBIGUOUS_PHRASES};

lazy_static! {
    static ref AMBIGUOUS_MATCHERS: Vec<(&'static str, Regex)> =
        compile_word_matchers(AMBIGUOUS_PHRASES);
}

/// Flag vague or optional wording.
///
/// All matched terms are collapsed into a single issue, listed once each in
/// alphabetical order.
pub fn check_ambiguous_language(text: &str) -> Option<Finding> {
    let mut found = whole_word_matches(text, &AMBIGUOUS_MATCHERS);
    if found.is_empty() {
        return None;
    }
    found.sort_unstable();
    found.dedup();

    Some(Finding {
        section: "Contract language",
        location_hint: "Throughout document",
        message: format!(
            "Ambiguous/optional language detected: {}",
            found.join(", ")
        ),
        suggestion: "Replace ambiguous terms with clear, definitive obligations (e.g., 'shall' instead of 'may').",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregates_terms_into_one_finding() {
        let text = "The Board may, at the discretion of the Chair, use reasonable endeavours. \
                    The Board MAY also act.";
        let finding = check_ambiguous_language(text).unwrap();
        assert_eq!(
            finding.message,
            "Ambiguous/optional language detected: at the discretion of, may, reasonable endeavours"
        );
    }

    #[test]
    fn test_nested_phrase_lists_both_terms() {
        let finding = check_ambiguous_language("fees as may be agreed").unwrap();
        assert!(finding.message.contains("as may be agreed"));
        assert!(finding.message.contains(", may"));
    }

    #[test]
    fn test_no_match_inside_words() {
        assert!(check_ambiguous_language("The Mayor of the mightily coulded town").is_none());
    }

    #[test]
    fn test_definitive_language_passes() {
        assert!(check_ambiguous_language("The Company shall file within 14 days.").is_none());
    }
}
