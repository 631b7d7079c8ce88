use lazy_static::lazy_static;
use regex::Regex;

use super::Finding;
use crate::patterns::{
    compile_word_matchers, first_substring_match, whole_word_matches,
    HOME_JURISDICTION_PHRASES, WRONG_JURISDICTION_PHRASES,
};

lazy_static! {
    static ref HOME_JURISDICTION_MATCHERS: Vec<(&'static str, Regex)> =
        compile_word_matchers(HOME_JURISDICTION_PHRASES);
}

/// Flag references to courts outside the home jurisdiction.
///
/// Only the first matching phrase is reported; a document naming several
/// wrong venues still yields a single issue.
pub fn check_wrong_venue(text: &str) -> Option<Finding> {
    let text_lower = text.to_lowercase();
    let phrase = first_substring_match(&text_lower, WRONG_JURISDICTION_PHRASES)?;

    Some(Finding {
        section: "Jurisdiction clause",
        location_hint: "Jurisdiction clause",
        message: format!(
            "Jurisdiction clause refers to '{}'. Expected ADGM jurisdiction.",
            phrase
        ),
        suggestion: "Replace the jurisdiction clause with an explicit reference to ADGM Courts.",
    })
}

/// Flag documents that never name the home jurisdiction at all.
///
/// Independent of [`check_wrong_venue`]: a document can cite the wrong venue
/// and also lack any ADGM clause.
pub fn check_home_jurisdiction(text: &str) -> Option<Finding> {
    if !whole_word_matches(text, &HOME_JURISDICTION_MATCHERS).is_empty() {
        return None;
    }

    Some(Finding {
        section: "Jurisdiction clause (missing)",
        location_hint: "Jurisdiction clause (missing)",
        message: "No explicit ADGM jurisdiction clause detected.".to_string(),
        suggestion: "Add a jurisdiction clause stating 'This document shall be governed by the laws of ADGM and disputes shall be resolved by ADGM Courts.'",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_dubai_courts() {
        let finding = check_wrong_venue("This agreement is governed by the Dubai Courts.").unwrap();
        assert!(finding.message.contains("dubai courts"));
    }

    #[test]
    fn test_reports_first_wrong_venue_only() {
        let finding =
            check_wrong_venue("Sharjah Courts, Dubai Courts and the UAE Federal Courts").unwrap();
        assert!(finding.message.contains("'uae federal courts'"));
    }

    #[test]
    fn test_accepts_adgm_courts() {
        assert!(check_wrong_venue("Disputes are resolved by the ADGM Courts.").is_none());
        assert!(
            check_wrong_venue("Abu Dhabi Global Market Courts have exclusive jurisdiction")
                .is_none()
        );
    }

    #[test]
    fn test_missing_home_jurisdiction() {
        assert!(check_home_jurisdiction("Governed by English law.").is_some());
        assert!(check_home_jurisdiction("").is_some());
    }

    #[test]
    fn test_home_jurisdiction_present() {
        assert!(check_home_jurisdiction("governed by the laws of the ADGM").is_none());
        assert!(check_home_jurisdiction("Abu Dhabi Global Market regulations").is_none());
    }

    #[test]
    fn test_home_jurisdiction_requires_whole_word() {
        // "badgmark" contains "adgm" but is not a reference to it
        assert!(check_home_jurisdiction("badgmark limited").is_some());
    }
}
