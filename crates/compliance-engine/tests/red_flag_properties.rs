//! Property-based tests for the red-flag checks and the classifier

use compliance_engine::patterns::{SIGNATURE_PHRASES, WRONG_JURISDICTION_PHRASES};
use compliance_engine::{classify, detect_issues};
use proptest::prelude::*;
use shared_types::{DocumentType, IssueCategory};

/// Filler text drawn from an alphabet that cannot spell any table phrase
fn neutral_text() -> impl Strategy<Value = String> {
    "[xyz0-9 .,]{0,200}"
}

fn wrong_venue() -> impl Strategy<Value = &'static str> {
    prop::sample::select(WRONG_JURISDICTION_PHRASES)
}

fn signature_phrase() -> impl Strategy<Value = &'static str> {
    prop::sample::select(SIGNATURE_PHRASES)
}

fn any_label() -> impl Strategy<Value = DocumentType> {
    prop::sample::select(DocumentType::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Any number of wrong-venue phrases yields exactly one mismatch issue
    #[test]
    fn wrong_venue_reported_once(
        venues in prop::collection::vec(wrong_venue(), 1..6),
        filler in neutral_text(),
        doc_type in any_label(),
    ) {
        let text = format!("{} {}", filler, venues.join(" and the "));
        let issues = detect_issues(&text, doc_type);
        let mismatches = issues
            .iter()
            .filter(|i| i.category == IssueCategory::JurisdictionMismatch)
            .count();
        prop_assert_eq!(mismatches, 1);
    }

    /// No signature phrase means a missing-signature issue
    #[test]
    fn missing_signature_detected(filler in neutral_text(), doc_type in any_label()) {
        let issues = detect_issues(&filler, doc_type);
        prop_assert!(issues.iter().any(|i| i.category == IssueCategory::MissingSignature));
    }

    /// Any signature phrase suppresses the missing-signature issue
    #[test]
    fn signature_phrase_suppresses_issue(
        phrase in signature_phrase(),
        before in neutral_text(),
        after in neutral_text(),
        upper in any::<bool>(),
        doc_type in any_label(),
    ) {
        let phrase = if upper { phrase.to_uppercase() } else { phrase.to_string() };
        let text = format!("{} {} {}", before, phrase, after);
        let issues = detect_issues(&text, doc_type);
        prop_assert!(!issues.iter().any(|i| i.category == IssueCategory::MissingSignature));
    }

    /// Every check emits at most one issue
    #[test]
    fn at_most_one_issue_per_check(text in ".{0,300}", doc_type in any_label()) {
        let issues = detect_issues(&text, doc_type);
        let mut categories: Vec<_> = issues.iter().map(|i| i.category).collect();
        let before = categories.len();
        categories.sort_by_key(|c| format!("{:?}", c));
        categories.dedup();
        prop_assert_eq!(before, categories.len());
    }

    /// Classification is a pure function of text and filename
    #[test]
    fn classify_is_deterministic(text in ".{0,300}", filename in "[a-z_ ]{0,30}") {
        let first = classify(&text, &filename);
        prop_assert_eq!(classify(&text, &filename), first);
        prop_assert_eq!(classify(&text, &filename), first);
    }
}
