use lazy_static::lazy_static;
use regex::Regex;
use shared_types::DocumentType;

use super::Finding;
use crate::patterns::{compile_word_matchers, whole_word_matches, OWNERSHIP_PHRASES};

lazy_static! {
    static ref OWNERSHIP_MATCHERS: Vec<(&'static str, Regex)> =
        compile_word_matchers(OWNERSHIP_PHRASES);
}

/// Flag incorporation documents with no beneficial-ownership declaration.
///
/// Other document types are never flagged.
pub fn check_ownership_declaration(text: &str, doc_type: DocumentType) -> Option<Finding> {
    if !doc_type.is_incorporation_family() {
        return None;
    }
    if !whole_word_matches(text, &OWNERSHIP_MATCHERS).is_empty() {
        return None;
    }

    Some(Finding {
        section: "UBO / Ownership",
        location_hint: "Ownership declaration (missing)",
        message: "No UBO/ownership declaration found in document.".to_string(),
        suggestion: "Include an explicit UBO declaration clause or attach the UBO Declaration Form.",
    })
}
