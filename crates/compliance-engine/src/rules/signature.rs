use shared_types::Severity;

use super::Finding;
use crate::patterns::{first_substring_match, SIGNATURE_PHRASES};

/// Severity of a missing signature block
pub const MISSING_SIGNATURE_SEVERITY: Severity = Severity::High;

/// Flag documents without any signature indicator
pub fn check_signature_block(text: &str) -> Option<Finding> {
    let text_lower = text.to_lowercase();
    if first_substring_match(&text_lower, SIGNATURE_PHRASES).is_some() {
        return None;
    }

    Some(Finding {
        section: "Signature block",
        location_hint: "End of document",
        message: "No clear signature block found.".to_string(),
        suggestion: "Add a signature block with 'For and on behalf of [Company Name]', signatory name, title, signature line and date.",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_missing_signature() {
        let finding = check_signature_block("The Company is a private company.").unwrap();
        assert_eq!(finding.location_hint, "End of document");
    }

    #[test]
    fn test_accepts_each_indicator() {
        for phrase in SIGNATURE_PHRASES {
            let text = format!("Executed below. {}: ______", phrase.to_uppercase());
            assert!(check_signature_block(&text).is_none(), "phrase {:?}", phrase);
        }
    }

    #[test]
    fn test_signed_alone_is_not_a_block() {
        assert!(check_signature_block("The lease was signed last year").is_some());
    }
}
