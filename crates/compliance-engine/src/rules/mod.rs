//! Red-flag checks
//!
//! Each check is an independent predicate over the full document text. Checks
//! are additive: a document can trigger any subset of them, and each check
//! emits at most one issue. Severity is a fixed property of the check.

pub mod ambiguous;
pub mod dates;
pub mod jurisdiction;
pub mod ownership;
pub mod signature;

use shared_types::{DocumentType, Issue, IssueCategory, Severity};

/// The canonical checks, in presentation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RedFlagCheck {
    JurisdictionMismatch,
    MissingSignature,
    AmbiguousLanguage,
    MissingOwnershipDeclaration,
    MissingJurisdictionClause,
    DateFormat,
}

impl RedFlagCheck {
    pub const ALL: [RedFlagCheck; 6] = [
        RedFlagCheck::JurisdictionMismatch,
        RedFlagCheck::MissingSignature,
        RedFlagCheck::AmbiguousLanguage,
        RedFlagCheck::MissingOwnershipDeclaration,
        RedFlagCheck::MissingJurisdictionClause,
        RedFlagCheck::DateFormat,
    ];

    pub fn category(&self) -> IssueCategory {
        match self {
            RedFlagCheck::JurisdictionMismatch => IssueCategory::JurisdictionMismatch,
            RedFlagCheck::MissingSignature => IssueCategory::MissingSignature,
            RedFlagCheck::AmbiguousLanguage => IssueCategory::AmbiguousLanguage,
            RedFlagCheck::MissingOwnershipDeclaration => IssueCategory::MissingOwnershipDeclaration,
            RedFlagCheck::MissingJurisdictionClause => IssueCategory::MissingJurisdictionClause,
            RedFlagCheck::DateFormat => IssueCategory::DateFormat,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            RedFlagCheck::JurisdictionMismatch => Severity::High,
            RedFlagCheck::MissingSignature => signature::MISSING_SIGNATURE_SEVERITY,
            RedFlagCheck::AmbiguousLanguage => Severity::Low,
            RedFlagCheck::MissingOwnershipDeclaration => Severity::Medium,
            RedFlagCheck::MissingJurisdictionClause => Severity::High,
            RedFlagCheck::DateFormat => Severity::Low,
        }
    }

    /// Run this check against the text, returning its finding if it fires
    pub fn evaluate(&self, text: &str, doc_type: DocumentType) -> Option<Finding> {
        match self {
            RedFlagCheck::JurisdictionMismatch => jurisdiction::check_wrong_venue(text),
            RedFlagCheck::MissingSignature => signature::check_signature_block(text),
            RedFlagCheck::AmbiguousLanguage => ambiguous::check_ambiguous_language(text),
            RedFlagCheck::MissingOwnershipDeclaration => {
                ownership::check_ownership_declaration(text, doc_type)
            }
            RedFlagCheck::MissingJurisdictionClause => jurisdiction::check_home_jurisdiction(text),
            RedFlagCheck::DateFormat => dates::check_date_format(text),
        }
    }
}

/// What a check reports before it is stamped with document and severity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub section: &'static str,
    pub location_hint: &'static str,
    pub message: String,
    pub suggestion: &'static str,
}

impl Finding {
    pub fn into_issue(self, check: RedFlagCheck, doc_type: DocumentType) -> Issue {
        Issue {
            document: doc_type.name().to_string(),
            category: check.category(),
            section: self.section.to_string(),
            location_hint: self.location_hint.to_string(),
            issue: self.message,
            severity: check.severity(),
            suggestion: self.suggestion.to_string(),
        }
    }
}

/// Run every check over `text` for a document of type `doc_type`
pub fn detect_issues(text: &str, doc_type: DocumentType) -> Vec<Issue> {
    RedFlagCheck::ALL
        .iter()
        .filter_map(|check| {
            check
                .evaluate(text, doc_type)
                .map(|finding| finding.into_issue(*check, doc_type))
        })
        .collect()
}
