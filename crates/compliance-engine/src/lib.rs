//! Red-flag detection for ADGM corporate filings
//!
//! Pure text logic: document classification, the ordered compliance checks,
//! and the required-document checklists. Nothing here touches document
//! markup or performs I/O.

pub mod checklist;
pub mod classifier;
pub mod patterns;
pub mod rules;

pub use checklist::{infer_process, missing_documents, required_documents, ProcessChoice};
pub use classifier::classify;
pub use rules::{detect_issues, RedFlagCheck};

use shared_types::{DocumentType, Issue};

/// ComplianceEngine entry point
pub struct ComplianceEngine;

impl ComplianceEngine {
    pub fn new() -> Self {
        Self
    }

    /// Classify a document from its extracted text and filename
    pub fn classify(&self, text: &str, filename: &str) -> DocumentType {
        classifier::classify(text, filename)
    }

    /// Run every red-flag check over the document text
    pub fn detect(&self, text: &str, doc_type: DocumentType) -> Vec<Issue> {
        rules::detect_issues(text, doc_type)
    }
}

impl Default for ComplianceEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{IssueCategory, Severity};

    #[test]
    fn test_engine_flags_dubai_courts_in_articles() {
        let engine = ComplianceEngine::new();
        let issues = engine.detect(
            "This agreement is governed by the Dubai Courts.",
            DocumentType::ArticlesOfAssociation,
        );

        assert!(issues
            .iter()
            .any(|i| i.section.contains("Jurisdiction") && i.severity == Severity::High));
    }

    #[test]
    fn test_engine_empty_text() {
        let engine = ComplianceEngine::new();
        let doc_type = engine.classify("", "");
        assert_eq!(doc_type, DocumentType::Unknown);

        let issues = engine.detect("", doc_type);
        let categories: Vec<_> = issues.iter().map(|i| i.category).collect();
        assert_eq!(categories.len(), 2);
        assert!(categories.contains(&IssueCategory::MissingJurisdictionClause));
        assert!(categories.contains(&IssueCategory::MissingSignature));
    }

    #[test]
    fn test_engine_classifies_then_detects() {
        let engine = ComplianceEngine::new();
        let text = "MEMORANDUM OF ASSOCIATION\n\
                    The Company is registered in the Abu Dhabi Global Market.\n\
                    Signed by the subscribers.";
        let doc_type = engine.classify(text, "moa.docx");
        assert_eq!(doc_type, DocumentType::MemorandumOfAssociation);

        let issues = engine.detect(text, doc_type);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].category, IssueCategory::MissingOwnershipDeclaration);
    }
}
