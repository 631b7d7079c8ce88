//! Batch orchestration: extract, classify, detect, locate, annotate, serialize
//!
//! Documents are processed one after another. Nothing that goes wrong with a
//! single document (parse failure, annotation failure, lookup failure) stops
//! the batch; each degrades to a recorded issue, a fallback note or fixed text.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use compliance_engine::{missing_documents, required_documents, ComplianceEngine, ProcessChoice};
use docx_core::{extract, CommentAuthor, DocxDocument, ExtractOptions};
use shared_types::{
    AnnotatedIssue, BatchSummary, DocumentReport, DocumentType, Issue, IssueCategory, Severity,
};
use tracing::{debug, info, warn};

use crate::appendix::append_review_appendix;
use crate::config::ReviewConfig;
use crate::knowledge::rag::{truncate_chars, LOCAL_CONTEXT_CHARS};
use crate::knowledge::{query_with_timeout, KnowledgeLookup, LOOKUP_FALLBACK};
use crate::locator::locate;

/// Characters of a lookup answer written into the document
pub const GUIDANCE_CHARS: usize = 800;

/// An uploaded file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewFile {
    pub filename: String,
    pub content: Vec<u8>,
}

impl ReviewFile {
    pub fn new(filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content,
        }
    }
}

/// Annotated output for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewedDocument {
    pub filename: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct DocumentOutcome {
    pub report: DocumentReport,
    /// None when the file could not be parsed or re-serialized
    pub reviewed: Option<ReviewedDocument>,
    /// True when the file never parsed; its label is not counted as observed
    pub parse_failed: bool,
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub reviewed_docs: Vec<ReviewedDocument>,
    pub summary: BatchSummary,
}

/// High-severity issue recorded in place of a file's analysis
pub fn processing_failure(filename: &str, reason: &str) -> Issue {
    Issue {
        document: filename.to_string(),
        category: IssueCategory::ProcessingFailure,
        section: "Document".to_string(),
        location_hint: "Entire document".to_string(),
        issue: format!("Document could not be processed: {}", reason),
        severity: Severity::High,
        suggestion: "Ensure the file is a valid, uncorrupted .docx document and upload it again."
            .to_string(),
    }
}

/// Comment text written for an issue
pub fn comment_body(issue: &Issue) -> String {
    format!("Issue: {} | Suggestion: {}", issue.issue, issue.suggestion)
}

/// Locate every issue and attach it as a comment, degrading to a visible
/// "[COMMENT]" paragraph when the comment cannot be anchored.
pub fn annotate_issues(
    doc: &mut DocxDocument,
    issues: Vec<Issue>,
    author: &CommentAuthor,
) -> Vec<AnnotatedIssue> {
    // Resolve against the original paragraphs; fallback notes only append
    let paragraphs = doc.paragraphs();

    issues
        .into_iter()
        .map(|issue| {
            let location = locate(&issue, &paragraphs);
            let mut annotated = AnnotatedIssue::unattached(issue);
            annotated.attached_to_paragraph_index = location;

            if let Some(index) = location {
                let body = comment_body(&annotated.issue);
                match doc.attach_comment(index, &body, author) {
                    Ok(id) => {
                        debug!(comment_id = id, paragraph = index, "Issue anchored");
                        annotated.attached = true;
                    }
                    Err(e) => {
                        warn!(paragraph = index, error = %e, "Comment anchoring failed, appending note");
                        doc.add_fallback_note(&body);
                    }
                }
            }
            annotated
        })
        .collect()
}

pub struct Reviewer {
    config: ReviewConfig,
    engine: ComplianceEngine,
    lookup: Option<Arc<dyn KnowledgeLookup>>,
}

impl Reviewer {
    pub fn new(config: ReviewConfig) -> Self {
        Self {
            config,
            engine: ComplianceEngine::new(),
            lookup: None,
        }
    }

    /// Enable lookup-assisted classification and issue enrichment
    ///
    /// At most `max_enriched_issues` lookups run per document, each bounded
    /// by `lookup_timeout_ms`.
    pub fn with_lookup(mut self, lookup: Arc<dyn KnowledgeLookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    pub fn config(&self) -> &ReviewConfig {
        &self.config
    }

    fn author(&self) -> CommentAuthor {
        CommentAuthor::new(&self.config.author, &self.config.initials)
    }

    fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.config.lookup_timeout_ms)
    }

    /// Review every file and check the batch against a checklist
    ///
    /// # Arguments
    ///
    /// * `files` - Uploaded documents, reviewed in order
    /// * `choice` - Checklist to measure against, or `Auto` to infer it from
    ///   the labels of the files that parsed
    ///
    /// # Returns
    ///
    /// One report per file (in upload order) and one annotated document per
    /// file that could be parsed and re-serialized. Per-file failures are
    /// reported as issues and never abort the batch.
    pub async fn review_batch(&self, files: &[ReviewFile], choice: ProcessChoice) -> BatchOutcome {
        let mut reviewed_docs = Vec::new();
        let mut reports = Vec::with_capacity(files.len());
        let mut observed: Vec<DocumentType> = Vec::new();

        for file in files {
            let outcome = self.review_document(file).await;
            if !outcome.parse_failed {
                observed.push(outcome.report.document_type);
            }
            if let Some(doc) = outcome.reviewed {
                reviewed_docs.push(doc);
            }
            reports.push(outcome.report);
        }

        let process = choice.resolve(&observed);
        let missing = missing_documents(process, &observed);

        info!(
            process = %process,
            documents = files.len(),
            missing = missing.len(),
            "Batch reviewed"
        );

        BatchOutcome {
            reviewed_docs,
            summary: BatchSummary {
                process,
                documents_uploaded: files.len(),
                required_documents: required_documents(process).len(),
                missing_documents: missing,
                individual_reports: reports,
            },
        }
    }

    /// Review one file. Never fails: problems are reported as issues.
    pub async fn review_document(&self, file: &ReviewFile) -> DocumentOutcome {
        info!(filename = %file.filename, bytes = file.content.len(), "Reviewing document");

        let mut doc = match DocxDocument::from_bytes(&file.content) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(filename = %file.filename, error = %e, "Document failed to parse");
                let issue = processing_failure(&file.filename, &e.to_string());
                return DocumentOutcome {
                    report: DocumentReport {
                        filename: file.filename.clone(),
                        document_type: DocumentType::Unknown,
                        issues_found: vec![AnnotatedIssue::unattached(issue)],
                        num_paragraphs: 0,
                    },
                    reviewed: None,
                    parse_failed: true,
                };
            }
        };

        let extraction = extract(
            &doc,
            ExtractOptions {
                include_tables: self.config.include_tables,
            },
        );

        let mut document_type = self.engine.classify(&extraction.text, &file.filename);
        if document_type == DocumentType::Unknown && !extraction.text.trim().is_empty() {
            document_type = self.classify_with_lookup(&extraction.text).await;
        }
        debug!(filename = %file.filename, document_type = %document_type, "Classified");

        let issues = self.engine.detect(&extraction.text, document_type);
        let mut annotated = annotate_issues(&mut doc, issues, &self.author());

        self.enrich(&mut doc, &mut annotated, document_type, &extraction.text)
            .await;

        if self.config.append_review_summary {
            let issues: Vec<Issue> = annotated.iter().map(|a| a.issue.clone()).collect();
            append_review_appendix(&mut doc, &issues, Utc::now());
        }

        let num_paragraphs = doc.paragraph_count();
        let reviewed = match doc.to_bytes() {
            Ok(content) => Some(ReviewedDocument {
                filename: file.filename.clone(),
                content,
            }),
            Err(e) => {
                warn!(filename = %file.filename, error = %e, "Reviewed document could not be saved");
                annotated.push(AnnotatedIssue::unattached(processing_failure(
                    &file.filename,
                    &e.to_string(),
                )));
                None
            }
        };

        info!(
            filename = %file.filename,
            document_type = %document_type,
            issues = annotated.len(),
            attached = annotated.iter().filter(|a| a.attached).count(),
            "Document reviewed"
        );

        DocumentOutcome {
            report: DocumentReport {
                filename: file.filename.clone(),
                document_type,
                issues_found: annotated,
                num_paragraphs,
            },
            reviewed,
            parse_failed: false,
        }
    }

    /// Ask the lookup to name the document type; Unknown on any failure
    async fn classify_with_lookup(&self, text: &str) -> DocumentType {
        let Some(lookup) = &self.lookup else {
            return DocumentType::Unknown;
        };

        let labels: Vec<&str> = DocumentType::ALL
            .iter()
            .filter(|t| **t != DocumentType::Unknown)
            .map(|t| t.name())
            .collect();
        let excerpt = truncate_chars(text, LOCAL_CONTEXT_CHARS).to_lowercase();
        let question = format!(
            "Classify this document into one of: {}, Other. Document excerpt:\n\n{}",
            labels.join(", "),
            excerpt
        );

        match query_with_timeout(lookup.as_ref(), &question, &excerpt, self.lookup_timeout()).await {
            Ok(answer) => label_in_answer(&answer),
            Err(e) => {
                warn!(error = %e, "Lookup classification failed");
                DocumentType::Unknown
            }
        }
    }

    /// Attach lookup guidance to the first `max_enriched_issues` issues
    async fn enrich(
        &self,
        doc: &mut DocxDocument,
        annotated: &mut [AnnotatedIssue],
        document_type: DocumentType,
        text: &str,
    ) {
        let Some(lookup) = &self.lookup else {
            return;
        };
        let context = truncate_chars(text, LOCAL_CONTEXT_CHARS);

        for entry in annotated.iter_mut().take(self.config.max_enriched_issues) {
            let question = format!(
                "Document type: {}. Issue: {}. Provide ADGM-citation and recommended fix.",
                document_type, entry.issue.issue
            );
            let answer =
                match query_with_timeout(lookup.as_ref(), &question, context, self.lookup_timeout())
                    .await
                {
                    Ok(answer) => answer,
                    Err(e) => {
                        warn!(error = %e, issue = %entry.issue.issue, "Lookup failed, using fallback text");
                        LOOKUP_FALLBACK.to_string()
                    }
                };

            doc.add_paragraph(&format!("Guidance for issue '{}':", entry.issue.issue));
            doc.add_paragraph(truncate_chars(&answer, GUIDANCE_CHARS));
            entry.guidance = Some(answer);
        }
    }
}

/// First label (declaration order) whose name appears in the answer
pub fn label_in_answer(answer: &str) -> DocumentType {
    let lower = answer.to_lowercase();
    DocumentType::ALL
        .iter()
        .copied()
        .filter(|t| *t != DocumentType::Unknown)
        .find(|t| lower.contains(&t.name().to_lowercase()))
        .unwrap_or(DocumentType::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LookupError;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    struct FixedLookup(Result<String, LookupError>);

    #[async_trait]
    impl KnowledgeLookup for FixedLookup {
        async fn query(&self, _question: &str, _context: &str) -> Result<String, LookupError> {
            self.0.clone()
        }
    }

    struct SlowLookup;

    #[async_trait]
    impl KnowledgeLookup for SlowLookup {
        async fn query(&self, _question: &str, _context: &str) -> Result<String, LookupError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("too late".to_string())
        }
    }

    fn docx(paragraphs: &[&str]) -> Vec<u8> {
        let mut doc = DocxDocument::new_blank().unwrap();
        for p in paragraphs {
            doc.add_paragraph(p);
        }
        doc.to_bytes().unwrap()
    }

    fn articles() -> ReviewFile {
        ReviewFile::new(
            "articles.docx",
            docx(&[
                "ARTICLES OF ASSOCIATION",
                "1.1 Disputes shall be referred to the Dubai Courts.",
                "1.2 The directors may appoint a secretary.",
            ]),
        )
    }

    #[test]
    fn test_annotate_issues_attaches_every_located_issue() {
        let mut doc = DocxDocument::from_bytes(&articles().content).unwrap();
        let text = doc.paragraphs().join("\n");
        let issues = compliance_engine::detect_issues(&text, DocumentType::ArticlesOfAssociation);
        let count = issues.len();

        let annotated = annotate_issues(&mut doc, issues, &CommentAuthor::new("ADGM-Agent", "AA"));
        assert_eq!(annotated.len(), count);
        assert!(annotated.iter().all(|a| a.attached));
        assert_eq!(doc.comments().unwrap().len(), count);

        let mismatch = annotated
            .iter()
            .find(|a| a.issue.category == IssueCategory::JurisdictionMismatch)
            .unwrap();
        // No "jurisdiction" paragraph, so the "court" keyword wins
        assert_eq!(mismatch.attached_to_paragraph_index, Some(1));
    }

    #[test]
    fn test_annotate_empty_document_leaves_issues_unattached() {
        let mut doc = DocxDocument::new_blank().unwrap();
        let issues = compliance_engine::detect_issues("", DocumentType::BoardResolution);
        let annotated = annotate_issues(&mut doc, issues, &CommentAuthor::new("A", "A"));
        assert!(annotated
            .iter()
            .all(|a| !a.attached && a.attached_to_paragraph_index.is_none()));
        assert_eq!(doc.paragraph_count(), 0);
    }

    /// Articles whose existing comments part carries a non-numeric id, so
    /// every new comment fails to anchor
    fn articles_with_bad_comment_id() -> Vec<u8> {
        let mut doc = DocxDocument::from_bytes(&articles().content).unwrap();
        doc.attach_comment(0, "existing", &CommentAuthor::new("Reviewer", "R"))
            .unwrap();

        let mut package = docx_core::package::Package::read(&doc.to_bytes().unwrap()).unwrap();
        let comments = String::from_utf8(package.get("word/comments.xml").unwrap().to_vec()).unwrap();
        assert!(comments.contains(r#"w:id="0""#));
        package.set(
            "word/comments.xml",
            comments.replace(r#"w:id="0""#, r#"w:id="abc""#).into_bytes(),
        );
        package.write().unwrap()
    }

    #[test]
    fn test_annotation_failure_degrades_to_notes() {
        let mut doc = DocxDocument::from_bytes(&articles_with_bad_comment_id()).unwrap();
        let original = doc.paragraphs();
        let text = original.join("\n");
        let issues = compliance_engine::detect_issues(&text, DocumentType::ArticlesOfAssociation);
        let expected_notes: Vec<String> = issues
            .iter()
            .map(|issue| format!("[COMMENT] {}", comment_body(issue)))
            .collect();
        assert!(!issues.is_empty());

        let annotated = annotate_issues(&mut doc, issues, &CommentAuthor::new("ADGM-Agent", "AA"));

        assert!(annotated.iter().all(|a| !a.attached));
        assert!(annotated.iter().all(|a| a.attached_to_paragraph_index.is_some()));

        let after = doc.paragraphs();
        assert_eq!(after.len(), original.len() + annotated.len());
        assert_eq!(&after[..original.len()], &original[..]);
        assert_eq!(&after[original.len()..], &expected_notes[..]);
    }

    #[tokio::test]
    async fn test_annotation_failure_does_not_stop_batch() {
        let reviewer = Reviewer::new(ReviewConfig::default());
        let files = vec![
            ReviewFile::new("bad-ids.docx", articles_with_bad_comment_id()),
            articles(),
        ];

        let outcome = reviewer.review_batch(&files, ProcessChoice::Auto).await;

        assert_eq!(outcome.reviewed_docs.len(), 2);
        let degraded = &outcome.summary.individual_reports[0];
        assert!(!degraded.issues_found.is_empty());
        assert!(degraded.issues_found.iter().all(|a| !a.attached));

        let reviewed = DocxDocument::from_bytes(&outcome.reviewed_docs[0].content).unwrap();
        let notes = reviewed
            .paragraphs()
            .iter()
            .filter(|p| p.starts_with("[COMMENT] "))
            .count();
        assert_eq!(notes, degraded.issues_found.len());

        let healthy = &outcome.summary.individual_reports[1];
        assert!(healthy.issues_found.iter().all(|a| a.attached));
    }

    #[tokio::test]
    async fn test_batch_with_one_corrupt_file() {
        let reviewer = Reviewer::new(ReviewConfig::default());
        let files = vec![
            articles(),
            ReviewFile::new("broken.docx", b"definitely not a zip".to_vec()),
            ReviewFile::new(
                "ubo.docx",
                docx(&["UBO Declaration", "Ultimate Beneficial Owner: A. Holder"]),
            ),
        ];

        let outcome = reviewer.review_batch(&files, ProcessChoice::Auto).await;
        let summary = &outcome.summary;

        assert_eq!(summary.documents_uploaded, 3);
        assert_eq!(summary.individual_reports.len(), 3);
        assert_eq!(outcome.reviewed_docs.len(), 2);

        let broken = &summary.individual_reports[1];
        assert_eq!(broken.document_type, DocumentType::Unknown);
        assert_eq!(broken.num_paragraphs, 0);
        assert_eq!(broken.issues_found.len(), 1);
        assert_eq!(broken.issues_found[0].issue.category, IssueCategory::ProcessingFailure);
        assert_eq!(broken.issues_found[0].issue.severity, Severity::High);

        assert_eq!(
            summary.individual_reports[0].document_type,
            DocumentType::ArticlesOfAssociation
        );
        assert_eq!(
            summary.individual_reports[2].document_type,
            DocumentType::UboDeclarationForm
        );

        assert_eq!(summary.process, shared_types::Process::CompanyIncorporation);
        assert_eq!(summary.required_documents, 5);
        assert_eq!(
            summary.missing_documents,
            vec![
                DocumentType::MemorandumOfAssociation,
                DocumentType::IncorporationApplicationForm,
                DocumentType::RegisterOfMembersAndDirectors,
            ]
        );
    }

    #[tokio::test]
    async fn test_reviewed_document_keeps_text_and_gains_comments() {
        let reviewer = Reviewer::new(ReviewConfig::default());
        let file = articles();
        let outcome = reviewer.review_document(&file).await;

        let reviewed = outcome.reviewed.unwrap();
        let original = DocxDocument::from_bytes(&file.content).unwrap();
        let annotated = DocxDocument::from_bytes(&reviewed.content).unwrap();

        assert_eq!(annotated.paragraphs(), original.paragraphs());
        assert_eq!(
            annotated.comments().unwrap().len(),
            outcome.report.issues_found.len()
        );
        assert_eq!(outcome.report.num_paragraphs, 3);
    }

    #[tokio::test]
    async fn test_enrichment_is_bounded_and_appended() {
        let config = ReviewConfig {
            max_enriched_issues: 1,
            ..ReviewConfig::default()
        };
        let reviewer =
            Reviewer::new(config).with_lookup(Arc::new(FixedLookup(Ok("See Article 5.".into()))));
        let outcome = reviewer.review_document(&articles()).await;

        let guided: Vec<_> = outcome
            .report
            .issues_found
            .iter()
            .filter(|a| a.guidance.is_some())
            .collect();
        assert_eq!(guided.len(), 1);
        assert_eq!(guided[0].guidance.as_deref(), Some("See Article 5."));

        let doc = DocxDocument::from_bytes(&outcome.reviewed.unwrap().content).unwrap();
        let paragraphs = doc.paragraphs();
        assert_eq!(paragraphs.len(), 5);
        assert!(paragraphs[3].starts_with("Guidance for issue '"));
        assert_eq!(paragraphs[4], "See Article 5.");
    }

    #[tokio::test]
    async fn test_failed_lookup_uses_fallback_text() {
        let reviewer = Reviewer::new(ReviewConfig::default())
            .with_lookup(Arc::new(FixedLookup(Err(LookupError::Http("down".into())))));
        let outcome = reviewer.review_document(&articles()).await;
        assert!(outcome
            .report
            .issues_found
            .iter()
            .take(6)
            .all(|a| a.guidance.as_deref() == Some(LOOKUP_FALLBACK)));
    }

    #[tokio::test]
    async fn test_slow_lookup_times_out() {
        let config = ReviewConfig {
            lookup_timeout_ms: 20,
            max_enriched_issues: 1,
            ..ReviewConfig::default()
        };
        let reviewer = Reviewer::new(config).with_lookup(Arc::new(SlowLookup));
        let outcome = reviewer.review_document(&articles()).await;
        assert_eq!(
            outcome.report.issues_found[0].guidance.as_deref(),
            Some(LOOKUP_FALLBACK)
        );
    }

    #[tokio::test]
    async fn test_lookup_classifies_unknown_documents() {
        let reviewer = Reviewer::new(ReviewConfig::default()).with_lookup(Arc::new(FixedLookup(
            Ok("This looks like a Business Plan.".into()),
        )));
        let file = ReviewFile::new("plan.docx", docx(&["Five year revenue projections"]));
        let outcome = reviewer.review_document(&file).await;
        assert_eq!(outcome.report.document_type, DocumentType::BusinessPlan);
    }

    #[tokio::test]
    async fn test_summary_appendix() {
        let config = ReviewConfig {
            append_review_summary: true,
            ..ReviewConfig::default()
        };
        let outcome = Reviewer::new(config).review_document(&articles()).await;
        let doc = DocxDocument::from_bytes(&outcome.reviewed.unwrap().content).unwrap();
        assert!(doc
            .paragraphs()
            .iter()
            .any(|p| p == crate::appendix::APPENDIX_HEADING));
        assert!(outcome.report.num_paragraphs > 3);
    }

    #[test]
    fn test_label_in_answer() {
        assert_eq!(
            label_in_answer("It is a MEMORANDUM OF ASSOCIATION."),
            DocumentType::MemorandumOfAssociation
        );
        assert_eq!(label_in_answer("Other"), DocumentType::Unknown);
    }
}
