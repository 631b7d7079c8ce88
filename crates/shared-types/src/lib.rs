pub mod types;

pub use types::{
    AnnotatedIssue, BatchSummary, DocumentReport, DocumentType, Issue, IssueCategory, Process,
    Severity,
};
