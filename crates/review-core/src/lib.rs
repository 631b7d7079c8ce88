//! Document review pipeline for ADGM corporate filings
//!
//! Ties the pure compliance checks to the .docx structural editor: each
//! uploaded file is classified, scanned for red flags, and returned with every
//! issue anchored as a Word comment, plus a batch-level checklist summary.

pub mod appendix;
pub mod config;
pub mod error;
pub mod knowledge;
pub mod locator;
pub mod processor;

pub use config::ReviewConfig;
pub use error::{ConfigError, LookupError};
pub use knowledge::{KnowledgeLookup, LookupConfig, RagLookup, ReferenceCorpus};
pub use locator::locate;
pub use processor::{
    annotate_issues, BatchOutcome, DocumentOutcome, ReviewFile, ReviewedDocument, Reviewer,
};
