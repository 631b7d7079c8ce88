//! Reading, annotating and writing .docx packages
//!
//! This crate keeps every part of the package it does not need to change
//! byte-for-byte, and edits the main document and comments parts through a
//! small owned XML tree built on quick-xml.

pub mod comments;
pub mod document;
pub mod error;
pub mod extract;
pub mod package;
pub mod xml;

pub use comments::{Comment, CommentAnchors, CommentAuthor};
pub use document::DocxDocument;
pub use error::{AnnotationError, DocxError};
pub use extract::{extract, ExtractOptions, Extraction, IndexedParagraph};
