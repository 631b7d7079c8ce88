use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocxError {
    #[error("Failed to parse document: {0}")]
    ParseError(String),

    #[error("XML error: {0}")]
    XmlError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Why a comment could not be anchored structurally
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnnotationError {
    #[error("Paragraph {index} out of range ({count} paragraphs)")]
    ParagraphOutOfRange { index: usize, count: usize },

    #[error("Malformed markup: {0}")]
    MalformedMarkup(String),

    #[error("Invalid comment id: {0}")]
    InvalidCommentId(String),
}
