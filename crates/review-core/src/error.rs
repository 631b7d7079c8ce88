use thiserror::Error;

/// Failure of the optional knowledge lookup. Never aborts a review.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("Lookup timed out after {0} ms")]
    Timeout(u64),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Lookup returned no answer")]
    EmptyResponse,

    #[error("Reference corpus error: {0}")]
    Corpus(String),
}

impl From<tantivy::TantivyError> for LookupError {
    fn from(err: tantivy::TantivyError) -> Self {
        LookupError::Corpus(err.to_string())
    }
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        LookupError::Http(err.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}
