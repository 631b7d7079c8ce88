//! Optional knowledge lookup used to enrich issues with citations
//!
//! The lookup is constructed once (reference corpus loaded and indexed, chat
//! client configured) and handed to the reviewer. Every call is best-effort:
//! callers bound it with a timeout and fall back to fixed text on failure.

pub mod chat;
pub mod corpus;
pub mod rag;

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{ConfigError, LookupError};

pub use chat::{ChatClient, Message};
pub use corpus::{ReferenceCorpus, ReferenceDocument, ScoredReference};
pub use rag::RagLookup;

/// Substituted for the answer when a lookup fails or times out
pub const LOOKUP_FALLBACK: &str =
    "Reference lookup unavailable. Consult the ADGM Companies Regulations 2020 and the official ADGM templates.";

#[async_trait]
pub trait KnowledgeLookup: Send + Sync {
    /// Answer `question` using `local_context` (an excerpt of the document)
    async fn query(&self, question: &str, local_context: &str) -> Result<String, LookupError>;
}

/// Run one lookup under `timeout`
///
/// # Errors
///
/// Returns `LookupError::Timeout` when the deadline passes first, otherwise
/// whatever the lookup itself returned.
pub async fn query_with_timeout(
    lookup: &dyn KnowledgeLookup,
    question: &str,
    local_context: &str,
    timeout: Duration,
) -> Result<String, LookupError> {
    match tokio::time::timeout(timeout, lookup.query(question, local_context)).await {
        Ok(result) => result,
        Err(_) => Err(LookupError::Timeout(timeout.as_millis() as u64)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupConfig {
    /// Folder scanned for `.txt` / `.md` references
    pub reference_dir: PathBuf,
    /// Sources retrieved per question
    pub top_k: usize,
    /// Chat endpoint; without one answers come straight from the references
    pub llm_base_url: Option<String>,
    pub llm_model: String,
    pub llm_api_key: Option<String>,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            reference_dir: PathBuf::from("./references"),
            top_k: 3,
            llm_base_url: None,
            llm_model: "gpt-4o-mini".to_string(),
            llm_api_key: None,
        }
    }
}

impl LookupConfig {
    /// Load configuration from environment variables
    ///
    /// - REFERENCE_FOLDER: reference folder (default ./references)
    /// - RAG_TOP_K: sources per question (default 3)
    /// - LLM_BASE_URL, LLM_MODEL, LLM_API_KEY: chat endpoint settings
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if RAG_TOP_K is not a number.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

        let top_k = match non_empty("RAG_TOP_K") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "RAG_TOP_K".to_string(),
                    value,
                })?,
            None => defaults.top_k,
        };

        Ok(Self {
            reference_dir: non_empty("REFERENCE_FOLDER")
                .map(PathBuf::from)
                .unwrap_or(defaults.reference_dir),
            top_k,
            llm_base_url: non_empty("LLM_BASE_URL"),
            llm_model: non_empty("LLM_MODEL").unwrap_or(defaults.llm_model),
            llm_api_key: non_empty("LLM_API_KEY"),
        })
    }
}
