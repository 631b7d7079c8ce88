//! Retrieval over the reference corpus, optionally answered by a chat model

use std::time::Duration;

use async_trait::async_trait;

use super::chat::{ChatClient, Message};
use super::corpus::{ReferenceCorpus, ScoredReference};
use super::{KnowledgeLookup, LookupConfig};
use crate::error::LookupError;

/// Characters of the reviewed document sent as context
pub const LOCAL_CONTEXT_CHARS: usize = 2000;
/// Characters of each retrieved source sent as context
pub const SOURCE_CHARS: usize = 2500;
/// Characters of the best source quoted when no chat model is configured
const EXCERPT_CHARS: usize = 600;

const SYSTEM_PROMPT: &str = "You are an assistant specialized in ADGM corporate law. \
Use the provided ADGM references to cite applicable regulations and give a short recommendation.";

/// First `max` characters of `text`, never splitting a character
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}

pub struct RagLookup {
    corpus: ReferenceCorpus,
    chat: Option<ChatClient>,
    top_k: usize,
}

impl RagLookup {
    /// Combine an indexed corpus with an optional chat model
    ///
    /// # Arguments
    ///
    /// * `corpus` - Indexed references
    /// * `chat` - Model used to phrase answers; `None` answers from the best excerpt
    /// * `top_k` - References retrieved per question (at least 1)
    pub fn new(corpus: ReferenceCorpus, chat: Option<ChatClient>, top_k: usize) -> Self {
        Self {
            corpus,
            chat,
            top_k: top_k.max(1),
        }
    }

    /// Load and index the references, and build the chat client if configured
    ///
    /// # Arguments
    ///
    /// * `config` - Reference folder, retrieval depth and chat endpoint
    /// * `request_timeout` - HTTP timeout for chat requests
    ///
    /// # Errors
    ///
    /// - `LookupError::Corpus` if the reference folder cannot be read or indexed
    /// - `LookupError::Http` if the chat client cannot be built
    pub fn from_config(config: &LookupConfig, request_timeout: Duration) -> Result<Self, LookupError> {
        let corpus = ReferenceCorpus::load(&config.reference_dir)?;
        let chat = match &config.llm_base_url {
            Some(url) => Some(ChatClient::new(
                url,
                &config.llm_model,
                config.llm_api_key.clone(),
                request_timeout,
            )?),
            None => None,
        };

        tracing::info!(
            references = corpus.len(),
            chat_model = chat.as_ref().map(|c| c.model()).unwrap_or("none"),
            "Knowledge lookup ready"
        );
        Ok(Self::new(corpus, chat, config.top_k))
    }

    pub fn corpus(&self) -> &ReferenceCorpus {
        &self.corpus
    }

    /// User prompt: bounded document excerpt, retrieved sources, question
    pub fn build_prompt(
        question: &str,
        local_context: &str,
        retrieved: &[ScoredReference<'_>],
    ) -> String {
        let mut context = String::new();
        if !local_context.trim().is_empty() {
            context.push_str("User Document Excerpt:\n");
            context.push_str(truncate_chars(local_context, LOCAL_CONTEXT_CHARS));
            context.push_str("\n\n");
        }
        for reference in retrieved {
            context.push_str(&format!(
                "\n--- Source: {} ---\n{}\n",
                reference.document.source,
                truncate_chars(&reference.document.text, SOURCE_CHARS)
            ));
        }

        format!(
            "CONTEXT:\n{}\n\nQUESTION:\n{}\n\nAnswer concisely; if you cite law include article numbers if available.",
            context, question
        )
    }
}

#[async_trait]
impl KnowledgeLookup for RagLookup {
    async fn query(&self, question: &str, local_context: &str) -> Result<String, LookupError> {
        let retrieved = self.corpus.search(question, self.top_k);

        match &self.chat {
            Some(chat) => {
                let prompt = Self::build_prompt(question, local_context, &retrieved);
                chat.chat(&[Message::system(SYSTEM_PROMPT), Message::user(prompt)])
                    .await
            }
            None => {
                let best = retrieved.first().ok_or(LookupError::EmptyResponse)?;
                Ok(format!(
                    "Relevant reference ({}): {}",
                    best.document.source,
                    truncate_chars(best.document.text.trim(), EXCERPT_CHARS)
                ))
            }
        }
    }
}
