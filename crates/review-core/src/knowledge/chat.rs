//! OpenAI-compatible chat-completions client

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::LookupError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    max_tokens: u32,
}

impl ChatClient {
    /// Create a client for an OpenAI-compatible chat completions server
    ///
    /// # Arguments
    ///
    /// * `base_url` - Server root, `/v1` root, or full completions URL
    /// * `model` - Model name sent with every request
    /// * `api_key` - Bearer token; empty keys are treated as absent
    /// * `request_timeout` - Per-request timeout applied by the HTTP client
    ///
    /// # Errors
    ///
    /// Returns `LookupError::Http` if the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: Option<String>,
        request_timeout: Duration,
    ) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| LookupError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            model: model.to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            max_tokens: 512,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Resolve the chat completions endpoint from the base URL
    pub fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            base.to_string()
        } else if base.ends_with("/v1") {
            format!("{}/chat/completions", base)
        } else {
            format!("{}/v1/chat/completions", base)
        }
    }

    /// Non-streaming completion at temperature 0
    ///
    /// # Errors
    ///
    /// - `LookupError::Http` on connection failure, timeout or non-2xx status
    /// - `LookupError::EmptyResponse` if the reply has no non-blank content
    pub async fn chat(&self, messages: &[Message]) -> Result<String, LookupError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": 0.0,
            "max_tokens": self.max_tokens,
        });

        let mut request = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request.send().await?.error_for_status()?;
        let json: serde_json::Value = response.json().await?;

        // choices[0].message.content may be null
        let content = json["choices"]
            .get(0)
            .and_then(|c| c["message"]["content"].as_str())
            .map(str::trim)
            .unwrap_or("");

        if content.is_empty() {
            return Err(LookupError::EmptyResponse);
        }
        Ok(content.to_string())
    }
}
