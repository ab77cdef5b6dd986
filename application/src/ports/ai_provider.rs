//! AI provider port
//!
//! Used only by the chat path when free text is meant for a model rather
//! than a deterministic tool. Intent analysis and planning never require a
//! live provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from AI provider calls
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Missing API key for provider '{0}'")]
    MissingApiKey(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Token usage reported by a provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Response from an AI provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiResponse {
    /// Main reply content
    pub content: String,
    /// Thinking/reasoning trace, when the provider exposes one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<AiUsage>,
}

impl AiResponse {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            thinking: None,
            usage: None,
        }
    }
}

/// Port for a chat-capable AI provider
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Provider identifier (e.g., "claude", "gemini", "openrouter")
    fn name(&self) -> &str;

    /// Model currently in use
    fn model(&self) -> &str;

    /// Whether this provider exposes a thinking/reasoning trace
    fn supports_thinking(&self) -> bool {
        false
    }

    /// Send free text and get a reply
    async fn send_message(&self, text: &str) -> Result<AiResponse, ProviderError>;

    /// Cheap connectivity probe
    async fn test_connection(&self) -> bool;
}
