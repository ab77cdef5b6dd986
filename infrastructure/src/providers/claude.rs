//! Anthropic Claude adapter

use super::{ProviderKind, model_supports_thinking};
use async_trait::async_trait;
use cadmate_application::ports::ai_provider::{AiProvider, AiResponse, AiUsage, ProviderError};
use serde::Deserialize;
use tracing::debug;

const CLAUDE_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

const SYSTEM_PROMPT: &str =
    "You are a CAD assistant embedded in a parametric modelling workspace. \
     Answer concisely and prefer concrete modelling steps.";

pub struct ClaudeProvider {
    api_key: Option<String>,
    model: String,
    client: reqwest::Client,
}

impl ClaudeProvider {
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            api_key,
            model: model.into(),
            client: reqwest::Client::new(),
        }
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ProviderError::MissingApiKey("claude".to_string()))
    }

    fn build_request_body(&self, text: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "system": SYSTEM_PROMPT,
            "messages": [{ "role": "user", "content": text }],
        })
    }
}

#[async_trait]
impl AiProvider for ClaudeProvider {
    fn name(&self) -> &str {
        "claude"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn supports_thinking(&self) -> bool {
        model_supports_thinking(ProviderKind::Claude, &self.model)
    }

    async fn send_message(&self, text: &str) -> Result<AiResponse, ProviderError> {
        let api_key = self.api_key()?;
        let body = self.build_request_body(text);

        let response = self
            .client
            .post(CLAUDE_API_URL)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|error| ProviderError::Http(error.to_string()))?;

        let status = response.status().as_u16();
        let body_text = response
            .text()
            .await
            .map_err(|error| ProviderError::Http(error.to_string()))?;
        if status != 200 {
            return Err(ProviderError::Api {
                status,
                message: body_text,
            });
        }

        let parsed: ClaudeResponse = serde_json::from_str(&body_text)
            .map_err(|error| ProviderError::InvalidResponse(error.to_string()))?;

        let mut content = String::new();
        let mut thinking = None;
        for block in parsed.content {
            match block {
                ContentBlock::Text { text } => content.push_str(&text),
                ContentBlock::Thinking { thinking: trace } => thinking = Some(trace),
            }
        }
        debug!(model = %self.model, "claude reply received");

        Ok(AiResponse {
            content,
            thinking,
            usage: parsed.usage.map(|usage| AiUsage {
                input_tokens: usage.input_tokens,
                output_tokens: usage.output_tokens,
            }),
        })
    }

    async fn test_connection(&self) -> bool {
        let Ok(api_key) = self.api_key() else {
            return false;
        };
        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": 1,
            "messages": [{ "role": "user", "content": "Hi" }],
        });
        let result = self
            .client
            .post(CLAUDE_API_URL)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await;
        matches!(result, Ok(response) if response.status().is_success())
    }
}

#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<ResponseUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    Thinking { thinking: String },
}

#[derive(Debug, Deserialize)]
struct ResponseUsage {
    input_tokens: u64,
    output_tokens: u64,
}
