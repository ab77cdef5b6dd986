//! OpenRouter adapter
//!
//! OpenRouter speaks the OpenAI chat-completions dialect and routes to the
//! model named in the request body.

use async_trait::async_trait;
use cadmate_application::ports::ai_provider::{AiProvider, AiResponse, AiUsage, ProviderError};
use serde::Deserialize;
use tracing::debug;

const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

pub struct OpenRouterProvider {
    api_key: Option<String>,
    model: String,
    client: reqwest::Client,
}

impl OpenRouterProvider {
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
            .ok_or_else(|| ProviderError::MissingApiKey("openrouter".to_string()))
    }

    fn build_request_body(&self, text: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": text }],
        })
    }
}

#[async_trait]
impl AiProvider for OpenRouterProvider {
    fn name(&self) -> &str {
        "openrouter"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn send_message(&self, text: &str) -> Result<AiResponse, ProviderError> {
        let api_key = self.api_key()?;
        let response = self
            .client
            .post(OPENROUTER_API_URL)
            .bearer_auth(api_key)
            .json(&self.build_request_body(text))
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

        let parsed: ChatResponse = serde_json::from_str(&body_text)
            .map_err(|error| ProviderError::InvalidResponse(error.to_string()))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::InvalidResponse("no choices".to_string()))?;
        debug!(model = %self.model, "openrouter reply received");

        Ok(AiResponse {
            content,
            thinking: None,
            usage: parsed.usage.map(|usage| AiUsage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
            }),
        })
    }

    async fn test_connection(&self) -> bool {
        let Ok(api_key) = self.api_key() else {
            return false;
        };
        let result = self
            .client
            .post(OPENROUTER_API_URL)
            .bearer_auth(api_key)
            .json(&self.build_request_body("Hi"))
            .send()
            .await;
        matches!(result, Ok(response) if response.status().is_success())
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}
