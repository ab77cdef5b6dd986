//! Google Gemini adapter

use async_trait::async_trait;
use cadmate_application::ports::ai_provider::{AiProvider, AiResponse, AiUsage, ProviderError};
use serde::Deserialize;
use tracing::debug;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub struct GeminiProvider {
    api_key: Option<String>,
    model: String,
    client: reqwest::Client,
}

impl GeminiProvider {
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
            .ok_or_else(|| ProviderError::MissingApiKey("gemini".to_string()))
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", GEMINI_API_BASE, self.model)
    }

    fn build_request_body(&self, text: &str) -> serde_json::Value {
        serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": text }],
            }],
        })
    }
}

#[async_trait]
impl AiProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn send_message(&self, text: &str) -> Result<AiResponse, ProviderError> {
        let api_key = self.api_key()?;
        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", api_key)])
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

        let parsed: GeminiResponse = serde_json::from_str(&body_text)
            .map_err(|error| ProviderError::InvalidResponse(error.to_string()))?;
        let content = parsed
            .candidates
            .into_iter()
            .next()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .into_iter()
                    .map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .ok_or_else(|| ProviderError::InvalidResponse("no candidates".to_string()))?;
        debug!(model = %self.model, "gemini reply received");

        Ok(AiResponse {
            content,
            thinking: None,
            usage: parsed.usage_metadata.map(|usage| AiUsage {
                input_tokens: usage.prompt_token_count,
                output_tokens: usage.candidates_token_count,
            }),
        })
    }

    async fn test_connection(&self) -> bool {
        let Ok(api_key) = self.api_key() else {
            return false;
        };
        let result = self
            .client
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .json(&self.build_request_body("Hi"))
            .send()
            .await;
        matches!(result, Ok(response) if response.status().is_success())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_includes_model() {
        let provider = GeminiProvider::new(Some("key".to_string()), "gemini-1.5-pro");
        assert!(provider.endpoint().ends_with("gemini-1.5-pro:generateContent"));
    }

    #[test]
    fn test_response_parsing_joins_parts() {
        let raw = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "Use a "}, {"text": "cylinder."}]}
            }],
            "usageMetadata": {"promptTokenCount": 4, "candidatesTokenCount": 6}
        }"#;
        let parsed: GeminiResponse = serde_json::from_str(raw).unwrap();
        let text: String = parsed.candidates[0]
            .content
            .parts
            .iter()
            .map(|part| part.text.as_str())
            .collect();
        assert_eq!(text, "Use a cylinder.");
        assert_eq!(parsed.usage_metadata.unwrap().candidates_token_count, 6);
    }

    #[test]
    fn test_no_thinking_support() {
        let provider = GeminiProvider::new(None, "gemini-1.5-flash");
        assert!(!provider.supports_thinking());
    }
}
