//! AI provider adapters
//!
//! One HTTP adapter per provider behind the [`AiProvider`] port, plus the
//! static provider/model mapping the configuration and any UI rely on.

pub mod claude;
pub mod gemini;
pub mod openrouter;

pub use claude::ClaudeProvider;
pub use gemini::GeminiProvider;
pub use openrouter::OpenRouterProvider;

use cadmate_application::ports::ai_provider::AiProvider;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Supported AI providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Claude,
    Gemini,
    OpenRouter,
}

impl ProviderKind {
    pub fn as_str(&self) -> &str {
        match self {
            ProviderKind::Claude => "claude",
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenRouter => "openrouter",
        }
    }

    /// Parse a provider name, case-insensitive.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "claude" | "anthropic" => Some(ProviderKind::Claude),
            "gemini" | "google" => Some(ProviderKind::Gemini),
            "openrouter" => Some(ProviderKind::OpenRouter),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry in the provider/model mapping table
#[derive(Debug, Clone, Copy)]
pub struct ModelSpec {
    pub id: &'static str,
    pub display_name: &'static str,
    /// Whether the model exposes a thinking/reasoning trace
    pub supports_thinking: bool,
}

const CLAUDE_MODELS: &[ModelSpec] = &[
    ModelSpec {
        id: "claude-3-5-sonnet-20241022",
        display_name: "Claude 3.5 Sonnet",
        supports_thinking: true,
    },
    ModelSpec {
        id: "claude-3-5-haiku-20241022",
        display_name: "Claude 3.5 Haiku",
        supports_thinking: true,
    },
    ModelSpec {
        id: "claude-3-opus-20240229",
        display_name: "Claude 3 Opus",
        supports_thinking: true,
    },
];

const GEMINI_MODELS: &[ModelSpec] = &[
    ModelSpec {
        id: "gemini-1.5-pro",
        display_name: "Gemini 1.5 Pro",
        supports_thinking: false,
    },
    ModelSpec {
        id: "gemini-1.5-flash",
        display_name: "Gemini 1.5 Flash",
        supports_thinking: false,
    },
];

const OPENROUTER_MODELS: &[ModelSpec] = &[
    ModelSpec {
        id: "anthropic/claude-3.5-sonnet",
        display_name: "Claude 3.5 Sonnet (OpenRouter)",
        supports_thinking: false,
    },
    ModelSpec {
        id: "meta-llama/llama-3.1-70b-instruct",
        display_name: "Llama 3.1 70B",
        supports_thinking: false,
    },
    ModelSpec {
        id: "mistralai/mistral-large",
        display_name: "Mistral Large",
        supports_thinking: false,
    },
];

/// Models available for one provider, in preference order.
pub fn models_for(kind: ProviderKind) -> &'static [ModelSpec] {
    match kind {
        ProviderKind::Claude => CLAUDE_MODELS,
        ProviderKind::Gemini => GEMINI_MODELS,
        ProviderKind::OpenRouter => OPENROUTER_MODELS,
    }
}

/// Default model for one provider.
pub fn default_model(kind: ProviderKind) -> &'static str {
    models_for(kind)[0].id
}

/// Whether a model of this provider exposes a thinking trace.
pub fn model_supports_thinking(kind: ProviderKind, model: &str) -> bool {
    models_for(kind)
        .iter()
        .find(|spec| spec.id == model)
        .map(|spec| spec.supports_thinking)
        .unwrap_or(false)
}

/// Build a provider adapter from kind, API key, and optional model override.
pub fn build_provider(
    kind: ProviderKind,
    api_key: Option<String>,
    model: Option<String>,
) -> Arc<dyn AiProvider> {
    let model = model.unwrap_or_else(|| default_model(kind).to_string());
    match kind {
        ProviderKind::Claude => Arc::new(ClaudeProvider::new(api_key, model)),
        ProviderKind::Gemini => Arc::new(GeminiProvider::new(api_key, model)),
        ProviderKind::OpenRouter => Arc::new(OpenRouterProvider::new(api_key, model)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_provider_names() {
        assert_eq!(ProviderKind::parse("Claude"), Some(ProviderKind::Claude));
        assert_eq!(ProviderKind::parse("anthropic"), Some(ProviderKind::Claude));
        assert_eq!(ProviderKind::parse("GEMINI"), Some(ProviderKind::Gemini));
        assert_eq!(
            ProviderKind::parse("openrouter"),
            Some(ProviderKind::OpenRouter)
        );
        assert_eq!(ProviderKind::parse("unknown"), None);
    }

    #[test]
    fn test_switching_providers_swaps_model_list() {
        // OpenRouter then Claude: the model lists and thinking support
        // must follow the selected provider.
        let openrouter = models_for(ProviderKind::OpenRouter);
        assert!(openrouter.iter().all(|spec| !spec.supports_thinking));

        let claude = models_for(ProviderKind::Claude);
        assert!(!claude.is_empty());
        assert!(claude.iter().all(|spec| spec.supports_thinking));
        assert!(
            claude
                .iter()
                .all(|spec| !openrouter.iter().any(|other| other.id == spec.id))
        );

        assert!(model_supports_thinking(
            ProviderKind::Claude,
            default_model(ProviderKind::Claude)
        ));
        assert!(!model_supports_thinking(
            ProviderKind::OpenRouter,
            default_model(ProviderKind::OpenRouter)
        ));
    }

    #[test]
    fn test_build_provider_applies_default_model() {
        let provider = build_provider(ProviderKind::Gemini, None, None);
        assert_eq!(provider.name(), "gemini");
        assert_eq!(provider.model(), "gemini-1.5-pro");
        assert!(!provider.supports_thinking());

        let claude = build_provider(ProviderKind::Claude, None, None);
        assert!(claude.supports_thinking());
    }
}
