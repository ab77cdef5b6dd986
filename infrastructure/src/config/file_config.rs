//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file and
//! are deserialized directly.

use crate::providers::ProviderKind;
use cadmate_application::config::AgentSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// AI provider selection and credentials
    pub provider: FileProviderConfig,
    /// Agent and pipeline behavior
    pub agent: AgentSettings,
    /// Logging destinations
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the configuration, returning human-readable warnings.
    ///
    /// Warnings never abort startup; a misconfigured provider degrades to
    /// deterministic-only operation.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if let Some(name) = &self.provider.name {
            if ProviderKind::parse(name).is_none() {
                issues.push(format!(
                    "provider.name: unknown provider '{}' (expected claude, gemini, or openrouter)",
                    name
                ));
            }
        }
        if self.agent.min_confidence < 0.0 || self.agent.min_confidence > 1.0 {
            issues.push("agent.min_confidence must be within 0.0..=1.0".to_string());
        }
        if self.agent.plan_confidence_threshold < self.agent.min_confidence {
            issues.push(
                "agent.plan_confidence_threshold is below agent.min_confidence".to_string(),
            );
        }
        if self.agent.max_plan_steps == 0 {
            issues.push("agent.max_plan_steps must be at least 1".to_string());
        }
        if self.agent.max_execution_time_secs == 0 {
            issues.push("agent.max_execution_time_secs must be at least 1".to_string());
        }

        issues
    }
}

/// Provider selection and credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProviderConfig {
    /// Provider name ("claude", "gemini", "openrouter"); absent means no
    /// AI provider is configured
    pub name: Option<String>,
    /// Model override; the provider default applies when absent
    pub model: Option<String>,
    pub claude_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub openrouter_api_key: Option<String>,
}

impl FileProviderConfig {
    pub fn kind(&self) -> Option<ProviderKind> {
        self.name.as_deref().and_then(ProviderKind::parse)
    }

    /// API key for a provider kind, when configured.
    pub fn api_key_for(&self, kind: ProviderKind) -> Option<String> {
        let key = match kind {
            ProviderKind::Claude => &self.claude_api_key,
            ProviderKind::Gemini => &self.gemini_api_key,
            ProviderKind::OpenRouter => &self.openrouter_api_key,
        };
        key.clone().filter(|key| !key.is_empty())
    }
}

/// Logging destinations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Log filter (e.g., "info", "cadmate=debug")
    pub level: String,
    /// JSONL execution log path; absent disables the execution log
    pub execution_log: Option<PathBuf>,
}

impl Default for FileLoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            execution_log: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[provider]
name = "claude"
model = "claude-3-5-haiku-20241022"
claude_api_key = "sk-test"

[agent]
require_approval = false
max_plan_steps = 3

[logging]
level = "debug"
execution_log = "logs/execution.jsonl"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.provider.kind(), Some(ProviderKind::Claude));
        assert_eq!(
            config.provider.api_key_for(ProviderKind::Claude).as_deref(),
            Some("sk-test")
        );
        assert!(!config.agent.require_approval);
        assert_eq!(config.agent.max_plan_steps, 3);
        // Unspecified agent fields keep their defaults
        assert!(config.agent.rollback_on_failure);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.execution_log.is_some());
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = FileConfig::default();
        assert!(config.validate().is_empty());
        assert!(config.provider.kind().is_none());
        assert!(config.logging.execution_log.is_none());
    }

    #[test]
    fn test_validate_flags_bad_values() {
        let mut config = FileConfig::default();
        config.provider.name = Some("copilot".to_string());
        config.agent.min_confidence = 1.5;
        config.agent.max_plan_steps = 0;

        // Unknown provider, confidence out of range, threshold below the
        // minimum, and zero plan steps
        let issues = config.validate();
        assert_eq!(issues.len(), 4);
        assert!(issues[0].contains("unknown provider"));
    }

    #[test]
    fn test_empty_api_key_is_ignored() {
        let mut config = FileConfig::default();
        config.provider.gemini_api_key = Some(String::new());
        assert!(config.provider.api_key_for(ProviderKind::Gemini).is_none());
    }
}
