//! Tool handler trait
//!
//! The invocable side of a tool. Handlers implement a single `invoke`
//! entrypoint validated against their declared parameter schema at
//! registration time, instead of reflective method dispatch at call time.

use super::entities::{ToolInfo, ToolOutcome};
use async_trait::async_trait;
use std::collections::HashMap;

/// Parameters passed to a tool invocation
pub type ToolParams = HashMap<String, serde_json::Value>;

/// An invocable tool bound into the runtime registry.
///
/// Implementations (adapters over the CAD collaborator) live in the
/// infrastructure layer.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Runtime metadata for this tool
    fn info(&self) -> &ToolInfo;

    /// Validate parameters before invocation.
    ///
    /// The default checks required parameters from the schema; handlers
    /// may override to add range or type checks.
    fn validate_params(&self, params: &ToolParams) -> Result<(), String> {
        for spec in &self.info().parameters {
            if spec.required && spec.default.is_none() && !params.contains_key(&spec.name) {
                return Err(format!(
                    "Missing required parameter '{}' for tool '{}'",
                    spec.name,
                    self.info().id
                ));
            }
        }
        Ok(())
    }

    /// Execute the tool. Never panics; failures are reported through the
    /// returned [`ToolOutcome`].
    async fn invoke(&self, params: &ToolParams) -> ToolOutcome;
}

/// Read a numeric parameter, falling back to the schema default.
pub fn number_param(info: &ToolInfo, params: &ToolParams, name: &str) -> Option<f64> {
    if let Some(value) = params.get(name).and_then(|v| v.as_f64()) {
        return Some(value);
    }
    info.parameters
        .iter()
        .find(|spec| spec.name == name)
        .and_then(|spec| spec.default.as_ref())
        .and_then(|v| v.as_f64())
}

/// Read a string parameter, falling back to the schema default.
pub fn string_param<'a>(info: &'a ToolInfo, params: &'a ToolParams, name: &str) -> Option<&'a str> {
    if let Some(value) = params.get(name).and_then(|v| v.as_str()) {
        return Some(value);
    }
    info.parameters
        .iter()
        .find(|spec| spec.name == name)
        .and_then(|spec| spec.default.as_ref())
        .and_then(|v| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::entities::{ParameterSpec, ToolCategory};

    struct EchoTool {
        info: ToolInfo,
    }

    impl EchoTool {
        fn new() -> Self {
            Self {
                info: ToolInfo::new("test.echo", "Echo", ToolCategory::Analysis)
                    .with_parameter(ParameterSpec::new("text", "string", true))
                    .with_parameter(
                        ParameterSpec::new("count", "number", true).with_default(1),
                    ),
            }
        }
    }

    #[async_trait]
    impl ToolHandler for EchoTool {
        fn info(&self) -> &ToolInfo {
            &self.info
        }

        async fn invoke(&self, params: &ToolParams) -> ToolOutcome {
            match string_param(&self.info, params, "text") {
                Some(text) => ToolOutcome::ok(text.to_string()),
                None => ToolOutcome::failed("missing text"),
            }
        }
    }

    #[test]
    fn test_default_validation_checks_required() {
        let tool = EchoTool::new();

        let empty = ToolParams::new();
        assert!(tool.validate_params(&empty).is_err());

        let mut params = ToolParams::new();
        params.insert("text".to_string(), serde_json::json!("hi"));
        // "count" is required but has a default, so it may be omitted
        assert!(tool.validate_params(&params).is_ok());
    }

    #[test]
    fn test_param_defaults() {
        let tool = EchoTool::new();
        let params = ToolParams::new();
        assert_eq!(number_param(tool.info(), &params, "count"), Some(1.0));
        assert_eq!(number_param(tool.info(), &params, "missing"), None);
    }

    #[tokio::test]
    async fn test_invoke() {
        let tool = EchoTool::new();
        let mut params = ToolParams::new();
        params.insert("text".to_string(), serde_json::json!("hello"));

        let outcome = tool.invoke(&params).await;
        assert!(outcome.success);
        assert_eq!(outcome.message, "hello");
    }
}
