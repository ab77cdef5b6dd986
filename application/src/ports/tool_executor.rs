//! Tool executor port
//!
//! How the application layer invokes registered tools. The runtime
//! registry adapter in the infrastructure layer implements this.

use async_trait::async_trait;
use cadmate_domain::capability::entities::{ToolInfo, ToolOutcome};
use cadmate_domain::capability::handler::ToolParams;

/// Port for runtime tool execution
#[async_trait]
pub trait ToolExecutorPort: Send + Sync {
    /// Whether a tool is registered
    fn has_tool(&self, tool_id: &str) -> bool;

    /// Ids of all registered tools
    fn tool_ids(&self) -> Vec<String>;

    /// Runtime metadata for a tool
    fn tool_info(&self, tool_id: &str) -> Option<ToolInfo>;

    /// Pre-invocation parameter validation
    fn validate_params(&self, tool_id: &str, params: &ToolParams) -> Result<(), String>;

    /// Check live runtime preconditions (active document, selection, ...).
    ///
    /// Returns pass/fail plus one message per missing precondition.
    async fn validate_dependencies(&self, tool_id: &str) -> (bool, Vec<String>);

    /// Invoke a tool. Unknown tools yield a failed outcome, not a panic.
    async fn invoke(&self, tool_id: &str, params: &ToolParams) -> ToolOutcome;
}
