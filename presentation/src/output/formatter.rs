//! Output formatter abstraction

use cadmate_application::{AgentResponse, AgentStatus};

/// Formats agent responses for display
pub trait OutputFormatter {
    /// Format a complete response
    fn format(&self, response: &AgentResponse) -> String;

    /// Format a response as JSON
    fn format_json(&self, response: &AgentResponse) -> String;

    /// Format a status snapshot
    fn format_status(&self, status: &AgentStatus) -> String;
}
