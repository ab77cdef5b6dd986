//! Console output formatter for agent responses

use crate::output::formatter::OutputFormatter;
use cadmate_application::{
    AgentResponse, AgentStatus, ExecutionRecord, ExecutionReport, ResponseStatus,
};
use cadmate_domain::context::entities::WorkspaceContext;
use colored::Colorize;

/// Formats agent responses for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete response
    pub fn format(response: &AgentResponse) -> String {
        let mut output = String::new();

        let status = Self::status_label(response.status);
        output.push_str(&format!(
            "{} {}  {} {}\n",
            "Mode:".cyan().bold(),
            response.mode,
            "Status:".cyan().bold(),
            status
        ));

        if let Some(intent) = &response.intent {
            output.push_str(&format!(
                "{} {} ({:.0}%)\n",
                "Intent:".cyan().bold(),
                intent.kind,
                intent.confidence * 100.0
            ));
        }

        output.push('\n');
        output.push_str(&response.message);
        output.push('\n');

        if let Some(instructions) = &response.instructions {
            output.push_str(&Self::section_header("Instructions"));
            output.push_str(&Self::indent(instructions, "  "));
            output.push('\n');
        }

        if !response.suggested_tools.is_empty() {
            output.push_str(&format!(
                "\n{} {}\n",
                "Tools:".dimmed(),
                response.suggested_tools.join(", ")
            ));
        }

        if let Some(plan_id) = &response.plan_id {
            if response.status == ResponseStatus::AwaitingApproval {
                output.push_str(&format!(
                    "\n{}\n",
                    format!("Approve with /approve {} or reject with /reject {}", plan_id, plan_id)
                        .yellow()
                ));
            }
        }

        if let Some(report) = &response.report {
            output.push_str(&Self::format_report(report));
        }

        if let Some(error) = &response.error {
            output.push_str(&format!("\n{} {}\n", "Error:".red().bold(), error));
        }

        output
    }

    /// Format as JSON
    pub fn format_json(response: &AgentResponse) -> String {
        serde_json::to_string_pretty(response).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format an execution report
    pub fn format_report(report: &ExecutionReport) -> String {
        let mut output = String::new();

        output.push_str(&Self::section_header("Execution"));
        let verdict = if report.success {
            "completed".green().bold()
        } else {
            "failed".red().bold()
        };
        output.push_str(&format!(
            "  {} in {:.2}s, {} step(s) executed\n",
            verdict,
            report.duration_secs,
            report.executed_steps.len()
        ));

        if let Some(step) = &report.failed_step {
            output.push_str(&format!(
                "  {} step {}: {}\n",
                "x".red(),
                step.order,
                step.description
            ));
        }
        for error in &report.errors {
            output.push_str(&format!("  {} {}\n", "x".red(), error));
        }
        if report.rolled_back {
            output.push_str(&format!("  {}\n", "changes rolled back".yellow()));
        }

        output
    }

    /// Format a status snapshot
    pub fn format_status(status: &AgentStatus) -> String {
        let mut output = String::new();

        output.push_str(&Self::section_header("Agent Status"));
        output.push_str(&format!("  {} {}\n", "Mode:".bold(), status.mode));
        output.push_str(&format!("  {} {}\n", "State:".bold(), status.state));
        if let Some(plan_id) = &status.pending_plan {
            output.push_str(&format!(
                "  {} {} (awaiting approval)\n",
                "Pending plan:".bold(),
                plan_id.yellow()
            ));
        }
        output.push_str(&format!(
            "  {} {} queued, {} in history\n",
            "Plans:".bold(),
            status.queue_size,
            status.history_size
        ));
        output.push_str(&format!(
            "  {} {}\n",
            "Tools:".bold(),
            status.available_tools.len()
        ));

        let caps = &status.capabilities;
        let flag = |on: bool| if on { "on".green() } else { "off".red() };
        output.push_str(&format!(
            "  {} execution {}, selection {}, cad {}, ai {}\n",
            "Capabilities:".bold(),
            flag(caps.tool_execution),
            flag(caps.tool_selection),
            flag(caps.cad_context),
            flag(caps.ai_provider)
        ));
        output.push_str(&format!(
            "  {} approval {}, rollback {}, max {} step(s)/plan\n",
            "Settings:".bold(),
            flag(status.settings.require_approval),
            flag(status.settings.rollback_on_failure),
            status.settings.max_plan_steps
        ));

        output
    }

    /// Format execution history, most recent last
    pub fn format_history(records: &[ExecutionRecord]) -> String {
        if records.is_empty() {
            return format!("{}\n", "No executions yet.".dimmed());
        }

        let mut output = Self::section_header("History");
        for record in records {
            let mark = if record.success {
                "v".green()
            } else {
                "x".red()
            };
            output.push_str(&format!(
                "  {} {} {:.2}s  {}\n",
                mark, record.plan_id, record.duration_secs, record.intent
            ));
        }
        output
    }

    /// Format a workspace snapshot
    pub fn format_context(context: &WorkspaceContext) -> String {
        let mut output = Self::section_header("Workspace");

        match &context.document.info {
            Some(info) => {
                let modified = if info.modified { " (modified)" } else { "" };
                output.push_str(&format!(
                    "  {} {}{}, {} object(s)\n",
                    "Document:".bold(),
                    info.name,
                    modified,
                    info.object_count
                ));
            }
            None => {
                output.push_str(&format!("  {}\n", "No active document.".dimmed()));
            }
        }

        let names: Vec<&str> = context.object_names().collect();
        if !names.is_empty() {
            output.push_str(&format!("  {} {}\n", "Objects:".bold(), names.join(", ")));
        }
        if context.has_selection() {
            let selected: Vec<&str> = context
                .selection
                .objects
                .iter()
                .map(|object| object.name.as_str())
                .collect();
            output.push_str(&format!("  {} {}\n", "Selected:".bold(), selected.join(", ")));
        }
        if !context.summary.is_empty() {
            output.push_str(&format!("\n{}\n", Self::indent(&context.summary, "  ")));
        }

        output
    }

    fn status_label(status: ResponseStatus) -> String {
        match status {
            ResponseStatus::Instructions => status.as_str().normal().to_string(),
            ResponseStatus::AwaitingApproval | ResponseStatus::Queued => {
                status.as_str().yellow().to_string()
            }
            ResponseStatus::Completed => status.as_str().green().to_string(),
            ResponseStatus::Failed | ResponseStatus::Error => status.as_str().red().to_string(),
        }
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, response: &AgentResponse) -> String {
        Self::format(response)
    }

    fn format_json(&self, response: &AgentResponse) -> String {
        Self::format_json(response)
    }

    fn format_status(&self, status: &AgentStatus) -> String {
        Self::format_status(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadmate_application::AgentManager;
    use std::collections::HashMap;

    fn plain() {
        colored::control::set_override(false);
    }

    #[tokio::test]
    async fn test_format_includes_message_and_instructions() {
        plain();
        let mut manager = AgentManager::builder().build();
        let response = manager.process_message("hello", HashMap::new()).await;

        let output = ConsoleFormatter::format(&response);
        assert!(output.contains("Mode: chat"));
        assert!(output.contains(&response.message));
    }

    #[tokio::test]
    async fn test_format_json_is_valid() {
        plain();
        let mut manager = AgentManager::builder().build();
        let response = manager.process_message("hello", HashMap::new()).await;

        let json = ConsoleFormatter::format_json(&response);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["mode"], "chat");
        assert_eq!(value["status"], "instructions");
    }

    #[test]
    fn test_format_status_reports_capabilities() {
        plain();
        let manager = AgentManager::builder().build();
        let output = ConsoleFormatter::format_status(&manager.get_status());
        assert!(output.contains("Mode: chat"));
        assert!(output.contains("execution off"));
    }

    #[test]
    fn test_indent_prefixes_every_line() {
        assert_eq!(ConsoleFormatter::indent("a\nb", "  "), "  a\n  b");
    }

    #[test]
    fn test_empty_history() {
        plain();
        let output = ConsoleFormatter::format_history(&[]);
        assert!(output.contains("No executions yet"));
    }
}
