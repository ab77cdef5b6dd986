//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Capability already registered: {0}")]
    DuplicateCapability(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid capability definition: {0}")]
    InvalidCapability(String),

    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_tool_display() {
        let error = DomainError::UnknownTool("primitives.create_box".to_string());
        assert_eq!(error.to_string(), "Unknown tool: primitives.create_box");
    }

    #[test]
    fn test_is_cancelled_check() {
        assert!(DomainError::Cancelled.is_cancelled());
        assert!(!DomainError::UnknownTool("x".to_string()).is_cancelled());
        assert!(!DomainError::DuplicateCapability("x".to_string()).is_cancelled());
    }
}
