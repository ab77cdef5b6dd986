//! Agent mode and execution state

use serde::{Deserialize, Serialize};

/// Operating mode of the agent.
///
/// Orthogonal to [`ExecutionState`]: switching to Chat pauses in-flight
/// execution and clears the queue, but the two axes are tracked separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AgentMode {
    /// Advise only: produce instructions, never execute
    #[default]
    Chat,
    /// Autonomous: build plans and execute them
    Agent,
}

impl AgentMode {
    pub fn as_str(&self) -> &str {
        match self {
            AgentMode::Chat => "chat",
            AgentMode::Agent => "agent",
        }
    }
}

impl std::fmt::Display for AgentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle of the current plan.
///
/// `Idle -> Planning -> Executing -> (Paused | Error | Completed)`.
/// Paused can resume to Executing; Error and Completed are terminal for a
/// plan instance; a new plan restarts at Idle -> Planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionState {
    #[default]
    Idle,
    Planning,
    Executing,
    Paused,
    Error,
    Completed,
}

impl ExecutionState {
    pub fn as_str(&self) -> &str {
        match self {
            ExecutionState::Idle => "idle",
            ExecutionState::Planning => "planning",
            ExecutionState::Executing => "executing",
            ExecutionState::Paused => "paused",
            ExecutionState::Error => "error",
            ExecutionState::Completed => "completed",
        }
    }

    /// Terminal for the current plan instance
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionState::Error | ExecutionState::Completed)
    }
}

impl std::fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(AgentMode::default(), AgentMode::Chat);
        assert_eq!(ExecutionState::default(), ExecutionState::Idle);
    }

    #[test]
    fn test_terminal_states() {
        assert!(ExecutionState::Error.is_terminal());
        assert!(ExecutionState::Completed.is_terminal());
        assert!(!ExecutionState::Paused.is_terminal());
        assert!(!ExecutionState::Executing.is_terminal());
    }
}
