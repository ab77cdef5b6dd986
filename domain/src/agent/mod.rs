//! Agent domain: mode/state enums, intent analysis, and plan entities.

pub mod intent;
pub mod mode;
pub mod plan;

pub use intent::{Intent, IntentKind, analyze_intent};
pub use mode::{AgentMode, ExecutionState};
pub use plan::{
    DEFAULT_STEP_DURATION_SECS, Plan, PlanStatus, PlanStep, RiskLevel, StepResult, StepStatus,
    assess_risk,
};
