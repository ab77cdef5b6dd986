//! Plan entities
//!
//! A [`Plan`] is built for one user instruction in Agent mode: an ordered
//! list of tool invocations with inferred parameters, a heuristic risk
//! level, and an estimated duration. Owned by the agent manager; the
//! execution pipeline borrows it for one run and writes step results back.

use crate::capability::handler::ToolParams;
use serde::{Deserialize, Serialize};

/// Default duration estimate per step, in seconds
pub const DEFAULT_STEP_DURATION_SECS: f64 = 2.0;

/// Step count above which a plan is considered medium risk
const MEDIUM_RISK_STEP_COUNT: usize = 3;

/// Verbs that mark an instruction as destructive
const DESTRUCTIVE_VERBS: &[&str] = &[
    "delete", "remove", "destroy", "erase", "clear", "wipe", "discard",
];

/// Heuristic risk level of a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Assess plan risk from the instruction text and step count.
///
/// High on destructive verbs, medium past [`MEDIUM_RISK_STEP_COUNT`]
/// steps, low otherwise.
pub fn assess_risk(intent_text: &str, step_count: usize) -> RiskLevel {
    let lowered = intent_text.to_lowercase();
    if DESTRUCTIVE_VERBS.iter().any(|verb| lowered.contains(verb)) {
        RiskLevel::High
    } else if step_count > MEDIUM_RISK_STEP_COUNT {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Status of one plan step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
    RolledBack,
}

impl StepStatus {
    pub fn as_str(&self) -> &str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::Running => "running",
            StepStatus::Completed => "completed",
            StepStatus::Failed => "failed",
            StepStatus::Skipped => "skipped",
            StepStatus::RolledBack => "rolled_back",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StepStatus::Completed | StepStatus::Failed | StepStatus::Skipped | StepStatus::RolledBack
        )
    }
}

/// Completion status of the whole plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    /// Built, awaiting approval or execution
    #[default]
    Draft,
    Approved,
    Rejected,
    Executing,
    Completed,
    Failed,
}

/// Outcome written back into a step after execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
}

impl StepResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            output: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            output: None,
        }
    }

    pub fn with_output(mut self, output: serde_json::Value) -> Self {
        self.output = Some(output);
        self
    }
}

/// One tool invocation within a plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStep {
    /// Execution order (1-based, strictly ascending within a plan)
    pub order: usize,
    pub tool_id: String,
    pub parameters: ToolParams,
    pub description: String,
    /// Orders of prior steps that must have completed first
    pub dependencies: Vec<usize>,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<StepResult>,
}

impl PlanStep {
    pub fn new(order: usize, tool_id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            order,
            tool_id: tool_id.into(),
            parameters: ToolParams::new(),
            description: description.into(),
            dependencies: Vec::new(),
            status: StepStatus::Pending,
            result: None,
        }
    }

    pub fn with_parameters(mut self, parameters: ToolParams) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_dependency(mut self, order: usize) -> Self {
        self.dependencies.push(order);
        self
    }

    pub fn mark_running(&mut self) {
        self.status = StepStatus::Running;
    }

    pub fn mark_completed(&mut self, result: StepResult) {
        self.status = StepStatus::Completed;
        self.result = Some(result);
    }

    pub fn mark_failed(&mut self, result: StepResult) {
        self.status = StepStatus::Failed;
        self.result = Some(result);
    }

    pub fn mark_rolled_back(&mut self) {
        self.status = StepStatus::RolledBack;
    }
}

/// An ordered set of tool invocations built for one instruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    /// The instruction this plan was built for
    pub intent: String,
    pub steps: Vec<PlanStep>,
    /// Seconds, summed from per-step estimates
    pub estimated_duration: f64,
    pub risk_level: RiskLevel,
    pub rollback_possible: bool,
    pub status: PlanStatus,
}

impl Plan {
    /// Build a plan from steps, deriving risk and duration.
    pub fn new(id: impl Into<String>, intent: impl Into<String>, steps: Vec<PlanStep>) -> Self {
        let intent = intent.into();
        let risk_level = assess_risk(&intent, steps.len());
        Self {
            id: id.into(),
            estimated_duration: steps.len() as f64 * DEFAULT_STEP_DURATION_SECS,
            risk_level,
            rollback_possible: true,
            status: PlanStatus::Draft,
            intent,
            steps,
        }
    }

    pub fn step(&self, order: usize) -> Option<&PlanStep> {
        self.steps.iter().find(|step| step.order == order)
    }

    pub fn step_mut(&mut self, order: usize) -> Option<&mut PlanStep> {
        self.steps.iter_mut().find(|step| step.order == order)
    }

    /// Whether every dependency of the given step has completed
    pub fn dependencies_met(&self, step: &PlanStep) -> bool {
        step.dependencies.iter().all(|&order| {
            self.step(order)
                .map(|dependency| dependency.status == StepStatus::Completed)
                .unwrap_or(false)
        })
    }

    pub fn approve(&mut self) {
        self.status = PlanStatus::Approved;
    }

    pub fn reject(&mut self) {
        self.status = PlanStatus::Rejected;
    }

    pub fn is_complete(&self) -> bool {
        self.status == PlanStatus::Completed
    }

    /// (terminal steps, total steps)
    pub fn progress(&self) -> (usize, usize) {
        let done = self.steps.iter().filter(|step| step.status.is_terminal()).count();
        (done, self.steps.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_assessment() {
        assert_eq!(assess_risk("create a box", 1), RiskLevel::Low);
        assert_eq!(assess_risk("create four parts", 4), RiskLevel::Medium);
        assert_eq!(assess_risk("delete everything", 1), RiskLevel::High);
        // Destructive verbs dominate step count
        assert_eq!(assess_risk("remove the fillets", 5), RiskLevel::High);
    }

    #[test]
    fn test_plan_duration_estimate() {
        let steps = vec![
            PlanStep::new(1, "primitives.create_box", "Create a box"),
            PlanStep::new(2, "export.stl", "Export to STL"),
        ];
        let plan = Plan::new("plan-1", "create and export", steps);
        assert!((plan.estimated_duration - 4.0).abs() < 1e-9);
        assert_eq!(plan.risk_level, RiskLevel::Low);
        assert_eq!(plan.status, PlanStatus::Draft);
    }

    #[test]
    fn test_dependencies_met() {
        let steps = vec![
            PlanStep::new(1, "primitives.create_box", "Create a box"),
            PlanStep::new(2, "operations.move_object", "Move it").with_dependency(1),
        ];
        let mut plan = Plan::new("plan-1", "create then move", steps);

        let second = plan.step(2).unwrap().clone();
        assert!(!plan.dependencies_met(&second));

        plan.step_mut(1)
            .unwrap()
            .mark_completed(StepResult::success("ok"));
        assert!(plan.dependencies_met(&second));
    }

    #[test]
    fn test_unknown_dependency_is_unmet() {
        let steps = vec![PlanStep::new(1, "a.b", "step").with_dependency(99)];
        let plan = Plan::new("plan-1", "x", steps);
        let first = plan.step(1).unwrap().clone();
        assert!(!plan.dependencies_met(&first));
    }

    #[test]
    fn test_step_lifecycle() {
        let mut step = PlanStep::new(1, "primitives.create_box", "Create a box");
        assert_eq!(step.status, StepStatus::Pending);
        step.mark_running();
        assert_eq!(step.status, StepStatus::Running);
        step.mark_failed(StepResult::failure("boom"));
        assert!(step.status.is_terminal());
        step.mark_rolled_back();
        assert_eq!(step.status, StepStatus::RolledBack);
    }
}
