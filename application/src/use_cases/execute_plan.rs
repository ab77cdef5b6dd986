//! Plan execution pipeline
//!
//! Runs an approved plan step by step against the tool executor. Before
//! each step the pipeline checks for a stop request, waits out any pause,
//! validates dependencies and parameters, then invokes the tool under a
//! wall-clock timeout. The first failure halts the run; completed mutating
//! steps are rolled back through the CAD undo stack when configured.
//!
//! Pause is a watch channel the runner awaits on, stop is a cancellation
//! token swapped in fresh at the start of every run. Both are reachable
//! from other tasks through a cloned [`PipelineControl`].

use crate::config::AgentSettings;
use crate::ports::cad_gateway::CadGateway;
use crate::ports::tool_executor::ToolExecutorPort;
use cadmate_domain::agent::plan::{Plan, PlanStatus, PlanStep, StepResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Most execution log entries retained
const EXECUTION_LOG_LIMIT: usize = 256;

/// Timestamped execution log entry
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// Outcome of one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    pub plan_id: String,
    pub success: bool,
    /// Orders of steps that completed
    pub executed_steps: Vec<usize>,
    /// The step that halted the run, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<PlanStep>,
    /// Serialized tool outcomes, in execution order
    pub outputs: Vec<serde_json::Value>,
    pub errors: Vec<String>,
    pub rolled_back: bool,
    pub duration_secs: f64,
}

impl ExecutionReport {
    fn new(plan_id: impl Into<String>) -> Self {
        Self {
            plan_id: plan_id.into(),
            success: false,
            executed_steps: Vec::new(),
            failed_step: None,
            outputs: Vec::new(),
            errors: Vec::new(),
            rolled_back: false,
            duration_secs: 0.0,
        }
    }
}

/// Step-level progress callbacks (console reporter, GUI, ...)
pub trait PipelineProgress: Send + Sync {
    fn on_step_started(&self, _step: &PlanStep, _total: usize) {}
    fn on_step_finished(&self, _step: &PlanStep, _success: bool) {}
}

/// No-op progress sink
pub struct NoPipelineProgress;

impl PipelineProgress for NoPipelineProgress {}

/// Cloneable handle for pausing, resuming, and stopping a running pipeline.
#[derive(Clone)]
pub struct PipelineControl {
    cancel: Arc<Mutex<CancellationToken>>,
    pause: Arc<watch::Sender<bool>>,
}

impl PipelineControl {
    /// Pause before the next step
    pub fn pause(&self) {
        let _ = self.pause.send(true);
    }

    /// Resume a paused run
    pub fn resume(&self) {
        let _ = self.pause.send(false);
    }

    /// Stop the current run at the next step boundary (or mid-step)
    pub fn stop(&self) {
        match self.cancel.lock() {
            Ok(token) => token.cancel(),
            Err(poisoned) => poisoned.into_inner().cancel(),
        }
    }

    pub fn is_paused(&self) -> bool {
        *self.pause.subscribe().borrow()
    }
}

/// How a step invocation ended without a tool outcome
enum StepAbort {
    TimedOut,
    Stopped,
}

/// Executes plans against the tool executor with checkpoint, timeout,
/// pause/stop, and rollback handling.
pub struct ExecutionPipeline {
    tools: Arc<dyn ToolExecutorPort>,
    cad: Option<Arc<dyn CadGateway>>,
    settings: AgentSettings,
    control: PipelineControl,
    pause_rx: watch::Receiver<bool>,
    /// Orders of completed mutating steps, most recent last
    undo_stack: Vec<usize>,
    log: Vec<LogEntry>,
}

impl ExecutionPipeline {
    pub fn new(
        tools: Arc<dyn ToolExecutorPort>,
        cad: Option<Arc<dyn CadGateway>>,
        settings: AgentSettings,
    ) -> Self {
        let (pause_tx, pause_rx) = watch::channel(false);
        Self {
            tools,
            cad,
            settings,
            control: PipelineControl {
                cancel: Arc::new(Mutex::new(CancellationToken::new())),
                pause: Arc::new(pause_tx),
            },
            pause_rx,
            undo_stack: Vec::new(),
            log: Vec::new(),
        }
    }

    /// Handle for pausing/resuming/stopping runs from other tasks
    pub fn control(&self) -> PipelineControl {
        self.control.clone()
    }

    /// Timestamped log of recent runs
    pub fn execution_log(&self) -> &[LogEntry] {
        &self.log
    }

    /// Completed mutating steps not yet undone
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Run the plan to completion, first failure, or stop.
    pub async fn execute(
        &mut self,
        plan: &mut Plan,
        progress: &dyn PipelineProgress,
    ) -> ExecutionReport {
        let started = Instant::now();
        let token = self.reset_controls();
        self.undo_stack.clear();

        let mut report = ExecutionReport::new(plan.id.clone());
        plan.status = PlanStatus::Executing;
        info!(plan_id = %plan.id, steps = plan.steps.len(), "execution started");
        self.log(format!(
            "execution started: plan {} ({} step(s))",
            plan.id,
            plan.steps.len()
        ));

        self.checkpoint().await;

        let mut orders: Vec<usize> = plan.steps.iter().map(|step| step.order).collect();
        orders.sort_unstable();

        let total = plan.steps.len();
        let mut stopped = false;
        let mut failed = false;

        for order in orders {
            if token.is_cancelled() || self.wait_if_paused(&token).await {
                stopped = true;
                break;
            }

            let Some(step) = plan.step(order).cloned() else {
                continue;
            };

            if let Err(message) = self.preflight(plan, &step) {
                self.fail_step(plan, order, &message, &mut report).await;
                failed = true;
                break;
            }

            if let Some(running) = plan.step_mut(order) {
                running.mark_running();
            }
            progress.on_step_started(&step, total);

            match self.run_step(&step, &token).await {
                Ok(outcome) if outcome.success => {
                    let output = serde_json::to_value(&outcome)
                        .unwrap_or(serde_json::Value::Null);
                    if let Some(done) = plan.step_mut(order) {
                        done.mark_completed(
                            StepResult::success(outcome.message.clone())
                                .with_output(output.clone()),
                        );
                        progress.on_step_finished(done, true);
                    }
                    if self.step_mutates(&step) {
                        self.undo_stack.push(order);
                    }
                    report.executed_steps.push(order);
                    report.outputs.push(output);
                    self.log(format!("step {} completed: {}", order, step.tool_id));
                }
                Ok(outcome) => {
                    self.fail_step(plan, order, &outcome.message, &mut report).await;
                    if let Some(step) = &report.failed_step {
                        progress.on_step_finished(step, false);
                    }
                    failed = true;
                    break;
                }
                Err(StepAbort::TimedOut) => {
                    let message = format!(
                        "step {} timed out after {}s",
                        order, self.settings.max_execution_time_secs
                    );
                    self.fail_step(plan, order, &message, &mut report).await;
                    failed = true;
                    break;
                }
                Err(StepAbort::Stopped) => {
                    if let Some(step) = plan.step_mut(order) {
                        step.mark_failed(StepResult::failure("execution stopped"));
                    }
                    stopped = true;
                    break;
                }
            }
        }

        if stopped {
            plan.status = PlanStatus::Failed;
            report.errors.push("execution stopped".to_string());
            self.log("execution stopped");
        } else if failed {
            plan.status = PlanStatus::Failed;
        } else {
            plan.status = PlanStatus::Completed;
            report.success = true;
        }

        report.duration_secs = started.elapsed().as_secs_f64();
        info!(
            plan_id = %plan.id,
            success = report.success,
            duration_secs = report.duration_secs,
            "execution finished"
        );
        self.log(format!(
            "execution finished: plan {} ({})",
            plan.id,
            if report.success { "success" } else { "failure" }
        ));
        report
    }

    /// Swap in a fresh cancellation token and clear any pause.
    fn reset_controls(&mut self) -> CancellationToken {
        let token = CancellationToken::new();
        match self.control.cancel.lock() {
            Ok(mut current) => *current = token.clone(),
            Err(poisoned) => *poisoned.into_inner() = token.clone(),
        }
        let _ = self.control.pause.send(false);
        token
    }

    /// Await while paused. Returns true if stopped while waiting.
    async fn wait_if_paused(&mut self, token: &CancellationToken) -> bool {
        loop {
            if !*self.pause_rx.borrow_and_update() {
                return false;
            }
            debug!("pipeline paused, waiting");
            tokio::select! {
                _ = token.cancelled() => return true,
                changed = self.pause_rx.changed() => {
                    if changed.is_err() {
                        return false;
                    }
                }
            }
        }
    }

    /// Checks that must pass before a step may run
    fn preflight(&self, plan: &Plan, step: &PlanStep) -> Result<(), String> {
        if !plan.dependencies_met(step) {
            return Err(format!(
                "step {} has unmet dependencies: {:?}",
                step.order, step.dependencies
            ));
        }
        if !self.tools.has_tool(&step.tool_id) {
            return Err(format!("unknown tool: {}", step.tool_id));
        }
        self.tools
            .validate_params(&step.tool_id, &step.parameters)
            .map_err(|message| format!("invalid parameters for {}: {}", step.tool_id, message))
    }

    async fn run_step(
        &self,
        step: &PlanStep,
        token: &CancellationToken,
    ) -> Result<cadmate_domain::capability::entities::ToolOutcome, StepAbort> {
        tokio::select! {
            _ = token.cancelled() => Err(StepAbort::Stopped),
            result = tokio::time::timeout(
                self.settings.max_execution_time(),
                self.tools.invoke(&step.tool_id, &step.parameters),
            ) => result.map_err(|_| StepAbort::TimedOut),
        }
    }

    fn step_mutates(&self, step: &PlanStep) -> bool {
        self.tools
            .tool_info(&step.tool_id)
            .map(|info| info.category.mutates_document())
            .unwrap_or(false)
    }

    /// Record a step failure and roll back if configured.
    async fn fail_step(
        &mut self,
        plan: &mut Plan,
        order: usize,
        message: &str,
        report: &mut ExecutionReport,
    ) {
        warn!(order, message, "step failed");
        self.log(format!("step {} failed: {}", order, message));
        report.errors.push(message.to_string());
        if let Some(step) = plan.step_mut(order) {
            step.mark_failed(StepResult::failure(message));
            report.failed_step = Some(step.clone());
        }
        if self.settings.rollback_on_failure {
            report.rolled_back = self.rollback(plan).await;
        } else {
            self.undo_stack.clear();
        }
    }

    /// Undo completed mutating steps, most recent first.
    async fn rollback(&mut self, plan: &mut Plan) -> bool {
        let Some(cad) = self.cad.clone() else {
            self.log("rollback skipped: no CAD gateway");
            self.undo_stack.clear();
            return false;
        };
        let mut rolled_back = false;
        while let Some(order) = self.undo_stack.pop() {
            match cad.undo().await {
                Ok(()) => {
                    if let Some(step) = plan.step_mut(order) {
                        step.mark_rolled_back();
                    }
                    rolled_back = true;
                    self.log(format!("rolled back step {}", order));
                }
                Err(error) => {
                    warn!(%error, order, "undo failed during rollback");
                    self.log(format!("rollback halted at step {}: {}", order, error));
                    break;
                }
            }
        }
        self.undo_stack.clear();
        rolled_back
    }

    /// Pre-run checkpoint and autosave, both best effort.
    async fn checkpoint(&mut self) {
        let Some(cad) = self.cad.clone() else {
            return;
        };
        if self.settings.checkpoint_before_run {
            match cad.list_objects().await {
                Ok(objects) => {
                    self.log(format!("checkpoint: {} object(s)", objects.len()));
                }
                Err(error) => {
                    self.log(format!("checkpoint failed: {}", error));
                }
            }
        }
        if self.settings.autosave_before_run {
            if let Err(error) = cad.save().await {
                warn!(%error, "autosave failed");
                self.log(format!("autosave failed: {}", error));
            }
        }
    }

    fn log(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!("{message}");
        self.log.push(LogEntry {
            timestamp: Utc::now(),
            message,
        });
        if self.log.len() > EXECUTION_LOG_LIMIT {
            let excess = self.log.len() - EXECUTION_LOG_LIMIT;
            self.log.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeCad, FakeTools};
    use cadmate_domain::agent::plan::StepStatus;
    use cadmate_domain::capability::entities::ToolCategory;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn two_step_plan() -> Plan {
        Plan::new(
            "plan-1",
            "create a box then move it",
            vec![
                PlanStep::new(1, "primitives.create_box", "Create a box"),
                PlanStep::new(2, "operations.move_object", "Move it").with_dependency(1),
            ],
        )
    }

    #[tokio::test]
    async fn test_successful_plan_completes_all_steps() {
        let tools = Arc::new(
            FakeTools::default()
                .with_tool("primitives.create_box", ToolCategory::Creation)
                .with_tool("operations.move_object", ToolCategory::Modification),
        );
        let mut pipeline = ExecutionPipeline::new(tools, None, AgentSettings::default());
        let mut plan = two_step_plan();

        let report = pipeline.execute(&mut plan, &NoPipelineProgress).await;

        assert!(report.success);
        assert_eq!(report.executed_steps, vec![1, 2]);
        assert_eq!(plan.status, PlanStatus::Completed);
        assert!(report.errors.is_empty());
        assert_eq!(report.outputs.len(), 2);
    }

    #[tokio::test]
    async fn test_failure_halts_remaining_steps() {
        // Step 1 references an unregistered tool
        let tools = Arc::new(
            FakeTools::default().with_tool("operations.move_object", ToolCategory::Modification),
        );
        let tools_probe = Arc::clone(&tools);
        let mut pipeline = ExecutionPipeline::new(tools, None, AgentSettings::default());
        let mut plan = Plan::new(
            "plan-1",
            "three steps",
            vec![
                PlanStep::new(1, "primitives.create_torus", "Unknown tool"),
                PlanStep::new(2, "operations.move_object", "Move"),
                PlanStep::new(3, "operations.move_object", "Move again"),
            ],
        );

        let report = pipeline.execute(&mut plan, &NoPipelineProgress).await;

        assert!(!report.success);
        assert_eq!(report.failed_step.as_ref().map(|step| step.order), Some(1));
        assert!(report.executed_steps.is_empty());
        assert_eq!(plan.step(2).map(|step| step.status), Some(StepStatus::Pending));
        assert_eq!(plan.step(3).map(|step| step.status), Some(StepStatus::Pending));
        assert_eq!(plan.status, PlanStatus::Failed);
        // Nothing was invoked
        assert!(tools_probe.invoked_ids().is_empty());
    }

    #[tokio::test]
    async fn test_rollback_undoes_completed_mutating_steps() {
        let tools = Arc::new(
            FakeTools::default()
                .with_tool("primitives.create_box", ToolCategory::Creation)
                .with_tool("primitives.create_sphere", ToolCategory::Creation)
                .with_tool("operations.boolean_union", ToolCategory::Boolean)
                .failing("operations.boolean_union"),
        );
        let cad = Arc::new(FakeCad::default());
        let cad_probe = Arc::clone(&cad);
        let mut pipeline = ExecutionPipeline::new(tools, Some(cad), AgentSettings::default());
        let mut plan = Plan::new(
            "plan-1",
            "build and combine",
            vec![
                PlanStep::new(1, "primitives.create_box", "Create a box"),
                PlanStep::new(2, "primitives.create_sphere", "Create a sphere"),
                PlanStep::new(3, "operations.boolean_union", "Combine")
                    .with_dependency(1)
                    .with_dependency(2),
            ],
        );

        let report = pipeline.execute(&mut plan, &NoPipelineProgress).await;

        assert!(!report.success);
        assert!(report.rolled_back);
        assert_eq!(cad_probe.undo_calls.load(Ordering::SeqCst), 2);
        assert_eq!(pipeline.undo_depth(), 0);
        assert_eq!(
            plan.step(1).map(|step| step.status),
            Some(StepStatus::RolledBack)
        );
        assert_eq!(
            plan.step(2).map(|step| step.status),
            Some(StepStatus::RolledBack)
        );
        assert_eq!(plan.step(3).map(|step| step.status), Some(StepStatus::Failed));
    }

    #[tokio::test]
    async fn test_rollback_can_be_disabled() {
        let tools = Arc::new(
            FakeTools::default()
                .with_tool("primitives.create_box", ToolCategory::Creation)
                .with_tool("operations.move_object", ToolCategory::Modification)
                .failing("operations.move_object"),
        );
        let cad = Arc::new(FakeCad::default());
        let cad_probe = Arc::clone(&cad);
        let settings = AgentSettings::default().with_rollback_on_failure(false);
        let mut pipeline = ExecutionPipeline::new(tools, Some(cad), settings);
        let mut plan = two_step_plan();

        let report = pipeline.execute(&mut plan, &NoPipelineProgress).await;

        assert!(!report.success);
        assert!(!report.rolled_back);
        assert_eq!(cad_probe.undo_calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            plan.step(1).map(|step| step.status),
            Some(StepStatus::Completed)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_step_timeout_fails_the_plan() {
        let tools = Arc::new(
            FakeTools::default()
                .with_tool("primitives.create_box", ToolCategory::Creation)
                .with_delay(Duration::from_secs(400)),
        );
        let mut pipeline = ExecutionPipeline::new(tools, None, AgentSettings::default());
        let mut plan = Plan::new(
            "plan-1",
            "slow step",
            vec![PlanStep::new(1, "primitives.create_box", "Create a box")],
        );

        let report = pipeline.execute(&mut plan, &NoPipelineProgress).await;

        assert!(!report.success);
        assert!(report.errors.iter().any(|error| error.contains("timed out")));
        assert_eq!(plan.step(1).map(|step| step.status), Some(StepStatus::Failed));
    }

    #[tokio::test]
    async fn test_pause_holds_execution_until_resume() {
        let tools = Arc::new(
            FakeTools::default().with_tool("primitives.create_box", ToolCategory::Creation),
        );
        let tools_probe = Arc::clone(&tools);
        let mut pipeline = ExecutionPipeline::new(tools, None, AgentSettings::default());
        let control = pipeline.control();
        let mut plan = Plan::new(
            "plan-1",
            "one step",
            vec![PlanStep::new(1, "primitives.create_box", "Create a box")],
        );

        let handle = tokio::spawn(async move {
            // Pause is set by the test before the first step runs
            let report = pipeline.execute(&mut plan, &NoPipelineProgress).await;
            (report, plan)
        });

        // reset_controls clears pause at run start, so set it after the
        // runner yields at its first await point
        tokio::task::yield_now().await;
        control.pause();

        // The fake records invocations; with a single-threaded runtime the
        // paused runner cannot have reached the tool yet once we re-yield
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
        let before_resume = tools_probe.invoked_ids().len();
        control.resume();

        let (report, plan) = handle.await.unwrap();
        assert!(report.success);
        assert_eq!(plan.status, PlanStatus::Completed);
        // Either the pause landed before the first step (0) or the runner
        // had already passed the boundary (1); both end in success
        assert!(before_resume <= 1);
    }

    #[tokio::test]
    async fn test_stop_halts_at_step_boundary() {
        let tools = Arc::new(
            FakeTools::default().with_tool("primitives.create_box", ToolCategory::Creation),
        );
        let mut pipeline = ExecutionPipeline::new(tools, None, AgentSettings::default());
        let control = pipeline.control();
        let mut plan = Plan::new(
            "plan-1",
            "one step",
            vec![PlanStep::new(1, "primitives.create_box", "Create a box")],
        );

        let handle = tokio::spawn(async move {
            pipeline.execute(&mut plan, &NoPipelineProgress).await
        });
        tokio::task::yield_now().await;
        control.stop();

        let report = handle.await.unwrap();
        // Stop either landed before the step or after it completed
        if !report.success {
            assert!(report.errors.iter().any(|error| error.contains("stopped")));
        }
    }
}
