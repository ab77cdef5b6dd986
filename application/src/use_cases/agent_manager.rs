//! Agent manager
//!
//! Single entry point for user messages. In Chat mode an instruction
//! becomes numbered guidance; in Agent mode it becomes a plan that is
//! queued for approval or executed immediately, depending on settings.
//!
//! Every collaborator is optional. A manager built with no CAD gateway, no
//! tool executor, and no AI provider still answers every message; missing
//! collaborators degrade the response instead of failing construction.

use crate::config::AgentSettings;
use crate::ports::ai_provider::AiProvider;
use crate::ports::cad_gateway::CadGateway;
use crate::ports::events::{AgentEvent, EventBus};
use crate::ports::tool_executor::ToolExecutorPort;
use crate::use_cases::enrich_context::ContextEnricher;
use crate::use_cases::execute_plan::{
    ExecutionPipeline, ExecutionReport, NoPipelineProgress, PipelineProgress,
};
use cadmate_domain::agent::intent::{Intent, analyze_intent};
use cadmate_domain::agent::mode::{AgentMode, ExecutionState};
use cadmate_domain::agent::plan::{Plan, PlanStep};
use cadmate_domain::capability::registry::CapabilityRegistry;
use cadmate_domain::matching::selector::{ToolMatch, ToolSelector};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Most matches turned into guidance in a chat response
const MAX_SUGGESTED_TOOLS: usize = 3;

/// Which collaborators the manager was built with
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CapabilityReport {
    pub tool_execution: bool,
    pub tool_selection: bool,
    pub cad_context: bool,
    pub ai_provider: bool,
}

/// Outcome class of one processed message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    /// Guidance produced, nothing executed
    Instructions,
    /// A plan was built and waits for approval
    AwaitingApproval,
    /// A further plan was queued behind the pending one
    Queued,
    Completed,
    Failed,
    Error,
}

impl ResponseStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ResponseStatus::Instructions => "instructions",
            ResponseStatus::AwaitingApproval => "awaiting_approval",
            ResponseStatus::Queued => "queued",
            ResponseStatus::Completed => "completed",
            ResponseStatus::Failed => "failed",
            ResponseStatus::Error => "error",
        }
    }
}

/// Structured reply to one user message
#[derive(Debug, Clone, Serialize)]
pub struct AgentResponse {
    pub mode: AgentMode,
    pub status: ResponseStatus,
    /// Human-readable reply
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    /// Tool ids ranked by confidence
    pub suggested_tools: Vec<String>,
    /// Numbered guidance (chat mode)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
    /// Whether agent mode could execute this instruction
    pub can_execute: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ExecutionReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentResponse {
    fn new(mode: AgentMode, status: ResponseStatus, message: impl Into<String>) -> Self {
        Self {
            mode,
            status,
            message: message.into(),
            intent: None,
            suggested_tools: Vec::new(),
            instructions: None,
            plan_id: None,
            can_execute: false,
            report: None,
            error: None,
        }
    }

    fn error(mode: AgentMode, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            error: Some(message.clone()),
            ..Self::new(mode, ResponseStatus::Error, message)
        }
    }
}

/// One completed (or failed) execution kept in history
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionRecord {
    pub plan_id: String,
    pub intent: String,
    pub success: bool,
    pub duration_secs: f64,
    pub completed_at: DateTime<Utc>,
}

/// Snapshot of manager state for status displays
#[derive(Debug, Clone, Serialize)]
pub struct AgentStatus {
    pub mode: AgentMode,
    pub state: ExecutionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_plan: Option<String>,
    pub queue_size: usize,
    pub history_size: usize,
    pub available_tools: Vec<String>,
    pub capabilities: CapabilityReport,
    pub settings: AgentSettings,
}

/// Builder for [`AgentManager`]. Every collaborator is optional.
#[derive(Default)]
pub struct AgentManagerBuilder {
    settings: AgentSettings,
    registry: CapabilityRegistry,
    selector: Option<ToolSelector>,
    tools: Option<Arc<dyn ToolExecutorPort>>,
    cad: Option<Arc<dyn CadGateway>>,
    provider: Option<Arc<dyn AiProvider>>,
    progress: Option<Arc<dyn PipelineProgress>>,
}

impl AgentManagerBuilder {
    pub fn with_settings(mut self, settings: AgentSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_registry(mut self, registry: CapabilityRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_selector(mut self, selector: ToolSelector) -> Self {
        self.selector = Some(selector);
        self
    }

    pub fn with_tools(mut self, tools: Arc<dyn ToolExecutorPort>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn with_cad(mut self, cad: Arc<dyn CadGateway>) -> Self {
        self.cad = Some(cad);
        self
    }

    pub fn with_provider(mut self, provider: Arc<dyn AiProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Sink that receives per-step progress while plans execute
    pub fn with_progress(mut self, progress: Arc<dyn PipelineProgress>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Construction always succeeds; missing collaborators degrade behavior.
    pub fn build(self) -> AgentManager {
        let pipeline = self.tools.clone().map(|tools| {
            ExecutionPipeline::new(tools, self.cad.clone(), self.settings.clone())
        });
        let enricher = ContextEnricher::new(self.cad.clone(), self.settings.limits.clone());
        AgentManager {
            mode: AgentMode::default(),
            state: ExecutionState::default(),
            settings: self.settings,
            registry: self.registry,
            selector: self.selector,
            tools: self.tools,
            provider: self.provider,
            progress: self
                .progress
                .unwrap_or_else(|| Arc::new(NoPipelineProgress)),
            pipeline,
            enricher,
            events: EventBus::default(),
            current_plan: None,
            queue: VecDeque::new(),
            history: Vec::new(),
            plan_counter: 0,
        }
    }
}

/// Orchestrates chat and agent behavior over the ports.
///
/// Exclusive access through `&mut self` is the concurrency model: one
/// manager, one caller at a time. Cross-task control of a running pipeline
/// goes through [`ExecutionPipeline::control`].
pub struct AgentManager {
    mode: AgentMode,
    state: ExecutionState,
    settings: AgentSettings,
    registry: CapabilityRegistry,
    selector: Option<ToolSelector>,
    tools: Option<Arc<dyn ToolExecutorPort>>,
    provider: Option<Arc<dyn AiProvider>>,
    progress: Arc<dyn PipelineProgress>,
    pipeline: Option<ExecutionPipeline>,
    enricher: ContextEnricher,
    events: EventBus,
    current_plan: Option<Plan>,
    queue: VecDeque<Plan>,
    history: Vec<ExecutionRecord>,
    plan_counter: u64,
}

impl AgentManager {
    pub fn builder() -> AgentManagerBuilder {
        AgentManagerBuilder::default()
    }

    pub fn mode(&self) -> AgentMode {
        self.mode
    }

    pub fn state(&self) -> ExecutionState {
        self.state
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AgentEvent> {
        self.events.subscribe()
    }

    pub fn history(&self) -> &[ExecutionRecord] {
        &self.history
    }

    /// Which collaborators are live
    pub fn capabilities_report(&self) -> CapabilityReport {
        CapabilityReport {
            tool_execution: self.pipeline.is_some(),
            tool_selection: self.selector.is_some(),
            cad_context: self.enricher.has_gateway(),
            ai_provider: self.provider.is_some(),
        }
    }

    pub fn get_status(&self) -> AgentStatus {
        AgentStatus {
            mode: self.mode,
            state: self.state,
            pending_plan: self.current_plan.as_ref().map(|plan| plan.id.clone()),
            queue_size: self.queue.len(),
            history_size: self.history.len(),
            available_tools: self
                .tools
                .as_ref()
                .map(|tools| tools.tool_ids())
                .unwrap_or_default(),
            capabilities: self.capabilities_report(),
            settings: self.settings.clone(),
        }
    }

    /// Switch operating mode.
    ///
    /// Switching to Chat pauses an in-flight execution and clears the plan
    /// queue; switching to Agent never starts anything by itself.
    pub fn set_mode(&mut self, mode: AgentMode) {
        if mode == self.mode {
            return;
        }
        info!(from = %self.mode, to = %mode, "mode change");
        self.events.emit(AgentEvent::ModeChanged {
            from: self.mode,
            to: mode,
        });
        if mode == AgentMode::Chat {
            self.queue.clear();
            if self.state == ExecutionState::Executing {
                if let Some(pipeline) = &self.pipeline {
                    pipeline.control().pause();
                }
                self.set_state(ExecutionState::Paused);
            }
        }
        self.mode = mode;
    }

    pub fn pause(&mut self) {
        if let Some(pipeline) = &self.pipeline {
            pipeline.control().pause();
        }
        if self.state == ExecutionState::Executing {
            self.set_state(ExecutionState::Paused);
        }
    }

    pub fn resume(&mut self) {
        if let Some(pipeline) = &self.pipeline {
            pipeline.control().resume();
        }
        if self.state == ExecutionState::Paused {
            self.set_state(ExecutionState::Executing);
        }
    }

    pub fn stop(&mut self) {
        if let Some(pipeline) = &self.pipeline {
            let control = pipeline.control();
            control.resume();
            control.stop();
        }
        self.set_state(ExecutionState::Idle);
    }

    /// Process one user message according to the current mode.
    pub async fn process_message(
        &mut self,
        text: &str,
        extra: HashMap<String, serde_json::Value>,
    ) -> AgentResponse {
        let context = self.enricher.enrich(extra).await;
        let intent = analyze_intent(text);
        let matches = match &self.selector {
            Some(selector) => selector.select_tool(text, &self.registry, &context),
            None => Vec::new(),
        };
        debug!(
            mode = %self.mode,
            intent = %intent.kind,
            candidates = matches.len(),
            "message processed"
        );

        match self.mode {
            AgentMode::Chat => self.chat_response(text, intent, matches).await,
            AgentMode::Agent => self.agent_response(text, intent, matches).await,
        }
    }

    /// Approve and execute the pending plan.
    pub async fn approve_plan(&mut self, plan_id: &str) -> AgentResponse {
        let matches_pending = self
            .current_plan
            .as_ref()
            .map(|plan| plan.id == plan_id)
            .unwrap_or(false);
        if !matches_pending {
            return AgentResponse::error(
                self.mode,
                format!("no pending plan with id '{}'", plan_id),
            );
        }
        // Checked above
        let Some(mut plan) = self.current_plan.take() else {
            return AgentResponse::error(self.mode, "no pending plan");
        };
        plan.approve();
        let response = self.run_plan(&mut plan).await;
        self.promote_queued_plan();
        response
    }

    /// Reject the pending plan, optionally feeding the reason back into
    /// match learning.
    pub fn reject_plan(&mut self, plan_id: &str, feedback: Option<&str>) -> AgentResponse {
        let matches_pending = self
            .current_plan
            .as_ref()
            .map(|plan| plan.id == plan_id)
            .unwrap_or(false);
        if !matches_pending {
            return AgentResponse::error(
                self.mode,
                format!("no pending plan with id '{}'", plan_id),
            );
        }
        let Some(mut plan) = self.current_plan.take() else {
            return AgentResponse::error(self.mode, "no pending plan");
        };
        plan.reject();
        if let (Some(selector), Some(step)) = (&mut self.selector, plan.steps.first()) {
            if let Err(error) =
                selector.learn_from_execution(&plan.intent, &step.tool_id, false, feedback)
            {
                debug!(%error, "rejection feedback not recorded");
            }
        }
        self.set_state(ExecutionState::Idle);
        self.promote_queued_plan();
        let mut response = AgentResponse::new(
            self.mode,
            ResponseStatus::Instructions,
            format!("Plan {} rejected.", plan.id),
        );
        response.plan_id = Some(plan.id);
        response
    }

    async fn chat_response(
        &mut self,
        text: &str,
        intent: Intent,
        matches: Vec<ToolMatch>,
    ) -> AgentResponse {
        if matches.is_empty() {
            return self.freeform_reply(text, intent).await;
        }

        let instructions = self.build_instructions(&matches);
        let mut response = AgentResponse::new(
            AgentMode::Chat,
            ResponseStatus::Instructions,
            "Here is how to do that:",
        );
        response.intent = Some(intent);
        response.suggested_tools = matches
            .iter()
            .take(MAX_SUGGESTED_TOOLS)
            .map(|candidate| candidate.tool_id.clone())
            .collect();
        response.instructions = Some(instructions);
        response.can_execute = self.pipeline.is_some();
        response
    }

    /// No tool matched: hand the text to the AI provider when there is one.
    async fn freeform_reply(&self, text: &str, intent: Intent) -> AgentResponse {
        if let Some(provider) = &self.provider {
            match provider.send_message(text).await {
                Ok(reply) => {
                    let mut response = AgentResponse::new(
                        AgentMode::Chat,
                        ResponseStatus::Instructions,
                        reply.content,
                    );
                    response.intent = Some(intent);
                    return response;
                }
                Err(error) => {
                    return AgentResponse::error(
                        AgentMode::Chat,
                        format!("AI provider error: {}", error),
                    );
                }
            }
        }
        let mut response = AgentResponse::new(
            AgentMode::Chat,
            ResponseStatus::Instructions,
            "I couldn't map that to a CAD operation. Try naming the shape or \
             operation, e.g. 'create a box 50mm long'.",
        );
        response.intent = Some(intent);
        response
    }

    async fn agent_response(
        &mut self,
        text: &str,
        intent: Intent,
        matches: Vec<ToolMatch>,
    ) -> AgentResponse {
        if self.pipeline.is_none() {
            return AgentResponse::error(
                AgentMode::Agent,
                "tool execution is unavailable; running in degraded mode",
            );
        }

        let steps = self.plan_steps(&matches);
        if steps.is_empty() {
            let mut response = AgentResponse::new(
                AgentMode::Agent,
                ResponseStatus::Failed,
                "Unable to determine a tool for this instruction.",
            );
            response.intent = Some(intent);
            response.error = Some("no tool matched with sufficient confidence".to_string());
            return response;
        }

        self.plan_counter += 1;
        let plan = Plan::new(format!("plan-{}", self.plan_counter), text, steps);
        self.set_state(ExecutionState::Planning);
        self.events.emit(AgentEvent::PlanCreated {
            plan_id: plan.id.clone(),
            steps: plan.steps.len(),
            risk_level: plan.risk_level,
        });

        if self.current_plan.is_some() {
            return self.enqueue_plan(plan, intent);
        }

        if self.settings.require_approval {
            let mut response = AgentResponse::new(
                AgentMode::Agent,
                ResponseStatus::AwaitingApproval,
                self.describe_plan(&plan),
            );
            response.intent = Some(intent);
            response.suggested_tools =
                plan.steps.iter().map(|step| step.tool_id.clone()).collect();
            response.plan_id = Some(plan.id.clone());
            response.can_execute = true;
            self.current_plan = Some(plan);
            return response;
        }

        let mut plan = plan;
        plan.approve();
        let mut response = self.run_plan(&mut plan).await;
        response.intent = Some(intent);
        response
    }

    async fn run_plan(&mut self, plan: &mut Plan) -> AgentResponse {
        self.set_state(ExecutionState::Executing);
        self.events.emit(AgentEvent::ExecutionStarted {
            plan_id: plan.id.clone(),
        });

        let progress = Arc::clone(&self.progress);
        let Some(pipeline) = self.pipeline.as_mut() else {
            return AgentResponse::error(AgentMode::Agent, "tool execution is unavailable");
        };
        let report = pipeline.execute(plan, progress.as_ref()).await;

        if let (Some(selector), Some(step)) = (&mut self.selector, plan.steps.first()) {
            if let Err(error) =
                selector.learn_from_execution(&plan.intent, &step.tool_id, report.success, None)
            {
                debug!(%error, "execution outcome not recorded for learning");
            }
        }

        self.history.push(ExecutionRecord {
            plan_id: plan.id.clone(),
            intent: plan.intent.clone(),
            success: report.success,
            duration_secs: report.duration_secs,
            completed_at: Utc::now(),
        });
        if self.history.len() > self.settings.max_history {
            let excess = self.history.len() - self.settings.max_history;
            self.history.drain(..excess);
        }

        let mut response = if report.success {
            self.set_state(ExecutionState::Completed);
            self.events.emit(AgentEvent::ExecutionCompleted {
                plan_id: plan.id.clone(),
                duration_secs: report.duration_secs,
            });
            AgentResponse::new(
                AgentMode::Agent,
                ResponseStatus::Completed,
                format!(
                    "Plan {} completed: {} step(s) executed.",
                    plan.id,
                    report.executed_steps.len()
                ),
            )
        } else {
            self.set_state(ExecutionState::Error);
            let error = report
                .errors
                .first()
                .cloned()
                .unwrap_or_else(|| "execution failed".to_string());
            self.events.emit(AgentEvent::ExecutionFailed {
                plan_id: plan.id.clone(),
                error: error.clone(),
            });
            let mut failed = AgentResponse::new(
                AgentMode::Agent,
                ResponseStatus::Failed,
                format!("Plan {} failed: {}", plan.id, error),
            );
            failed.error = Some(error);
            failed
        };
        response.plan_id = Some(plan.id.clone());
        response.suggested_tools = plan.steps.iter().map(|step| step.tool_id.clone()).collect();
        response.report = Some(report);
        response
    }

    /// Build plan steps from ranked matches: every candidate above the plan
    /// threshold, else just the best one if it clears the floor.
    fn plan_steps(&self, matches: &[ToolMatch]) -> Vec<PlanStep> {
        let mut selected: Vec<&ToolMatch> = matches
            .iter()
            .filter(|candidate| candidate.confidence >= self.settings.plan_confidence_threshold)
            .take(self.settings.max_plan_steps)
            .collect();
        if selected.is_empty() {
            if let Some(best) = matches.first() {
                if best.confidence >= self.settings.min_confidence {
                    selected.push(best);
                }
            }
        }
        selected
            .into_iter()
            .enumerate()
            .map(|(index, candidate)| {
                let description = self
                    .registry
                    .get(&candidate.tool_id)
                    .map(|capability| capability.description.clone())
                    .unwrap_or_else(|| candidate.tool_id.clone());
                PlanStep::new(index + 1, candidate.tool_id.clone(), description)
                    .with_parameters(candidate.parameters.clone())
            })
            .collect()
    }

    fn enqueue_plan(&mut self, plan: Plan, intent: Intent) -> AgentResponse {
        if self.queue.len() >= self.settings.max_queue_size {
            return AgentResponse::error(
                AgentMode::Agent,
                format!("plan queue is full ({} pending)", self.queue.len()),
            );
        }
        let plan_id = plan.id.clone();
        self.queue.push_back(plan);
        let mut response = AgentResponse::new(
            AgentMode::Agent,
            ResponseStatus::Queued,
            format!(
                "Plan {} queued behind the pending plan ({} in queue).",
                plan_id,
                self.queue.len()
            ),
        );
        response.intent = Some(intent);
        response.plan_id = Some(plan_id);
        response
    }

    /// After the pending plan resolves, the next queued plan (if any)
    /// becomes the new pending plan.
    fn promote_queued_plan(&mut self) {
        if self.current_plan.is_none() {
            self.current_plan = self.queue.pop_front();
        }
    }

    fn build_instructions(&self, matches: &[ToolMatch]) -> String {
        let mut lines = Vec::new();
        for (index, candidate) in matches.iter().take(MAX_SUGGESTED_TOOLS).enumerate() {
            let (name, description) = match self.registry.get(&candidate.tool_id) {
                Some(capability) => (
                    capability.display_name(),
                    capability.detailed_description.clone(),
                ),
                None => (candidate.tool_id.clone(), String::new()),
            };
            let mut line = format!("{}. Use the {} tool", index + 1, name);
            if !description.is_empty() {
                line.push_str(": ");
                line.push_str(&description);
            }
            if !candidate.parameters.is_empty() {
                let mut params: Vec<String> = candidate
                    .parameters
                    .iter()
                    .map(|(key, value)| format!("{} = {}", key, value))
                    .collect();
                params.sort();
                line.push_str(&format!(" (with {})", params.join(", ")));
            }
            lines.push(line);
        }
        lines.join("\n")
    }

    fn describe_plan(&self, plan: &Plan) -> String {
        let mut description = format!(
            "Plan {}: {} step(s), risk {}, estimated {:.0}s. Awaiting approval.",
            plan.id,
            plan.steps.len(),
            plan.risk_level,
            plan.estimated_duration
        );
        for step in &plan.steps {
            description.push_str(&format!("\n  {}. {}", step.order, step.description));
        }
        description
    }

    fn set_state(&mut self, next: ExecutionState) {
        if self.state != next {
            self.events.emit(AgentEvent::StateChanged {
                from: self.state,
                to: next,
            });
            self.state = next;
        }
    }

    #[cfg(test)]
    pub(crate) fn force_state(&mut self, state: ExecutionState) {
        self.state = state;
    }
}
