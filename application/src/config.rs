//! Agent behavior settings
//!
//! Defaults are conservative: plans require approval, checkpoints and
//! autosave are on, and failures roll back.

use cadmate_domain::context::entities::ContextLimits;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default wall-clock ceiling for a single step
pub const DEFAULT_MAX_EXECUTION_TIME_SECS: u64 = 300;

/// Settings that shape agent and pipeline behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Plans wait for explicit approval before executing
    pub require_approval: bool,
    /// Per-step timeout in seconds
    pub max_execution_time_secs: u64,
    /// Snapshot document object names before a run
    pub checkpoint_before_run: bool,
    /// Save the document before a run (best effort)
    pub autosave_before_run: bool,
    /// Undo completed mutating steps when a later step fails
    pub rollback_on_failure: bool,
    /// Matches below this confidence never become plan steps
    pub min_confidence: f64,
    /// Matches at or above this confidence become plan steps
    pub plan_confidence_threshold: f64,
    /// Most steps a single plan may carry
    pub max_plan_steps: usize,
    /// Most plans held in the pending queue
    pub max_queue_size: usize,
    /// Execution records retained in history
    pub max_history: usize,
    pub limits: ContextLimits,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            require_approval: true,
            max_execution_time_secs: DEFAULT_MAX_EXECUTION_TIME_SECS,
            checkpoint_before_run: true,
            autosave_before_run: true,
            rollback_on_failure: true,
            min_confidence: 0.3,
            plan_confidence_threshold: 0.7,
            max_plan_steps: 5,
            max_queue_size: 10,
            max_history: 50,
            limits: ContextLimits::default(),
        }
    }
}

impl AgentSettings {
    pub fn max_execution_time(&self) -> Duration {
        Duration::from_secs(self.max_execution_time_secs)
    }

    pub fn with_require_approval(mut self, require: bool) -> Self {
        self.require_approval = require;
        self
    }

    pub fn with_max_execution_time_secs(mut self, secs: u64) -> Self {
        self.max_execution_time_secs = secs;
        self
    }

    pub fn with_rollback_on_failure(mut self, rollback: bool) -> Self {
        self.rollback_on_failure = rollback;
        self
    }

    pub fn with_limits(mut self, limits: ContextLimits) -> Self {
        self.limits = limits;
        self
    }
}
