//! Agent event bus
//!
//! Bounded broadcast channel for mode/state/plan notifications. Emission
//! never blocks: with no subscribers (or lagging ones) events are dropped
//! and the drop is logged at debug level.

use cadmate_domain::agent::{AgentMode, ExecutionState, RiskLevel};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

/// Default channel capacity
const DEFAULT_CAPACITY: usize = 64;

/// Notifications emitted by the agent manager and pipeline
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AgentEvent {
    ModeChanged {
        from: AgentMode,
        to: AgentMode,
    },
    StateChanged {
        from: ExecutionState,
        to: ExecutionState,
    },
    PlanCreated {
        plan_id: String,
        steps: usize,
        risk_level: RiskLevel,
    },
    ExecutionStarted {
        plan_id: String,
    },
    ExecutionCompleted {
        plan_id: String,
        duration_secs: f64,
    },
    ExecutionFailed {
        plan_id: String,
        error: String,
    },
}

/// Broadcast bus for [`AgentEvent`]s
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AgentEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AgentEvent> {
        self.sender.subscribe()
    }

    /// Fire-and-forget emission
    pub fn emit(&self, event: AgentEvent) {
        if self.sender.send(event.clone()).is_err() {
            debug!(?event, "event dropped: no subscribers");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_events() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        bus.emit(AgentEvent::ExecutionStarted {
            plan_id: "plan-1".into(),
        });
        match rx.recv().await.unwrap() {
            AgentEvent::ExecutionStarted { plan_id } => assert_eq!(plan_id, "plan-1"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_emit_without_subscribers_does_not_panic() {
        let bus = EventBus::new(4);
        bus.emit(AgentEvent::ModeChanged {
            from: AgentMode::Chat,
            to: AgentMode::Agent,
        });
    }
}
