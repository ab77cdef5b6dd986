//! Orchestration use cases

pub mod agent_manager;
pub mod enrich_context;
pub mod execute_plan;

pub use agent_manager::{
    AgentManager, AgentManagerBuilder, AgentResponse, AgentStatus, CapabilityReport,
    ExecutionRecord, ResponseStatus,
};
pub use enrich_context::ContextEnricher;
pub use execute_plan::{
    ExecutionPipeline, ExecutionReport, LogEntry, NoPipelineProgress, PipelineControl,
    PipelineProgress,
};
