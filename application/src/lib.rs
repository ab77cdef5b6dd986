//! Application layer for cadmate
//!
//! Ports (traits the infrastructure implements) and the orchestration use
//! cases built on them: context enrichment, plan execution, and the agent
//! manager that ties chat and agent behavior together.

pub mod config;
pub mod ports;
pub mod use_cases;

#[cfg(test)]
mod test_support;

pub use config::AgentSettings;
pub use ports::{
    AgentEvent, AiProvider, AiResponse, AiUsage, BooleanKind, CadError, CadGateway, EventBus,
    ExportFormat, ProviderError, ToolExecutorPort,
};
pub use use_cases::{
    AgentManager, AgentManagerBuilder, AgentResponse, AgentStatus, CapabilityReport,
    ContextEnricher, ExecutionPipeline, ExecutionRecord, ExecutionReport, PipelineControl,
    PipelineProgress, ResponseStatus,
};
