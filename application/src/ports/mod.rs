//! Ports (interfaces) implemented by the infrastructure layer

pub mod ai_provider;
pub mod cad_gateway;
pub mod events;
pub mod tool_executor;

pub use ai_provider::{AiProvider, AiResponse, AiUsage, ProviderError};
pub use cad_gateway::{BooleanKind, CadError, CadGateway, ExportFormat};
pub use events::{AgentEvent, EventBus};
pub use tool_executor::ToolExecutorPort;
