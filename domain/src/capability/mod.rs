//! Capability catalog: static tool descriptors, the append-only registry,
//! and the invocable handler trait.

pub mod entities;
pub mod handler;
pub mod registry;

pub use entities::{
    ParameterSpec, Requirement, RequirementKind, ToolCapability, ToolCategory, ToolInfo,
    ToolOutcome, UsageExample,
};
pub use handler::{ToolHandler, ToolParams, number_param, string_param};
pub use registry::CapabilityRegistry;
