//! Infrastructure layer for cadmate
//!
//! Adapters behind the application ports: the in-memory CAD workspace,
//! the built-in tool handlers and runtime registry, the AI provider HTTP
//! clients, configuration loading, and logging sinks.

pub mod cad;
pub mod config;
pub mod logging;
pub mod providers;
pub mod tools;

pub use cad::MemoryCad;
pub use config::{ConfigLoader, FileConfig};
pub use logging::JsonlExecutionLogger;
pub use providers::{ProviderKind, build_provider, default_model, models_for};
pub use tools::{ToolRegistry, build_capability_catalog, build_selector, register_builtin_tools};
