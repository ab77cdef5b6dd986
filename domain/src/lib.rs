//! Domain layer for cadmate
//!
//! Core business logic for driving CAD operations from natural-language
//! instructions. No infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Capability vs. Handler
//!
//! - **Capability**: the static description of one CAD operation
//!   (parameters, requirements, keywords, examples), registered once at
//!   startup into the append-only [`CapabilityRegistry`].
//! - **Handler**: the invocable side, bound at runtime into the
//!   infrastructure tool registry.
//!
//! ## Matching
//!
//! Free text is bound to tools through three combined matchers (pattern
//! rules, TF-IDF semantic scoring, capability keyword queries) producing
//! ranked [`ToolMatch`] candidates with extracted parameters.
//!
//! ## Plans
//!
//! In Agent mode an instruction becomes a [`Plan`]: ordered steps with
//! dependencies, a heuristic risk level, and a duration estimate, executed
//! by the application layer's pipeline.

pub mod agent;
pub mod capability;
pub mod context;
pub mod core;
pub mod matching;

// Re-export commonly used types
pub use agent::{
    Intent, IntentKind, analyze_intent,
    mode::{AgentMode, ExecutionState},
    plan::{
        DEFAULT_STEP_DURATION_SECS, Plan, PlanStatus, PlanStep, RiskLevel, StepResult,
        StepStatus, assess_risk,
    },
};
pub use capability::{
    CapabilityRegistry, ParameterSpec, Requirement, RequirementKind, ToolCapability,
    ToolCategory, ToolHandler, ToolInfo, ToolOutcome, ToolParams, UsageExample, number_param,
    string_param,
};
pub use context::{
    ConstraintsSection, ContextLimits, DocumentInfo, DocumentSection, MaterialsSection,
    ObjectDetail, ObjectRef, ObjectsSection, SelectionSection, SketchConstraints, ViewSection,
    WorkspaceContext,
};
pub use core::error::DomainError;
pub use matching::{
    MatchRecord, SemanticMatch, SemanticMatcher, ToolMatch, ToolSelector, content_keywords,
    extract_parameters, tokenize,
};
