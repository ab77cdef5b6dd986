//! CAD gateway port
//!
//! The external CAD collaborator (FreeCAD in production, an in-memory
//! workspace in tests and standalone runs). Query methods return
//! `Result<_, CadError>`; tool operations always return a [`ToolOutcome`]
//! so the pipeline gets the `{success, message, ...}` shape it depends on.

use async_trait::async_trait;
use cadmate_domain::capability::entities::ToolOutcome;
use cadmate_domain::context::entities::{DocumentInfo, ObjectRef, SketchConstraints, ViewSection};
use std::collections::HashMap;
use thiserror::Error;

/// Errors from CAD state queries
#[derive(Error, Debug, Clone)]
pub enum CadError {
    #[error("No active document")]
    NoActiveDocument,

    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("CAD workspace unavailable: {0}")]
    Unavailable(String),

    #[error("CAD operation failed: {0}")]
    OperationFailed(String),
}

/// Boolean operation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanKind {
    Union,
    Cut,
    Intersection,
}

impl BooleanKind {
    pub fn as_str(&self) -> &str {
        match self {
            BooleanKind::Union => "union",
            BooleanKind::Cut => "cut",
            BooleanKind::Intersection => "intersection",
        }
    }
}

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Stl,
    Step,
}

impl ExportFormat {
    pub fn as_str(&self) -> &str {
        match self {
            ExportFormat::Stl => "stl",
            ExportFormat::Step => "step",
        }
    }
}

/// Port to the CAD document and its operations.
///
/// Implementations (adapters) live in the infrastructure layer. The
/// document is a single shared mutable resource with no locking at this
/// layer; the pipeline serializes all mutating invocations.
#[async_trait]
pub trait CadGateway: Send + Sync {
    // --- state queries ---

    async fn active_document_exists(&self) -> bool;

    async fn document_info(&self) -> Result<DocumentInfo, CadError>;

    async fn list_objects(&self) -> Result<Vec<ObjectRef>, CadError>;

    async fn object_properties(
        &self,
        name: &str,
    ) -> Result<HashMap<String, serde_json::Value>, CadError>;

    async fn get_selection(&self) -> Result<Vec<ObjectRef>, CadError>;

    async fn list_constraints(&self) -> Result<Vec<SketchConstraints>, CadError>;

    async fn list_materials(&self) -> Result<Vec<String>, CadError>;

    async fn view_info(&self) -> Result<ViewSection, CadError>;

    // --- document control ---

    /// Undo the most recent mutating operation
    async fn undo(&self) -> Result<(), CadError>;

    /// Persist the document (best effort)
    async fn save(&self) -> Result<(), CadError>;

    // --- tool operations ---

    async fn create_box(
        &self,
        length: f64,
        width: f64,
        height: f64,
        position: Option<[f64; 3]>,
        name: Option<&str>,
    ) -> ToolOutcome;

    async fn create_cylinder(
        &self,
        radius: f64,
        height: f64,
        position: Option<[f64; 3]>,
        name: Option<&str>,
    ) -> ToolOutcome;

    async fn create_sphere(
        &self,
        radius: f64,
        position: Option<[f64; 3]>,
        name: Option<&str>,
    ) -> ToolOutcome;

    async fn create_cone(
        &self,
        radius1: f64,
        radius2: f64,
        height: f64,
        position: Option<[f64; 3]>,
        name: Option<&str>,
    ) -> ToolOutcome;

    async fn move_object(&self, name: &str, offset: [f64; 3]) -> ToolOutcome;

    async fn rotate_object(&self, name: &str, axis: [f64; 3], angle_rad: f64) -> ToolOutcome;

    async fn boolean_op(
        &self,
        kind: BooleanKind,
        targets: &[String],
        name: Option<&str>,
    ) -> ToolOutcome;

    async fn measure_distance(&self, first: &str, second: &str) -> ToolOutcome;

    async fn bounding_box(&self, name: &str) -> ToolOutcome;

    async fn volume(&self, name: &str) -> ToolOutcome;

    async fn export(&self, format: ExportFormat, path: &str, objects: &[String]) -> ToolOutcome;
}
