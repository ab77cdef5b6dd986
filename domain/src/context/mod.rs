//! Workspace context snapshot types

pub mod entities;

pub use entities::{
    ConstraintsSection, ContextLimits, DocumentInfo, DocumentSection, MaterialsSection,
    ObjectDetail, ObjectRef, ObjectsSection, SelectionSection, SketchConstraints, ViewSection,
    WorkspaceContext,
};
