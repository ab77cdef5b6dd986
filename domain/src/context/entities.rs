//! Workspace context snapshot types
//!
//! A [`WorkspaceContext`] is an ephemeral snapshot of CAD state produced by
//! the context enricher for one request. Each section carries its own
//! optional `error` string: a failed extractor degrades that section
//! instead of failing the whole snapshot.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Bounds applied while building a context snapshot.
///
/// Configuration, not constants: callers tune these per deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextLimits {
    /// Maximum objects described in detail
    pub max_detailed_objects: usize,
    /// Maximum root objects listed in the object tree
    pub max_tree_roots: usize,
    /// Maximum constraints reported per sketch
    pub max_constraints_per_sketch: usize,
    /// Maximum rolling summary history entries retained
    pub max_history_items: usize,
}

impl Default for ContextLimits {
    fn default() -> Self {
        Self {
            max_detailed_objects: 50,
            max_tree_roots: 10,
            max_constraints_per_sketch: 20,
            max_history_items: 10,
        }
    }
}

/// Lightweight reference to a document object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Internal object name (e.g., "Box001")
    pub name: String,
    /// Type name (e.g., "Part::Box")
    pub type_name: String,
    /// User-facing label, when it differs from the name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ObjectRef {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Basic facts about the active document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub name: String,
    pub object_count: usize,
    pub modified: bool,
}

impl DocumentInfo {
    pub fn new(name: impl Into<String>, object_count: usize, modified: bool) -> Self {
        Self {
            name: name.into(),
            object_count,
            modified,
        }
    }
}

/// Document section of the snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<DocumentInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Selection section of the snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectionSection {
    pub objects: Vec<ObjectRef>,
    /// True when the selection was cut off at the configured limit
    pub truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One object with its detailed properties
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectDetail {
    pub object: ObjectRef,
    #[serde(default)]
    pub properties: HashMap<String, serde_json::Value>,
}

/// Object-tree section of the snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectsSection {
    /// Objects described in detail (bounded)
    pub detailed: Vec<ObjectDetail>,
    /// Root object names (bounded)
    pub roots: Vec<String>,
    /// Total object count before truncation
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Constraints of one sketch (bounded)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SketchConstraints {
    pub sketch: String,
    pub constraints: Vec<String>,
    pub truncated: bool,
}

/// Constraints section of the snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConstraintsSection {
    pub sketches: Vec<SketchConstraints>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Materials section of the snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaterialsSection {
    pub materials: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// View/camera section of the snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera: Option<String>,
    /// Name of the active workbench, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workbench: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Full context snapshot handed to intent analysis and tool selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceContext {
    pub document: DocumentSection,
    pub selection: SelectionSection,
    pub objects: ObjectsSection,
    pub constraints: ConstraintsSection,
    pub materials: MaterialsSection,
    pub view: ViewSection,
    /// Generated natural-language summary of the snapshot
    pub summary: String,
    /// Caller-provided extra context merged into the snapshot
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, serde_json::Value>,
}

impl WorkspaceContext {
    /// Whether an active document was observed
    pub fn has_document(&self) -> bool {
        self.document.info.is_some()
    }

    /// Whether any object is selected
    pub fn has_selection(&self) -> bool {
        !self.selection.objects.is_empty()
    }

    /// Names of all objects known to the snapshot (detailed first, then roots)
    pub fn object_names(&self) -> impl Iterator<Item = &str> {
        self.objects
            .detailed
            .iter()
            .map(|detail| detail.object.name.as_str())
            .chain(
                self.objects
                    .roots
                    .iter()
                    .map(|name| name.as_str())
                    .filter(|name| {
                        !self
                            .objects
                            .detailed
                            .iter()
                            .any(|detail| detail.object.name == *name)
                    }),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = ContextLimits::default();
        assert_eq!(limits.max_detailed_objects, 50);
        assert_eq!(limits.max_tree_roots, 10);
        assert_eq!(limits.max_constraints_per_sketch, 20);
        assert_eq!(limits.max_history_items, 10);
    }

    #[test]
    fn test_object_names_deduplicates_roots() {
        let mut context = WorkspaceContext::default();
        context.objects.detailed.push(ObjectDetail {
            object: ObjectRef::new("Box001", "Part::Box"),
            properties: HashMap::new(),
        });
        context.objects.roots = vec!["Box001".to_string(), "Sphere001".to_string()];

        let names: Vec<&str> = context.object_names().collect();
        assert_eq!(names, vec!["Box001", "Sphere001"]);
    }

    #[test]
    fn test_empty_context_flags() {
        let context = WorkspaceContext::default();
        assert!(!context.has_document());
        assert!(!context.has_selection());
        assert_eq!(context.object_names().count(), 0);
    }
}
