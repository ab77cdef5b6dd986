//! Capability domain entities
//!
//! [`ToolCapability`] is the static, descriptive side of a tool: what it
//! does, which parameters it takes, what must be true before it can run,
//! and the keywords/examples used for matching user text against it.
//!
//! [`ToolInfo`] is the distinct runtime-registry entry: the metadata paired
//! with an actual invocable handler. The two are deliberately separate:
//! the capability catalog is built once at startup and never mutated, while
//! the runtime registry can register and unregister handlers.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Category of a tool operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCategory {
    /// Creates new geometry (primitives)
    Creation,
    /// Modifies existing geometry (move, rotate)
    Modification,
    /// Read-only analysis (measurements, properties)
    Analysis,
    /// Boolean operations (union, cut, intersection)
    Boolean,
    /// Writes geometry to external formats
    Export,
    /// Reads geometry from external formats
    Import,
}

impl ToolCategory {
    pub fn as_str(&self) -> &str {
        match self {
            ToolCategory::Creation => "creation",
            ToolCategory::Modification => "modification",
            ToolCategory::Analysis => "analysis",
            ToolCategory::Boolean => "boolean",
            ToolCategory::Export => "export",
            ToolCategory::Import => "import",
        }
    }

    /// Whether tools in this category mutate the document
    pub fn mutates_document(&self) -> bool {
        !matches!(self, ToolCategory::Analysis | ToolCategory::Export)
    }
}

impl std::fmt::Display for ToolCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parameter specification for a capability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Parameter name
    pub name: String,
    /// Type hint (e.g., "number", "string", "vector")
    pub param_type: String,
    /// Whether this parameter is required
    pub required: bool,
    /// Default value applied when the parameter is omitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    /// Units, if the parameter is dimensional (e.g., "mm", "rad")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    /// Human-readable constraints (e.g., "must be positive")
    pub constraints: Vec<String>,
    /// Example values
    pub examples: Vec<String>,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>, param_type: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            required,
            default: None,
            units: None,
            constraints: Vec::new(),
            examples: Vec::new(),
        }
    }

    pub fn with_default(mut self, default: impl Into<serde_json::Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraints.push(constraint.into());
        self
    }

    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.examples.push(example.into());
        self
    }
}

/// Kind of precondition a capability needs before it can run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum RequirementKind {
    /// An active document must exist
    ActiveDocument,
    /// At least one object must be selected
    Selection,
    /// A specific object (or, with `None`, any object) must exist
    ObjectExists(Option<String>),
    /// The document must contain at least this many objects
    MinimumObjects(usize),
}

/// Precondition for running a tool, with a human-readable description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Requirement {
    pub kind: RequirementKind,
    pub description: String,
}

impl Requirement {
    pub fn new(kind: RequirementKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
        }
    }

    pub fn active_document() -> Self {
        Self::new(RequirementKind::ActiveDocument, "An active document must exist")
    }

    pub fn selection() -> Self {
        Self::new(RequirementKind::Selection, "At least one object must be selected")
    }

    pub fn minimum_objects(count: usize) -> Self {
        Self::new(
            RequirementKind::MinimumObjects(count),
            format!("The document must contain at least {} object(s)", count),
        )
    }
}

/// Example pairing of user text with the parameters it should produce
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageExample {
    /// Example user input
    pub input_text: String,
    /// Parameters the input should map to
    pub parameters: HashMap<String, serde_json::Value>,
    /// Description of the expected outcome
    pub expected_output: String,
}

impl UsageExample {
    pub fn new(input_text: impl Into<String>, expected_output: impl Into<String>) -> Self {
        Self {
            input_text: input_text.into(),
            parameters: HashMap::new(),
            expected_output: expected_output.into(),
        }
    }

    pub fn with_parameter(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }
}

/// Static descriptor of one invocable CAD operation.
///
/// Immutable once registered; the capability catalog is append-only at
/// startup (see [`CapabilityRegistry`](super::registry::CapabilityRegistry)).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCapability {
    /// Unique id in "category.method" form (e.g., "primitives.create_box")
    pub tool_id: String,
    /// Operation category
    pub category: ToolCategory,
    /// Short description
    pub description: String,
    /// Longer description for instruction generation
    pub detailed_description: String,
    /// Ordered parameter specifications
    pub parameters: Vec<ParameterSpec>,
    /// Preconditions checked against the workspace context
    pub requirements: Vec<Requirement>,
    /// Usage examples (also feed the semantic matcher)
    pub examples: Vec<UsageExample>,
    /// Keywords used for matching
    pub keywords: Vec<String>,
    /// Related tool ids
    pub related_tools: Vec<String>,
    /// Tags describing what this tool produces
    pub produces: Vec<String>,
    /// Tags describing what this tool modifies
    pub modifies: Vec<String>,
}

impl ToolCapability {
    pub fn new(
        tool_id: impl Into<String>,
        category: ToolCategory,
        description: impl Into<String>,
    ) -> Self {
        let description = description.into();
        Self {
            tool_id: tool_id.into(),
            category,
            detailed_description: description.clone(),
            description,
            parameters: Vec::new(),
            requirements: Vec::new(),
            examples: Vec::new(),
            keywords: Vec::new(),
            related_tools: Vec::new(),
            produces: Vec::new(),
            modifies: Vec::new(),
        }
    }

    pub fn with_detailed_description(mut self, description: impl Into<String>) -> Self {
        self.detailed_description = description.into();
        self
    }

    pub fn with_parameter(mut self, param: ParameterSpec) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn with_requirement(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    pub fn with_example(mut self, example: UsageExample) -> Self {
        self.examples.push(example);
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords.extend(keywords.into_iter().map(Into::into));
        self
    }

    pub fn with_related_tool(mut self, tool_id: impl Into<String>) -> Self {
        self.related_tools.push(tool_id.into());
        self
    }

    pub fn produces_tag(mut self, tag: impl Into<String>) -> Self {
        self.produces.push(tag.into());
        self
    }

    pub fn modifies_tag(mut self, tag: impl Into<String>) -> Self {
        self.modifies.push(tag.into());
        self
    }

    /// Human-readable display name derived from the method part of the id
    /// (e.g., "primitives.create_box" -> "Create Box").
    pub fn display_name(&self) -> String {
        let method = self.tool_id.split('.').next_back().unwrap_or(&self.tool_id);
        method
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Runtime registry entry: metadata paired with an invocable handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool id, matching the capability catalog
    pub id: String,
    /// Display name
    pub name: String,
    /// Short description
    pub description: String,
    /// Operation category
    pub category: ToolCategory,
    /// Capability tags (e.g., "geometry", "transform")
    pub capabilities: Vec<String>,
    /// Runtime dependency tags (e.g., "active_document", "selection")
    pub dependencies: Vec<String>,
    /// Parameter schema
    pub parameters: Vec<ParameterSpec>,
}

impl ToolInfo {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: ToolCategory,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            category,
            capabilities: Vec::new(),
            dependencies: Vec::new(),
            parameters: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_capability(mut self, tag: impl Into<String>) -> Self {
        self.capabilities.push(tag.into());
        self
    }

    pub fn with_dependency(mut self, tag: impl Into<String>) -> Self {
        self.dependencies.push(tag.into());
        self
    }

    pub fn with_parameter(mut self, param: ParameterSpec) -> Self {
        self.parameters.push(param);
        self
    }

    /// Registration-time validation: id and name must be non-empty.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("Tool info is missing an id".to_string());
        }
        if self.name.trim().is_empty() {
            return Err(format!("Tool '{}' is missing a name", self.id));
        }
        Ok(())
    }
}

/// Result of one tool operation.
///
/// Every CAD collaborator operation returns this exact shape: `success` and
/// `message` are always present; `object_name` and `properties` are filled
/// on success where meaningful. The pipeline and any UI depend on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutcome {
    /// Whether the operation succeeded
    pub success: bool,
    /// Human-readable outcome message
    pub message: String,
    /// Name of the created/affected object
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_name: Option<String>,
    /// Structured properties of the result (dimensions, volume, path, ...)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub properties: HashMap<String, serde_json::Value>,
}

impl ToolOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            object_name: None,
            properties: HashMap::new(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            object_name: None,
            properties: HashMap::new(),
        }
    }

    pub fn with_object(mut self, name: impl Into<String>) -> Self {
        self.object_name = Some(name.into());
        self
    }

    pub fn with_property(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}
