//! Runtime tool registry
//!
//! Holds the invocable [`ToolHandler`]s and implements
//! [`ToolExecutorPort`]. Registration is non-throwing: invalid or
//! duplicate handlers are logged and refused, and a refused registration
//! leaves no trace in any index.

use async_trait::async_trait;
use cadmate_application::ports::cad_gateway::CadGateway;
use cadmate_application::ports::tool_executor::ToolExecutorPort;
use cadmate_domain::capability::entities::{ToolCategory, ToolInfo, ToolOutcome};
use cadmate_domain::capability::handler::{ToolHandler, ToolParams};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Dependency tag requiring an active document
pub const DEP_ACTIVE_DOCUMENT: &str = "active_document";
/// Dependency tag requiring a non-empty selection
pub const DEP_SELECTION: &str = "selection";
/// Dependency tag prefix requiring at least N objects ("objects:2")
pub const DEP_OBJECTS_PREFIX: &str = "objects:";

/// Registry of invocable tools with category and capability indexes.
pub struct ToolRegistry {
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
    by_category: HashMap<ToolCategory, Vec<String>>,
    by_capability: HashMap<String, Vec<String>>,
    cad: Option<Arc<dyn CadGateway>>,
}

impl ToolRegistry {
    pub fn new(cad: Option<Arc<dyn CadGateway>>) -> Self {
        Self {
            handlers: HashMap::new(),
            by_category: HashMap::new(),
            by_capability: HashMap::new(),
            cad,
        }
    }

    /// Register a handler. Returns false (and logs) on invalid metadata or
    /// a duplicate id; the registry is unchanged in that case.
    pub fn register_tool(&mut self, handler: Arc<dyn ToolHandler>) -> bool {
        let info = handler.info().clone();
        if let Err(reason) = info.validate() {
            warn!(%reason, "tool registration refused");
            return false;
        }
        if self.handlers.contains_key(&info.id) {
            warn!(tool = %info.id, "tool registration refused: duplicate id");
            return false;
        }

        // All checks passed; now touch every index
        self.by_category
            .entry(info.category)
            .or_default()
            .push(info.id.clone());
        for capability in &info.capabilities {
            self.by_capability
                .entry(capability.clone())
                .or_default()
                .push(info.id.clone());
        }
        debug!(tool = %info.id, category = %info.category, "tool registered");
        self.handlers.insert(info.id, handler);
        true
    }

    /// Remove a handler and all its index entries.
    pub fn unregister_tool(&mut self, tool_id: &str) -> bool {
        let Some(handler) = self.handlers.remove(tool_id) else {
            return false;
        };
        let info = handler.info();
        if let Some(ids) = self.by_category.get_mut(&info.category) {
            ids.retain(|id| id != tool_id);
        }
        for capability in &info.capabilities {
            if let Some(ids) = self.by_capability.get_mut(capability) {
                ids.retain(|id| id != tool_id);
            }
        }
        debug!(tool = %tool_id, "tool unregistered");
        true
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Tools in one category, in registration order
    pub fn tools_in_category(&self, category: ToolCategory) -> Vec<ToolInfo> {
        self.by_category
            .get(&category)
            .into_iter()
            .flatten()
            .filter_map(|id| self.handlers.get(id))
            .map(|handler| handler.info().clone())
            .collect()
    }

    /// Tools carrying a capability tag
    pub fn tools_with_capability(&self, tag: &str) -> Vec<ToolInfo> {
        self.by_capability
            .get(tag)
            .into_iter()
            .flatten()
            .filter_map(|id| self.handlers.get(id))
            .map(|handler| handler.info().clone())
            .collect()
    }

    /// Case-insensitive substring search over id, name, description, and
    /// capability tags.
    pub fn search_tools(&self, query: &str) -> Vec<ToolInfo> {
        let needle = query.to_lowercase();
        let mut found: Vec<ToolInfo> = self
            .handlers
            .values()
            .map(|handler| handler.info())
            .filter(|info| {
                info.id.to_lowercase().contains(&needle)
                    || info.name.to_lowercase().contains(&needle)
                    || info.description.to_lowercase().contains(&needle)
                    || info
                        .capabilities
                        .iter()
                        .any(|tag| tag.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        found
    }
}

#[async_trait]
impl ToolExecutorPort for ToolRegistry {
    fn has_tool(&self, tool_id: &str) -> bool {
        self.handlers.contains_key(tool_id)
    }

    fn tool_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.handlers.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn tool_info(&self, tool_id: &str) -> Option<ToolInfo> {
        self.handlers
            .get(tool_id)
            .map(|handler| handler.info().clone())
    }

    fn validate_params(&self, tool_id: &str, params: &ToolParams) -> Result<(), String> {
        match self.handlers.get(tool_id) {
            Some(handler) => handler.validate_params(params),
            None => Err(format!("Unknown tool: {}", tool_id)),
        }
    }

    async fn validate_dependencies(&self, tool_id: &str) -> (bool, Vec<String>) {
        let Some(handler) = self.handlers.get(tool_id) else {
            return (false, vec![format!("Unknown tool: {}", tool_id)]);
        };
        let dependencies = &handler.info().dependencies;
        if dependencies.is_empty() {
            return (true, Vec::new());
        }
        let Some(cad) = &self.cad else {
            return (
                false,
                vec!["CAD workspace unavailable".to_string()],
            );
        };

        let mut missing = Vec::new();
        for dependency in dependencies {
            if dependency == DEP_ACTIVE_DOCUMENT {
                if !cad.active_document_exists().await {
                    missing.push("An active document is required".to_string());
                }
            } else if dependency == DEP_SELECTION {
                let selected = cad.get_selection().await.map(|s| s.len()).unwrap_or(0);
                if selected == 0 {
                    missing.push("At least one object must be selected".to_string());
                }
            } else if let Some(count) = dependency.strip_prefix(DEP_OBJECTS_PREFIX) {
                let required: usize = count.parse().unwrap_or(1);
                let present = cad.list_objects().await.map(|o| o.len()).unwrap_or(0);
                if present < required {
                    missing.push(format!(
                        "The document must contain at least {} object(s)",
                        required
                    ));
                }
            } else {
                missing.push(format!("Unknown dependency tag: {}", dependency));
            }
        }
        (missing.is_empty(), missing)
    }

    async fn invoke(&self, tool_id: &str, params: &ToolParams) -> ToolOutcome {
        let Some(handler) = self.handlers.get(tool_id) else {
            return ToolOutcome::failed(format!("Unknown tool: {}", tool_id));
        };
        if let Err(reason) = handler.validate_params(params) {
            return ToolOutcome::failed(reason);
        }
        debug!(tool = %tool_id, "tool invoked");
        handler.invoke(params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadmate_domain::capability::entities::ParameterSpec;

    struct StaticTool {
        info: ToolInfo,
    }

    impl StaticTool {
        fn new(id: &str, name: &str, category: ToolCategory) -> Self {
            Self {
                info: ToolInfo::new(id, name, category),
            }
        }

        fn with_info(info: ToolInfo) -> Self {
            Self { info }
        }
    }

    #[async_trait]
    impl ToolHandler for StaticTool {
        fn info(&self) -> &ToolInfo {
            &self.info
        }

        async fn invoke(&self, _params: &ToolParams) -> ToolOutcome {
            ToolOutcome::ok("done")
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = ToolRegistry::new(None);
        assert!(registry.register_tool(Arc::new(StaticTool::new(
            "primitives.create_box",
            "Create Box",
            ToolCategory::Creation,
        ))));
        assert!(registry.has_tool("primitives.create_box"));
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.tools_in_category(ToolCategory::Creation).len(),
            1
        );
    }

    #[test]
    fn test_duplicate_registration_refused() {
        let mut registry = ToolRegistry::new(None);
        assert!(registry.register_tool(Arc::new(StaticTool::new(
            "a.b",
            "First",
            ToolCategory::Creation,
        ))));
        assert!(!registry.register_tool(Arc::new(StaticTool::new(
            "a.b",
            "Second",
            ToolCategory::Analysis,
        ))));
        // The original registration is untouched
        assert_eq!(registry.tool_info("a.b").unwrap().name, "First");
        assert!(registry.tools_in_category(ToolCategory::Analysis).is_empty());
    }

    #[test]
    fn test_invalid_metadata_leaves_no_trace() {
        let mut registry = ToolRegistry::new(None);
        let invalid = ToolInfo::new("", "Nameless", ToolCategory::Analysis)
            .with_capability("geometry");
        assert!(!registry.register_tool(Arc::new(StaticTool::with_info(invalid))));
        assert!(registry.is_empty());
        assert!(registry.tools_with_capability("geometry").is_empty());
    }

    #[test]
    fn test_unregister_cleans_indexes() {
        let mut registry = ToolRegistry::new(None);
        let info = ToolInfo::new("a.b", "Tool", ToolCategory::Creation)
            .with_capability("geometry");
        registry.register_tool(Arc::new(StaticTool::with_info(info)));

        assert!(registry.unregister_tool("a.b"));
        assert!(!registry.unregister_tool("a.b"));
        assert!(registry.tools_in_category(ToolCategory::Creation).is_empty());
        assert!(registry.tools_with_capability("geometry").is_empty());
    }

    #[test]
    fn test_search_matches_name_and_capability() {
        let mut registry = ToolRegistry::new(None);
        registry.register_tool(Arc::new(StaticTool::with_info(
            ToolInfo::new("primitives.create_box", "Create Box", ToolCategory::Creation)
                .with_description("Create a rectangular box")
                .with_capability("geometry"),
        )));
        registry.register_tool(Arc::new(StaticTool::with_info(
            ToolInfo::new("measurement.volume", "Volume", ToolCategory::Analysis)
                .with_description("Compute the volume of an object"),
        )));

        assert_eq!(registry.search_tools("box").len(), 1);
        assert_eq!(registry.search_tools("geometry").len(), 1);
        assert_eq!(registry.search_tools("VOLUME").len(), 1);
        assert!(registry.search_tools("torus").is_empty());
    }

    #[tokio::test]
    async fn test_invoke_unknown_tool_fails_cleanly() {
        let registry = ToolRegistry::new(None);
        let outcome = registry.invoke("missing.tool", &ToolParams::new()).await;
        assert!(!outcome.success);
        assert!(outcome.message.contains("Unknown tool"));
    }

    #[tokio::test]
    async fn test_invoke_validates_params_first() {
        let mut registry = ToolRegistry::new(None);
        let info = ToolInfo::new("a.b", "Tool", ToolCategory::Creation)
            .with_parameter(ParameterSpec::new("radius", "number", true));
        registry.register_tool(Arc::new(StaticTool::with_info(info)));

        let outcome = registry.invoke("a.b", &ToolParams::new()).await;
        assert!(!outcome.success);
        assert!(outcome.message.contains("radius"));
    }

    #[tokio::test]
    async fn test_dependency_validation_without_cad() {
        let mut registry = ToolRegistry::new(None);
        let info = ToolInfo::new("a.b", "Tool", ToolCategory::Modification)
            .with_dependency(DEP_ACTIVE_DOCUMENT);
        registry.register_tool(Arc::new(StaticTool::with_info(info)));

        let (passed, missing) = registry.validate_dependencies("a.b").await;
        assert!(!passed);
        assert_eq!(missing.len(), 1);
    }

    #[tokio::test]
    async fn test_dependency_validation_with_cad() {
        use crate::cad::memory::MemoryCad;

        let cad = Arc::new(MemoryCad::new("Test"));
        cad.create_box(1.0, 1.0, 1.0, None, None).await;

        let mut registry = ToolRegistry::new(Some(cad.clone()));
        let info = ToolInfo::new("a.b", "Tool", ToolCategory::Boolean)
            .with_dependency(DEP_ACTIVE_DOCUMENT)
            .with_dependency("objects:2");
        registry.register_tool(Arc::new(StaticTool::with_info(info)));

        let (passed, missing) = registry.validate_dependencies("a.b").await;
        assert!(!passed);
        assert_eq!(missing.len(), 1);

        cad.create_box(1.0, 1.0, 1.0, None, None).await;
        let (passed, missing) = registry.validate_dependencies("a.b").await;
        assert!(passed);
        assert!(missing.is_empty());
    }
}
