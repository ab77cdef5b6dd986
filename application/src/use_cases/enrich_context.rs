//! Context enrichment use case
//!
//! Builds a bounded [`WorkspaceContext`] snapshot from the CAD gateway.
//! Every section is extracted independently: a failing extractor writes its
//! error into that section and the rest of the snapshot still comes back.

use crate::ports::cad_gateway::{CadError, CadGateway};
use cadmate_domain::context::entities::{
    ConstraintsSection, ContextLimits, DocumentSection, MaterialsSection, ObjectDetail,
    ObjectsSection, SelectionSection, ViewSection, WorkspaceContext,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::debug;

/// Most selected objects reported per snapshot
const MAX_SELECTED_OBJECTS: usize = 10;

/// Builds workspace context snapshots.
///
/// Works without a gateway: every section then carries an unavailability
/// marker and the summary says so. Keeps a bounded rolling history of the
/// summaries it produced.
pub struct ContextEnricher {
    gateway: Option<Arc<dyn CadGateway>>,
    limits: ContextLimits,
    history: VecDeque<String>,
}

impl ContextEnricher {
    pub fn new(gateway: Option<Arc<dyn CadGateway>>, limits: ContextLimits) -> Self {
        Self {
            gateway,
            limits,
            history: VecDeque::new(),
        }
    }

    /// Build a fresh snapshot, merging caller-provided extra context.
    pub async fn enrich(
        &mut self,
        extra: HashMap<String, serde_json::Value>,
    ) -> WorkspaceContext {
        let mut context = WorkspaceContext {
            extra,
            ..WorkspaceContext::default()
        };

        match &self.gateway {
            None => {
                let marker = "CAD workspace unavailable".to_string();
                context.document.error = Some(marker.clone());
                context.selection.error = Some(marker.clone());
                context.objects.error = Some(marker.clone());
                context.constraints.error = Some(marker.clone());
                context.materials.error = Some(marker.clone());
                context.view.error = Some(marker);
            }
            Some(gateway) => {
                context.document = self.document_section(gateway.as_ref()).await;
                context.selection = self.selection_section(gateway.as_ref()).await;
                context.objects = self.objects_section(gateway.as_ref()).await;
                context.constraints = self.constraints_section(gateway.as_ref()).await;
                context.materials = self.materials_section(gateway.as_ref()).await;
                context.view = self.view_section(gateway.as_ref()).await;
            }
        }

        context.summary = self.summarize(&context);
        self.remember(context.summary.clone());
        context
    }

    /// Whether a CAD gateway is attached
    pub fn has_gateway(&self) -> bool {
        self.gateway.is_some()
    }

    /// Summaries of recent snapshots, oldest first
    pub fn history(&self) -> impl Iterator<Item = &str> {
        self.history.iter().map(|entry| entry.as_str())
    }

    async fn document_section(&self, gateway: &dyn CadGateway) -> DocumentSection {
        let mut section = DocumentSection::default();
        match gateway.document_info().await {
            Ok(info) => section.info = Some(info),
            Err(CadError::NoActiveDocument) => {}
            Err(error) => {
                debug!(%error, "document section extraction failed");
                section.error = Some(error.to_string());
            }
        }
        section
    }

    async fn selection_section(&self, gateway: &dyn CadGateway) -> SelectionSection {
        let mut section = SelectionSection::default();
        match gateway.get_selection().await {
            Ok(selected) => {
                section.truncated = selected.len() > MAX_SELECTED_OBJECTS;
                section.objects = selected.into_iter().take(MAX_SELECTED_OBJECTS).collect();
            }
            Err(CadError::NoActiveDocument) => {}
            Err(error) => {
                debug!(%error, "selection section extraction failed");
                section.error = Some(error.to_string());
            }
        }
        section
    }

    async fn objects_section(&self, gateway: &dyn CadGateway) -> ObjectsSection {
        let mut section = ObjectsSection::default();
        match gateway.list_objects().await {
            Ok(objects) => {
                section.total = objects.len();
                section.roots = objects
                    .iter()
                    .take(self.limits.max_tree_roots)
                    .map(|object| object.name.clone())
                    .collect();
                for object in objects.into_iter().take(self.limits.max_detailed_objects) {
                    // Per-object property failures degrade to an empty map
                    let properties = gateway
                        .object_properties(&object.name)
                        .await
                        .unwrap_or_default();
                    section.detailed.push(ObjectDetail { object, properties });
                }
            }
            Err(CadError::NoActiveDocument) => {}
            Err(error) => {
                debug!(%error, "objects section extraction failed");
                section.error = Some(error.to_string());
            }
        }
        section
    }

    async fn constraints_section(&self, gateway: &dyn CadGateway) -> ConstraintsSection {
        let mut section = ConstraintsSection::default();
        match gateway.list_constraints().await {
            Ok(sketches) => {
                section.sketches = sketches
                    .into_iter()
                    .map(|mut sketch| {
                        if sketch.constraints.len() > self.limits.max_constraints_per_sketch {
                            sketch
                                .constraints
                                .truncate(self.limits.max_constraints_per_sketch);
                            sketch.truncated = true;
                        }
                        sketch
                    })
                    .collect();
            }
            Err(CadError::NoActiveDocument) => {}
            Err(error) => {
                debug!(%error, "constraints section extraction failed");
                section.error = Some(error.to_string());
            }
        }
        section
    }

    async fn materials_section(&self, gateway: &dyn CadGateway) -> MaterialsSection {
        let mut section = MaterialsSection::default();
        match gateway.list_materials().await {
            Ok(materials) => section.materials = materials,
            Err(CadError::NoActiveDocument) => {}
            Err(error) => {
                debug!(%error, "materials section extraction failed");
                section.error = Some(error.to_string());
            }
        }
        section
    }

    async fn view_section(&self, gateway: &dyn CadGateway) -> ViewSection {
        match gateway.view_info().await {
            Ok(view) => view,
            Err(CadError::NoActiveDocument) => ViewSection::default(),
            Err(error) => {
                debug!(%error, "view section extraction failed");
                ViewSection {
                    error: Some(error.to_string()),
                    ..ViewSection::default()
                }
            }
        }
    }

    fn summarize(&self, context: &WorkspaceContext) -> String {
        if self.gateway.is_none() {
            return "CAD workspace unavailable.".to_string();
        }
        let Some(info) = &context.document.info else {
            return "No active document.".to_string();
        };
        let mut summary = format!(
            "Document '{}': {} object(s), {} selected.",
            info.name,
            context.objects.total,
            context.selection.objects.len()
        );
        if let Some(workbench) = &context.view.workbench {
            summary.push_str(&format!(" Active workbench: {}.", workbench));
        }
        summary
    }

    fn remember(&mut self, summary: String) {
        self.history.push_back(summary);
        while self.history.len() > self.limits.max_history_items {
            self.history.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeCad;
    use cadmate_domain::context::entities::ObjectRef;

    #[tokio::test]
    async fn test_enrich_without_gateway_degrades_gracefully() {
        let mut enricher = ContextEnricher::new(None, ContextLimits::default());
        let context = enricher.enrich(HashMap::new()).await;

        assert!(context.document.error.is_some());
        assert!(context.selection.error.is_some());
        assert!(context.objects.error.is_some());
        assert!(context.constraints.error.is_some());
        assert!(context.materials.error.is_some());
        assert!(context.view.error.is_some());
        assert_eq!(context.summary, "CAD workspace unavailable.");
    }

    #[tokio::test]
    async fn test_enrich_with_failing_gateway_keeps_other_sections() {
        let cad = Arc::new(FakeCad::default().failing_queries());
        let mut enricher = ContextEnricher::new(Some(cad), ContextLimits::default());
        let context = enricher.enrich(HashMap::new()).await;

        // Each section carries its own error; nothing panics
        assert!(context.document.error.is_some());
        assert!(context.objects.error.is_some());
        assert!(context.objects.detailed.is_empty());
    }

    #[tokio::test]
    async fn test_enrich_applies_bounds() {
        let cad = FakeCad::default();
        for index in 0..60 {
            cad.add_object(ObjectRef::new(format!("Box{index:03}"), "Part::Box"));
        }
        let mut enricher = ContextEnricher::new(Some(Arc::new(cad)), ContextLimits::default());
        let context = enricher.enrich(HashMap::new()).await;

        assert_eq!(context.objects.total, 60);
        assert_eq!(context.objects.detailed.len(), 50);
        assert_eq!(context.objects.roots.len(), 10);
        assert!(context.has_document());
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let limits = ContextLimits {
            max_history_items: 3,
            ..ContextLimits::default()
        };
        let mut enricher = ContextEnricher::new(None, limits);
        for _ in 0..5 {
            enricher.enrich(HashMap::new()).await;
        }
        assert_eq!(enricher.history().count(), 3);
    }

    #[tokio::test]
    async fn test_extra_context_is_preserved() {
        let mut enricher = ContextEnricher::new(None, ContextLimits::default());
        let mut extra = HashMap::new();
        extra.insert("session".to_string(), serde_json::json!("repl"));
        let context = enricher.enrich(extra).await;
        assert_eq!(context.extra["session"], serde_json::json!("repl"));
    }
}
