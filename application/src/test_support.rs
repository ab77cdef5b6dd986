//! Shared fakes for use case tests

use crate::ports::ai_provider::{AiProvider, AiResponse, ProviderError};
use crate::ports::cad_gateway::{BooleanKind, CadError, CadGateway, ExportFormat};
use crate::ports::tool_executor::ToolExecutorPort;
use async_trait::async_trait;
use cadmate_domain::capability::entities::{ToolCategory, ToolInfo, ToolOutcome};
use cadmate_domain::capability::handler::ToolParams;
use cadmate_domain::context::entities::{
    DocumentInfo, ObjectRef, SketchConstraints, ViewSection,
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// In-memory CAD gateway fake with failure and counting knobs
#[derive(Default)]
pub struct FakeCad {
    objects: Mutex<Vec<ObjectRef>>,
    selection: Mutex<Vec<ObjectRef>>,
    fail_queries: bool,
    pub undo_calls: AtomicUsize,
    pub save_calls: AtomicUsize,
}

impl FakeCad {
    pub fn failing_queries(mut self) -> Self {
        self.fail_queries = true;
        self
    }

    pub fn add_object(&self, object: ObjectRef) {
        self.objects.lock().unwrap().push(object);
    }

    pub fn select(&self, object: ObjectRef) {
        self.selection.lock().unwrap().push(object);
    }

    fn query_guard(&self) -> Result<(), CadError> {
        if self.fail_queries {
            Err(CadError::Unavailable("query failure injected".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CadGateway for FakeCad {
    async fn active_document_exists(&self) -> bool {
        !self.fail_queries
    }

    async fn document_info(&self) -> Result<DocumentInfo, CadError> {
        self.query_guard()?;
        let count = self.objects.lock().unwrap().len();
        Ok(DocumentInfo::new("Test", count, false))
    }

    async fn list_objects(&self) -> Result<Vec<ObjectRef>, CadError> {
        self.query_guard()?;
        Ok(self.objects.lock().unwrap().clone())
    }

    async fn object_properties(
        &self,
        name: &str,
    ) -> Result<HashMap<String, serde_json::Value>, CadError> {
        self.query_guard()?;
        let mut properties = HashMap::new();
        properties.insert("Name".to_string(), serde_json::json!(name));
        Ok(properties)
    }

    async fn get_selection(&self) -> Result<Vec<ObjectRef>, CadError> {
        self.query_guard()?;
        Ok(self.selection.lock().unwrap().clone())
    }

    async fn list_constraints(&self) -> Result<Vec<SketchConstraints>, CadError> {
        self.query_guard()?;
        Ok(Vec::new())
    }

    async fn list_materials(&self) -> Result<Vec<String>, CadError> {
        self.query_guard()?;
        Ok(Vec::new())
    }

    async fn view_info(&self) -> Result<ViewSection, CadError> {
        self.query_guard()?;
        Ok(ViewSection {
            camera: Some("isometric".to_string()),
            workbench: Some("Part".to_string()),
            error: None,
        })
    }

    async fn undo(&self) -> Result<(), CadError> {
        self.undo_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn save(&self) -> Result<(), CadError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn create_box(
        &self,
        _length: f64,
        _width: f64,
        _height: f64,
        _position: Option<[f64; 3]>,
        _name: Option<&str>,
    ) -> ToolOutcome {
        ToolOutcome::ok("box created").with_object("Box001")
    }

    async fn create_cylinder(
        &self,
        _radius: f64,
        _height: f64,
        _position: Option<[f64; 3]>,
        _name: Option<&str>,
    ) -> ToolOutcome {
        ToolOutcome::ok("cylinder created").with_object("Cylinder001")
    }

    async fn create_sphere(
        &self,
        _radius: f64,
        _position: Option<[f64; 3]>,
        _name: Option<&str>,
    ) -> ToolOutcome {
        ToolOutcome::ok("sphere created").with_object("Sphere001")
    }

    async fn create_cone(
        &self,
        _radius1: f64,
        _radius2: f64,
        _height: f64,
        _position: Option<[f64; 3]>,
        _name: Option<&str>,
    ) -> ToolOutcome {
        ToolOutcome::ok("cone created").with_object("Cone001")
    }

    async fn move_object(&self, name: &str, _offset: [f64; 3]) -> ToolOutcome {
        ToolOutcome::ok("moved").with_object(name)
    }

    async fn rotate_object(&self, name: &str, _axis: [f64; 3], _angle_rad: f64) -> ToolOutcome {
        ToolOutcome::ok("rotated").with_object(name)
    }

    async fn boolean_op(
        &self,
        kind: BooleanKind,
        _targets: &[String],
        _name: Option<&str>,
    ) -> ToolOutcome {
        ToolOutcome::ok(format!("{} applied", kind.as_str()))
    }

    async fn measure_distance(&self, _first: &str, _second: &str) -> ToolOutcome {
        ToolOutcome::ok("measured").with_property("distance", 1.0)
    }

    async fn bounding_box(&self, name: &str) -> ToolOutcome {
        ToolOutcome::ok("bounding box computed").with_object(name)
    }

    async fn volume(&self, name: &str) -> ToolOutcome {
        ToolOutcome::ok("volume computed").with_object(name)
    }

    async fn export(&self, format: ExportFormat, path: &str, _objects: &[String]) -> ToolOutcome {
        ToolOutcome::ok(format!("exported {} to {}", format.as_str(), path))
    }
}

/// Scripted tool executor fake
#[derive(Default)]
pub struct FakeTools {
    infos: HashMap<String, ToolInfo>,
    fail_ids: HashSet<String>,
    delay: Option<Duration>,
    pub invocations: Mutex<Vec<(String, ToolParams)>>,
}

impl FakeTools {
    pub fn with_tool(mut self, id: &str, category: ToolCategory) -> Self {
        self.infos
            .insert(id.to_string(), ToolInfo::new(id, id, category));
        self
    }

    pub fn failing(mut self, id: &str) -> Self {
        self.fail_ids.insert(id.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn invoked_ids(&self) -> Vec<String> {
        self.invocations
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }
}

#[async_trait]
impl ToolExecutorPort for FakeTools {
    fn has_tool(&self, tool_id: &str) -> bool {
        self.infos.contains_key(tool_id)
    }

    fn tool_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.infos.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn tool_info(&self, tool_id: &str) -> Option<ToolInfo> {
        self.infos.get(tool_id).cloned()
    }

    fn validate_params(&self, tool_id: &str, _params: &ToolParams) -> Result<(), String> {
        if self.infos.contains_key(tool_id) {
            Ok(())
        } else {
            Err(format!("Unknown tool: {}", tool_id))
        }
    }

    async fn validate_dependencies(&self, _tool_id: &str) -> (bool, Vec<String>) {
        (true, Vec::new())
    }

    async fn invoke(&self, tool_id: &str, params: &ToolParams) -> ToolOutcome {
        self.invocations
            .lock()
            .unwrap()
            .push((tool_id.to_string(), params.clone()));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_ids.contains(tool_id) {
            ToolOutcome::failed(format!("{} failed", tool_id))
        } else if self.infos.contains_key(tool_id) {
            ToolOutcome::ok(format!("{} completed", tool_id))
        } else {
            ToolOutcome::failed(format!("Unknown tool: {}", tool_id))
        }
    }
}

/// Canned AI provider fake
pub struct FakeProvider {
    pub reply: String,
}

#[async_trait]
impl AiProvider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    fn model(&self) -> &str {
        "fake-model"
    }

    async fn send_message(&self, _text: &str) -> Result<AiResponse, ProviderError> {
        Ok(AiResponse::new(self.reply.clone()))
    }

    async fn test_connection(&self) -> bool {
        true
    }
}
