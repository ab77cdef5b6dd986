//! Transform and boolean tools

use super::{registry::DEP_ACTIVE_DOCUMENT, string_list_param, vec3_param};
use async_trait::async_trait;
use cadmate_application::ports::cad_gateway::{BooleanKind, CadGateway};
use cadmate_domain::capability::entities::{ParameterSpec, ToolCategory, ToolInfo, ToolOutcome};
use cadmate_domain::capability::handler::{ToolHandler, ToolParams, number_param, string_param};
use std::sync::Arc;

fn object_spec() -> ParameterSpec {
    ParameterSpec::new("object", "string", true).with_constraint("must name an existing object")
}

/// Translate an object by an offset
pub struct MoveObjectTool {
    cad: Arc<dyn CadGateway>,
    info: ToolInfo,
}

impl MoveObjectTool {
    pub fn new(cad: Arc<dyn CadGateway>) -> Self {
        Self {
            cad,
            info: ToolInfo::new("operations.move_object", "Move Object", ToolCategory::Modification)
                .with_description("Translate an object by an offset along x, y and z")
                .with_capability("transform")
                .with_dependency(DEP_ACTIVE_DOCUMENT)
                .with_parameter(object_spec())
                .with_parameter(
                    ParameterSpec::new("x", "number", false)
                        .with_default(0.0)
                        .with_units("mm"),
                )
                .with_parameter(
                    ParameterSpec::new("y", "number", false)
                        .with_default(0.0)
                        .with_units("mm"),
                )
                .with_parameter(
                    ParameterSpec::new("z", "number", false)
                        .with_default(0.0)
                        .with_units("mm"),
                ),
        }
    }
}

#[async_trait]
impl ToolHandler for MoveObjectTool {
    fn info(&self) -> &ToolInfo {
        &self.info
    }

    async fn invoke(&self, params: &ToolParams) -> ToolOutcome {
        let Some(object) = string_param(&self.info, params, "object") else {
            return ToolOutcome::failed("Missing 'object' parameter");
        };
        let offset = [
            number_param(&self.info, params, "x").unwrap_or(0.0),
            number_param(&self.info, params, "y").unwrap_or(0.0),
            number_param(&self.info, params, "z").unwrap_or(0.0),
        ];
        self.cad.move_object(object, offset).await
    }
}

/// Rotate an object around an axis
pub struct RotateObjectTool {
    cad: Arc<dyn CadGateway>,
    info: ToolInfo,
}

impl RotateObjectTool {
    pub fn new(cad: Arc<dyn CadGateway>) -> Self {
        Self {
            cad,
            info: ToolInfo::new(
                "operations.rotate_object",
                "Rotate Object",
                ToolCategory::Modification,
            )
                .with_description("Rotate an object around an axis by an angle in radians")
                .with_capability("transform")
                .with_dependency(DEP_ACTIVE_DOCUMENT)
                .with_parameter(object_spec())
                .with_parameter(
                    ParameterSpec::new("angle", "number", true).with_units("rad"),
                )
                .with_parameter(ParameterSpec::new("axis", "vector", false)),
        }
    }
}

#[async_trait]
impl ToolHandler for RotateObjectTool {
    fn info(&self) -> &ToolInfo {
        &self.info
    }

    async fn invoke(&self, params: &ToolParams) -> ToolOutcome {
        let Some(object) = string_param(&self.info, params, "object") else {
            return ToolOutcome::failed("Missing 'object' parameter");
        };
        let Some(angle) = number_param(&self.info, params, "angle") else {
            return ToolOutcome::failed("Missing 'angle' parameter");
        };
        let axis = vec3_param(params, "axis").unwrap_or([0.0, 0.0, 1.0]);
        self.cad.rotate_object(object, axis, angle).await
    }
}

/// Boolean operation over two or more objects
pub struct BooleanTool {
    cad: Arc<dyn CadGateway>,
    kind: BooleanKind,
    info: ToolInfo,
}

impl BooleanTool {
    pub fn new(cad: Arc<dyn CadGateway>, kind: BooleanKind) -> Self {
        let (id, name, description) = match kind {
            BooleanKind::Union => (
                "operations.boolean_union",
                "Boolean Union",
                "Fuse two or more objects into one",
            ),
            BooleanKind::Cut => (
                "operations.boolean_cut",
                "Boolean Cut",
                "Subtract objects from the first object",
            ),
            BooleanKind::Intersection => (
                "operations.boolean_intersection",
                "Boolean Intersection",
                "Keep only the common volume of the objects",
            ),
        };
        Self {
            cad,
            kind,
            info: ToolInfo::new(id, name, ToolCategory::Boolean)
                .with_description(description)
                .with_capability("boolean")
                .with_dependency(DEP_ACTIVE_DOCUMENT)
                .with_dependency("objects:2")
                .with_parameter(
                    ParameterSpec::new("objects", "list", true)
                        .with_constraint("at least two object names"),
                )
                .with_parameter(ParameterSpec::new("name", "string", false)),
        }
    }
}

#[async_trait]
impl ToolHandler for BooleanTool {
    fn info(&self) -> &ToolInfo {
        &self.info
    }

    async fn invoke(&self, params: &ToolParams) -> ToolOutcome {
        let targets = string_list_param(params, "objects");
        if targets.len() < 2 {
            return ToolOutcome::failed("Boolean operations need at least two objects");
        }
        self.cad
            .boolean_op(self.kind, &targets, string_param(&self.info, params, "name"))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cad::memory::MemoryCad;

    fn memory_cad() -> Arc<MemoryCad> {
        Arc::new(MemoryCad::new("Test"))
    }

    #[tokio::test]
    async fn test_move_reads_offset_params() {
        let cad = memory_cad();
        cad.create_box(1.0, 1.0, 1.0, None, None).await;
        let tool = MoveObjectTool::new(Arc::clone(&cad) as Arc<dyn CadGateway>);

        let mut params = ToolParams::new();
        params.insert("object".to_string(), serde_json::json!("Box001"));
        params.insert("x".to_string(), serde_json::json!(5.0));
        let outcome = tool.invoke(&params).await;
        assert!(outcome.success);
        assert_eq!(
            outcome.properties["position"],
            serde_json::json!([5.0, 0.0, 0.0])
        );
    }

    #[tokio::test]
    async fn test_move_requires_object() {
        let cad = memory_cad();
        let tool = MoveObjectTool::new(cad);
        assert!(tool.validate_params(&ToolParams::new()).is_err());

        let outcome = tool.invoke(&ToolParams::new()).await;
        assert!(!outcome.success);
    }

    #[tokio::test]
    async fn test_rotate_defaults_to_z_axis() {
        let cad = memory_cad();
        cad.create_box(1.0, 1.0, 1.0, None, None).await;
        let tool = RotateObjectTool::new(Arc::clone(&cad) as Arc<dyn CadGateway>);

        let mut params = ToolParams::new();
        params.insert("object".to_string(), serde_json::json!("Box001"));
        params.insert("angle".to_string(), serde_json::json!(1.5707963));
        let outcome = tool.invoke(&params).await;
        assert!(outcome.success);
        assert_eq!(outcome.properties["axis"], serde_json::json!([0.0, 0.0, 1.0]));
    }

    #[tokio::test]
    async fn test_boolean_union_invokes_gateway() {
        let cad = memory_cad();
        cad.create_box(2.0, 2.0, 2.0, None, None).await;
        cad.create_box(3.0, 1.0, 1.0, None, None).await;
        let tool = BooleanTool::new(Arc::clone(&cad) as Arc<dyn CadGateway>, BooleanKind::Union);

        let mut params = ToolParams::new();
        params.insert(
            "objects".to_string(),
            serde_json::json!(["Box001", "Box002"]),
        );
        let outcome = tool.invoke(&params).await;
        assert!(outcome.success);
        assert_eq!(outcome.object_name.as_deref(), Some("Union001"));
    }

    #[tokio::test]
    async fn test_boolean_rejects_single_object() {
        let cad = memory_cad();
        cad.create_box(1.0, 1.0, 1.0, None, None).await;
        let tool = BooleanTool::new(cad, BooleanKind::Cut);

        let mut params = ToolParams::new();
        params.insert("objects".to_string(), serde_json::json!(["Box001"]));
        let outcome = tool.invoke(&params).await;
        assert!(!outcome.success);
    }
}
