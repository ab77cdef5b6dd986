//! Primitive creation tools

use super::{registry::DEP_ACTIVE_DOCUMENT, vec3_param};
use async_trait::async_trait;
use cadmate_application::ports::cad_gateway::CadGateway;
use cadmate_domain::capability::entities::{ParameterSpec, ToolCategory, ToolInfo, ToolOutcome};
use cadmate_domain::capability::handler::{ToolHandler, ToolParams, number_param, string_param};
use std::sync::Arc;

fn dimension_spec(name: &str, default: f64) -> ParameterSpec {
    ParameterSpec::new(name, "number", true)
        .with_default(default)
        .with_units("mm")
        .with_constraint("must be positive")
}

fn position_spec() -> ParameterSpec {
    ParameterSpec::new("position", "vector", false).with_units("mm")
}

fn name_spec() -> ParameterSpec {
    ParameterSpec::new("name", "string", false)
}

/// Create a rectangular box
pub struct CreateBoxTool {
    cad: Arc<dyn CadGateway>,
    info: ToolInfo,
}

impl CreateBoxTool {
    pub fn new(cad: Arc<dyn CadGateway>) -> Self {
        Self {
            cad,
            info: ToolInfo::new("primitives.create_box", "Create Box", ToolCategory::Creation)
                .with_description("Create a rectangular box")
                .with_capability("geometry")
                .with_capability("primitive")
                .with_dependency(DEP_ACTIVE_DOCUMENT)
                .with_parameter(dimension_spec("length", 10.0))
                .with_parameter(dimension_spec("width", 10.0))
                .with_parameter(dimension_spec("height", 10.0))
                .with_parameter(position_spec())
                .with_parameter(name_spec()),
        }
    }
}

#[async_trait]
impl ToolHandler for CreateBoxTool {
    fn info(&self) -> &ToolInfo {
        &self.info
    }

    async fn invoke(&self, params: &ToolParams) -> ToolOutcome {
        let (Some(length), Some(width), Some(height)) = (
            number_param(&self.info, params, "length"),
            number_param(&self.info, params, "width"),
            number_param(&self.info, params, "height"),
        ) else {
            return ToolOutcome::failed("Box dimensions must be numbers");
        };
        self.cad
            .create_box(
                length,
                width,
                height,
                vec3_param(params, "position"),
                string_param(&self.info, params, "name"),
            )
            .await
    }
}

/// Create a cylinder
pub struct CreateCylinderTool {
    cad: Arc<dyn CadGateway>,
    info: ToolInfo,
}

impl CreateCylinderTool {
    pub fn new(cad: Arc<dyn CadGateway>) -> Self {
        Self {
            cad,
            info: ToolInfo::new(
                "primitives.create_cylinder",
                "Create Cylinder",
                ToolCategory::Creation,
            )
            .with_description("Create a cylinder")
            .with_capability("geometry")
            .with_capability("primitive")
            .with_dependency(DEP_ACTIVE_DOCUMENT)
            .with_parameter(dimension_spec("radius", 5.0))
            .with_parameter(dimension_spec("height", 10.0))
            .with_parameter(position_spec())
            .with_parameter(name_spec()),
        }
    }
}

#[async_trait]
impl ToolHandler for CreateCylinderTool {
    fn info(&self) -> &ToolInfo {
        &self.info
    }

    async fn invoke(&self, params: &ToolParams) -> ToolOutcome {
        let (Some(radius), Some(height)) = (
            number_param(&self.info, params, "radius"),
            number_param(&self.info, params, "height"),
        ) else {
            return ToolOutcome::failed("Cylinder dimensions must be numbers");
        };
        self.cad
            .create_cylinder(
                radius,
                height,
                vec3_param(params, "position"),
                string_param(&self.info, params, "name"),
            )
            .await
    }
}

/// Create a sphere
pub struct CreateSphereTool {
    cad: Arc<dyn CadGateway>,
    info: ToolInfo,
}

impl CreateSphereTool {
    pub fn new(cad: Arc<dyn CadGateway>) -> Self {
        Self {
            cad,
            info: ToolInfo::new(
                "primitives.create_sphere",
                "Create Sphere",
                ToolCategory::Creation,
            )
            .with_description("Create a sphere")
            .with_capability("geometry")
            .with_capability("primitive")
            .with_dependency(DEP_ACTIVE_DOCUMENT)
            .with_parameter(dimension_spec("radius", 5.0))
            .with_parameter(position_spec())
            .with_parameter(name_spec()),
        }
    }
}

#[async_trait]
impl ToolHandler for CreateSphereTool {
    fn info(&self) -> &ToolInfo {
        &self.info
    }

    async fn invoke(&self, params: &ToolParams) -> ToolOutcome {
        let Some(radius) = number_param(&self.info, params, "radius") else {
            return ToolOutcome::failed("Sphere radius must be a number");
        };
        self.cad
            .create_sphere(
                radius,
                vec3_param(params, "position"),
                string_param(&self.info, params, "name"),
            )
            .await
    }
}

/// Create a cone (or truncated cone)
pub struct CreateConeTool {
    cad: Arc<dyn CadGateway>,
    info: ToolInfo,
}

impl CreateConeTool {
    pub fn new(cad: Arc<dyn CadGateway>) -> Self {
        Self {
            cad,
            info: ToolInfo::new("primitives.create_cone", "Create Cone", ToolCategory::Creation)
                .with_description("Create a cone or truncated cone")
                .with_capability("geometry")
                .with_capability("primitive")
                .with_dependency(DEP_ACTIVE_DOCUMENT)
                .with_parameter(dimension_spec("radius", 5.0))
                .with_parameter(
                    ParameterSpec::new("radius2", "number", false)
                        .with_default(0.0)
                        .with_units("mm"),
                )
                .with_parameter(dimension_spec("height", 10.0))
                .with_parameter(position_spec())
                .with_parameter(name_spec()),
        }
    }
}

#[async_trait]
impl ToolHandler for CreateConeTool {
    fn info(&self) -> &ToolInfo {
        &self.info
    }

    async fn invoke(&self, params: &ToolParams) -> ToolOutcome {
        let (Some(radius1), Some(height)) = (
            number_param(&self.info, params, "radius"),
            number_param(&self.info, params, "height"),
        ) else {
            return ToolOutcome::failed("Cone dimensions must be numbers");
        };
        let radius2 = number_param(&self.info, params, "radius2").unwrap_or(0.0);
        self.cad
            .create_cone(
                radius1,
                radius2,
                height,
                vec3_param(params, "position"),
                string_param(&self.info, params, "name"),
            )
            .await
    }
}
