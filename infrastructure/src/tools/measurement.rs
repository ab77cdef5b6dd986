//! Measurement tools

use super::registry::DEP_ACTIVE_DOCUMENT;
use async_trait::async_trait;
use cadmate_application::ports::cad_gateway::CadGateway;
use cadmate_domain::capability::entities::{ParameterSpec, ToolCategory, ToolInfo, ToolOutcome};
use cadmate_domain::capability::handler::{ToolHandler, ToolParams, string_param};
use std::sync::Arc;

/// Distance between the positions of two objects
pub struct MeasureDistanceTool {
    cad: Arc<dyn CadGateway>,
    info: ToolInfo,
}

impl MeasureDistanceTool {
    pub fn new(cad: Arc<dyn CadGateway>) -> Self {
        Self {
            cad,
            info: ToolInfo::new(
                "measurement.distance",
                "Measure Distance",
                ToolCategory::Analysis,
            )
            .with_description("Measure the distance between two objects")
            .with_capability("measurement")
            .with_dependency(DEP_ACTIVE_DOCUMENT)
            .with_dependency("objects:2")
            .with_parameter(ParameterSpec::new("first", "string", true))
            .with_parameter(ParameterSpec::new("second", "string", true)),
        }
    }
}

#[async_trait]
impl ToolHandler for MeasureDistanceTool {
    fn info(&self) -> &ToolInfo {
        &self.info
    }

    async fn invoke(&self, params: &ToolParams) -> ToolOutcome {
        let (Some(first), Some(second)) = (
            string_param(&self.info, params, "first"),
            string_param(&self.info, params, "second"),
        ) else {
            return ToolOutcome::failed("Distance needs 'first' and 'second' object names");
        };
        self.cad.measure_distance(first, second).await
    }
}

/// Axis-aligned bounding box of an object
pub struct BoundingBoxTool {
    cad: Arc<dyn CadGateway>,
    info: ToolInfo,
}

impl BoundingBoxTool {
    pub fn new(cad: Arc<dyn CadGateway>) -> Self {
        Self {
            cad,
            info: ToolInfo::new(
                "measurement.bounding_box",
                "Bounding Box",
                ToolCategory::Analysis,
            )
            .with_description("Report the bounding box of an object")
            .with_capability("measurement")
            .with_dependency(DEP_ACTIVE_DOCUMENT)
            .with_dependency("objects:1")
            .with_parameter(ParameterSpec::new("object", "string", true)),
        }
    }
}

#[async_trait]
impl ToolHandler for BoundingBoxTool {
    fn info(&self) -> &ToolInfo {
        &self.info
    }

    async fn invoke(&self, params: &ToolParams) -> ToolOutcome {
        let Some(object) = string_param(&self.info, params, "object") else {
            return ToolOutcome::failed("Missing 'object' parameter");
        };
        self.cad.bounding_box(object).await
    }
}

/// Volume of an object
pub struct VolumeTool {
    cad: Arc<dyn CadGateway>,
    info: ToolInfo,
}

impl VolumeTool {
    pub fn new(cad: Arc<dyn CadGateway>) -> Self {
        Self {
            cad,
            info: ToolInfo::new("measurement.volume", "Measure Volume", ToolCategory::Analysis)
                .with_description("Report the volume of an object")
                .with_capability("measurement")
                .with_dependency(DEP_ACTIVE_DOCUMENT)
                .with_dependency("objects:1")
                .with_parameter(ParameterSpec::new("object", "string", true)),
        }
    }
}

#[async_trait]
impl ToolHandler for VolumeTool {
    fn info(&self) -> &ToolInfo {
        &self.info
    }

    async fn invoke(&self, params: &ToolParams) -> ToolOutcome {
        let Some(object) = string_param(&self.info, params, "object") else {
            return ToolOutcome::failed("Missing 'object' parameter");
        };
        self.cad.volume(object).await
    }
}
