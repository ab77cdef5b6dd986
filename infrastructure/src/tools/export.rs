//! Export tools

use super::{registry::DEP_ACTIVE_DOCUMENT, string_list_param};
use async_trait::async_trait;
use cadmate_application::ports::cad_gateway::{CadGateway, ExportFormat};
use cadmate_domain::capability::entities::{ParameterSpec, ToolCategory, ToolInfo, ToolOutcome};
use cadmate_domain::capability::handler::{ToolHandler, ToolParams, string_param};
use std::sync::Arc;

/// Export objects to a mesh or CAD exchange file
pub struct ExportTool {
    cad: Arc<dyn CadGateway>,
    format: ExportFormat,
    info: ToolInfo,
}

impl ExportTool {
    pub fn new(cad: Arc<dyn CadGateway>, format: ExportFormat) -> Self {
        let (id, name, description, default_path) = match format {
            ExportFormat::Stl => (
                "export.stl",
                "Export STL",
                "Export objects to an STL mesh file",
                "output.stl",
            ),
            ExportFormat::Step => (
                "export.step",
                "Export STEP",
                "Export objects to a STEP file",
                "output.step",
            ),
        };
        Self {
            cad,
            format,
            info: ToolInfo::new(id, name, ToolCategory::Export)
                .with_description(description)
                .with_capability("export")
                .with_dependency(DEP_ACTIVE_DOCUMENT)
                .with_dependency("objects:1")
                .with_parameter(
                    ParameterSpec::new("path", "string", true).with_default(default_path),
                )
                .with_parameter(ParameterSpec::new("objects", "list", false)),
        }
    }
}

#[async_trait]
impl ToolHandler for ExportTool {
    fn info(&self) -> &ToolInfo {
        &self.info
    }

    async fn invoke(&self, params: &ToolParams) -> ToolOutcome {
        let Some(path) = string_param(&self.info, params, "path") else {
            return ToolOutcome::failed("Missing 'path' parameter");
        };
        let objects = string_list_param(params, "objects");
        self.cad.export(self.format, path, &objects).await
    }
}
