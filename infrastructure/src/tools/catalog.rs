//! Built-in tool catalog
//!
//! One place wires the three faces of every built-in tool together: the
//! capability descriptor (matching and instruction generation), the
//! selector seeding (pattern rules and semantic embeddings), and the
//! runtime handler registration.

use super::export::ExportTool;
use super::measurement::{BoundingBoxTool, MeasureDistanceTool, VolumeTool};
use super::operations::{BooleanTool, MoveObjectTool, RotateObjectTool};
use super::primitives::{CreateBoxTool, CreateConeTool, CreateCylinderTool, CreateSphereTool};
use super::registry::ToolRegistry;
use cadmate_application::ports::cad_gateway::{BooleanKind, CadGateway, ExportFormat};
use cadmate_domain::capability::entities::{
    ParameterSpec, Requirement, ToolCapability, ToolCategory, UsageExample,
};
use cadmate_domain::capability::registry::CapabilityRegistry;
use cadmate_domain::core::error::DomainError;
use cadmate_domain::matching::selector::ToolSelector;
use cadmate_domain::matching::semantic::SemanticMatcher;
use std::sync::Arc;
use tracing::info;

fn dimension(name: &str, default: f64) -> ParameterSpec {
    ParameterSpec::new(name, "number", true)
        .with_default(default)
        .with_units("mm")
        .with_constraint("must be positive")
}

/// Build the static capability catalog for every built-in tool.
pub fn build_capability_catalog() -> Result<CapabilityRegistry, DomainError> {
    let mut registry = CapabilityRegistry::new();

    registry.register(
        ToolCapability::new(
            "primitives.create_box",
            ToolCategory::Creation,
            "Create a rectangular box",
        )
        .with_detailed_description(
            "Create a rectangular box with the given length, width and height, \
             optionally placed at a position",
        )
        .with_parameter(dimension("length", 10.0))
        .with_parameter(dimension("width", 10.0))
        .with_parameter(dimension("height", 10.0))
        .with_parameter(ParameterSpec::new("position", "vector", false).with_units("mm"))
        .with_requirement(Requirement::active_document())
        .with_keywords(["box", "cube", "block", "rectangular", "create"])
        .with_example(
            UsageExample::new(
                "create a box 50mm long, 30mm wide, and 20mm high",
                "A 50x30x20 mm box",
            )
            .with_parameter("length", 50.0)
            .with_parameter("width", 30.0)
            .with_parameter("height", 20.0),
        )
        .with_related_tool("operations.boolean_union")
        .produces_tag("solid"),
    )?;

    registry.register(
        ToolCapability::new(
            "primitives.create_cylinder",
            ToolCategory::Creation,
            "Create a cylinder",
        )
        .with_detailed_description("Create a cylinder with the given radius and height")
        .with_parameter(dimension("radius", 5.0))
        .with_parameter(dimension("height", 10.0))
        .with_requirement(Requirement::active_document())
        .with_keywords(["cylinder", "tube", "rod", "round", "create"])
        .with_example(
            UsageExample::new("make a cylinder with radius 5mm and height 20mm", "A 5x20 mm cylinder")
                .with_parameter("radius", 5.0)
                .with_parameter("height", 20.0),
        )
        .produces_tag("solid"),
    )?;

    registry.register(
        ToolCapability::new(
            "primitives.create_sphere",
            ToolCategory::Creation,
            "Create a sphere",
        )
        .with_detailed_description("Create a sphere with the given radius")
        .with_parameter(dimension("radius", 5.0))
        .with_requirement(Requirement::active_document())
        .with_keywords(["sphere", "ball", "orb", "round", "create"])
        .with_example(
            UsageExample::new("create a sphere with radius 25mm", "A 25 mm sphere")
                .with_parameter("radius", 25.0),
        )
        .produces_tag("solid"),
    )?;

    registry.register(
        ToolCapability::new(
            "primitives.create_cone",
            ToolCategory::Creation,
            "Create a cone",
        )
        .with_detailed_description(
            "Create a cone or truncated cone with base radius, top radius and height",
        )
        .with_parameter(dimension("radius", 5.0))
        .with_parameter(
            ParameterSpec::new("radius2", "number", false)
                .with_default(0.0)
                .with_units("mm"),
        )
        .with_parameter(dimension("height", 10.0))
        .with_requirement(Requirement::active_document())
        .with_keywords(["cone", "funnel", "taper", "create"])
        .with_example(
            UsageExample::new("add a cone 10mm radius and 30mm tall", "A 10x30 mm cone")
                .with_parameter("radius", 10.0)
                .with_parameter("height", 30.0),
        )
        .produces_tag("solid"),
    )?;

    registry.register(
        ToolCapability::new(
            "operations.move_object",
            ToolCategory::Modification,
            "Move an object by an offset",
        )
        .with_detailed_description("Translate an object by an offset along the x, y and z axes")
        .with_parameter(ParameterSpec::new("object", "string", true))
        .with_parameter(ParameterSpec::new("x", "number", false).with_default(0.0).with_units("mm"))
        .with_parameter(ParameterSpec::new("y", "number", false).with_default(0.0).with_units("mm"))
        .with_parameter(ParameterSpec::new("z", "number", false).with_default(0.0).with_units("mm"))
        .with_requirement(Requirement::active_document())
        .with_requirement(Requirement::minimum_objects(1))
        .with_keywords(["move", "translate", "shift", "position", "object"])
        .with_example(
            UsageExample::new("move box001 5mm along x", "box001 shifted by 5 mm on x")
                .with_parameter("object", "box001")
                .with_parameter("x", 5.0),
        )
        .modifies_tag("placement"),
    )?;

    registry.register(
        ToolCapability::new(
            "operations.rotate_object",
            ToolCategory::Modification,
            "Rotate an object around an axis",
        )
        .with_detailed_description(
            "Rotate an object around the x, y or z axis by an angle given in degrees",
        )
        .with_parameter(ParameterSpec::new("object", "string", true))
        .with_parameter(ParameterSpec::new("angle", "number", true).with_units("rad"))
        .with_parameter(ParameterSpec::new("axis", "vector", false))
        .with_requirement(Requirement::active_document())
        .with_requirement(Requirement::minimum_objects(1))
        .with_keywords(["rotate", "turn", "spin", "angle", "object"])
        .with_example(
            UsageExample::new("rotate box001 90 degrees around z", "box001 rotated a quarter turn")
                .with_parameter("object", "box001")
                .with_parameter("angle", std::f64::consts::FRAC_PI_2),
        )
        .modifies_tag("placement"),
    )?;

    registry.register(
        ToolCapability::new(
            "operations.boolean_union",
            ToolCategory::Boolean,
            "Fuse objects into one",
        )
        .with_detailed_description("Fuse two or more objects into a single solid")
        .with_parameter(ParameterSpec::new("objects", "list", true))
        .with_requirement(Requirement::active_document())
        .with_requirement(Requirement::minimum_objects(2))
        .with_keywords(["union", "fuse", "merge", "combine", "join"])
        .with_example(UsageExample::new(
            "fuse box001 and cylinder001",
            "One solid combining both shapes",
        ))
        .with_related_tool("operations.boolean_cut")
        .produces_tag("solid"),
    )?;

    registry.register(
        ToolCapability::new(
            "operations.boolean_cut",
            ToolCategory::Boolean,
            "Subtract objects from a base object",
        )
        .with_detailed_description(
            "Subtract one or more objects from the first object in the list",
        )
        .with_parameter(ParameterSpec::new("objects", "list", true))
        .with_requirement(Requirement::active_document())
        .with_requirement(Requirement::minimum_objects(2))
        .with_keywords(["cut", "subtract", "difference", "remove", "hole"])
        .with_example(UsageExample::new(
            "cut cylinder001 from box001",
            "box001 with a cylindrical hole",
        ))
        .with_related_tool("operations.boolean_union")
        .produces_tag("solid"),
    )?;

    registry.register(
        ToolCapability::new(
            "operations.boolean_intersection",
            ToolCategory::Boolean,
            "Keep the common volume of objects",
        )
        .with_detailed_description("Keep only the volume shared by all of the given objects")
        .with_parameter(ParameterSpec::new("objects", "list", true))
        .with_requirement(Requirement::active_document())
        .with_requirement(Requirement::minimum_objects(2))
        .with_keywords(["intersect", "intersection", "common", "overlap"])
        .with_example(UsageExample::new(
            "intersect box001 and sphere001",
            "The overlapping volume",
        ))
        .produces_tag("solid"),
    )?;

    registry.register(
        ToolCapability::new(
            "measurement.distance",
            ToolCategory::Analysis,
            "Measure the distance between two objects",
        )
        .with_detailed_description("Measure the straight-line distance between two objects")
        .with_parameter(ParameterSpec::new("first", "string", true))
        .with_parameter(ParameterSpec::new("second", "string", true))
        .with_requirement(Requirement::active_document())
        .with_requirement(Requirement::minimum_objects(2))
        .with_keywords(["measure", "distance", "gap", "between"])
        .with_example(UsageExample::new(
            "measure the distance between box001 and box002",
            "Distance in millimetres",
        )),
    )?;

    registry.register(
        ToolCapability::new(
            "measurement.bounding_box",
            ToolCategory::Analysis,
            "Report the bounding box of an object",
        )
        .with_detailed_description("Report the axis-aligned bounding box of an object")
        .with_parameter(ParameterSpec::new("object", "string", true))
        .with_requirement(Requirement::active_document())
        .with_requirement(Requirement::minimum_objects(1))
        .with_keywords(["bounding", "extent", "size", "dimensions", "measure"])
        .with_example(UsageExample::new(
            "what is the bounding box of box001",
            "Extent in millimetres",
        )),
    )?;

    registry.register(
        ToolCapability::new(
            "measurement.volume",
            ToolCategory::Analysis,
            "Report the volume of an object",
        )
        .with_detailed_description("Report the volume of an object in cubic millimetres")
        .with_parameter(ParameterSpec::new("object", "string", true))
        .with_requirement(Requirement::active_document())
        .with_requirement(Requirement::minimum_objects(1))
        .with_keywords(["volume", "capacity", "measure"])
        .with_example(UsageExample::new(
            "calculate the volume of box001",
            "Volume in cubic millimetres",
        )),
    )?;

    registry.register(
        ToolCapability::new("export.stl", ToolCategory::Export, "Export objects to STL")
            .with_detailed_description("Export objects to an STL mesh file at the given path")
            .with_parameter(ParameterSpec::new("path", "string", true).with_default("output.stl"))
            .with_parameter(ParameterSpec::new("objects", "list", false))
            .with_requirement(Requirement::active_document())
            .with_requirement(Requirement::minimum_objects(1))
            .with_keywords(["export", "stl", "mesh", "save", "print"])
            .with_example(UsageExample::new(
                "export the model to part.stl",
                "An STL file at part.stl",
            )),
    )?;

    registry.register(
        ToolCapability::new("export.step", ToolCategory::Export, "Export objects to STEP")
            .with_detailed_description("Export objects to a STEP exchange file at the given path")
            .with_parameter(ParameterSpec::new("path", "string", true).with_default("output.step"))
            .with_parameter(ParameterSpec::new("objects", "list", false))
            .with_requirement(Requirement::active_document())
            .with_requirement(Requirement::minimum_objects(1))
            .with_keywords(["export", "step", "exchange", "save"])
            .with_example(UsageExample::new(
                "save the assembly as housing.step",
                "A STEP file at housing.step",
            )),
    )?;

    Ok(registry)
}

/// Build a tool selector seeded from the capability catalog.
///
/// The semantic matcher embeds every capability's description, keywords
/// and example inputs; pattern rules cover the common phrasings.
pub fn build_selector(catalog: &CapabilityRegistry) -> Result<ToolSelector, DomainError> {
    let mut matcher = SemanticMatcher::new();
    for capability in catalog.all() {
        let examples: Vec<String> = capability
            .examples
            .iter()
            .map(|example| example.input_text.clone())
            .collect();
        matcher.add_tool_embedding(
            &capability.tool_id,
            &capability.detailed_description,
            &capability.keywords,
            &examples,
        );
    }
    matcher.finalize_embeddings();

    let mut selector = ToolSelector::new(matcher);
    selector.add_rule(
        "primitives.create_box",
        &[r"(?:create|make|build|add)\b.*\b(?:box|cube|block)"],
        &["box", "cube"],
    )?;
    selector.add_rule(
        "primitives.create_cylinder",
        &[r"(?:create|make|build|add)\b.*\b(?:cylinder|tube|rod)"],
        &["cylinder"],
    )?;
    selector.add_rule(
        "primitives.create_sphere",
        &[r"(?:create|make|build|add)\b.*\b(?:sphere|ball|orb)"],
        &["sphere", "ball"],
    )?;
    selector.add_rule(
        "primitives.create_cone",
        &[r"(?:create|make|build|add)\b.*\b(?:cone|funnel)"],
        &["cone"],
    )?;
    selector.add_rule(
        "operations.move_object",
        &[r"(?:move|translate|shift)\s"],
        &["move", "translate"],
    )?;
    selector.add_rule(
        "operations.rotate_object",
        &[r"(?:rotate|turn|spin)\s"],
        &["rotate"],
    )?;
    selector.add_rule(
        "operations.boolean_union",
        &[r"(?:union|fuse|merge|combine|join)\b"],
        &["union", "fuse"],
    )?;
    selector.add_rule(
        "operations.boolean_cut",
        &[r"(?:cut|subtract)\b.*\bfrom\b", r"\bdifference\b"],
        &["cut", "subtract"],
    )?;
    selector.add_rule(
        "operations.boolean_intersection",
        &[r"(?:intersect|intersection|overlap)"],
        &["intersect"],
    )?;
    selector.add_rule(
        "measurement.distance",
        &[r"distance\s+between", r"(?:measure|check)\b.*\b(?:distance|gap)"],
        &["distance"],
    )?;
    selector.add_rule(
        "measurement.bounding_box",
        &[r"bounding\s*box", r"(?:extent|size)\s+of"],
        &["bounding"],
    )?;
    selector.add_rule(
        "measurement.volume",
        &[r"volume\s+of", r"(?:measure|compute|calculate)\b.*\bvolume"],
        &["volume"],
    )?;
    selector.add_rule(
        "export.stl",
        &[r"(?:export|save|write)\b.*\bstl\b", r"\.stl\b"],
        &["stl"],
    )?;
    selector.add_rule(
        "export.step",
        &[r"(?:export|save|write)\b.*\bstep\b", r"\.(?:step|stp)\b"],
        &["step"],
    )?;
    Ok(selector)
}

/// Register every built-in handler against the runtime registry.
///
/// Returns the number of tools registered.
pub fn register_builtin_tools(registry: &mut ToolRegistry, cad: Arc<dyn CadGateway>) -> usize {
    let handlers: Vec<Arc<dyn cadmate_domain::capability::handler::ToolHandler>> = vec![
        Arc::new(CreateBoxTool::new(Arc::clone(&cad))),
        Arc::new(CreateCylinderTool::new(Arc::clone(&cad))),
        Arc::new(CreateSphereTool::new(Arc::clone(&cad))),
        Arc::new(CreateConeTool::new(Arc::clone(&cad))),
        Arc::new(MoveObjectTool::new(Arc::clone(&cad))),
        Arc::new(RotateObjectTool::new(Arc::clone(&cad))),
        Arc::new(BooleanTool::new(Arc::clone(&cad), BooleanKind::Union)),
        Arc::new(BooleanTool::new(Arc::clone(&cad), BooleanKind::Cut)),
        Arc::new(BooleanTool::new(Arc::clone(&cad), BooleanKind::Intersection)),
        Arc::new(MeasureDistanceTool::new(Arc::clone(&cad))),
        Arc::new(BoundingBoxTool::new(Arc::clone(&cad))),
        Arc::new(VolumeTool::new(Arc::clone(&cad))),
        Arc::new(ExportTool::new(Arc::clone(&cad), ExportFormat::Stl)),
        Arc::new(ExportTool::new(cad, ExportFormat::Step)),
    ];

    let mut registered = 0;
    for handler in handlers {
        if registry.register_tool(handler) {
            registered += 1;
        }
    }
    info!(count = registered, "built-in tools registered");
    registered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cad::memory::MemoryCad;
    use cadmate_application::ports::ToolExecutorPort;
    use cadmate_domain::context::entities::WorkspaceContext;

    #[test]
    fn test_catalog_and_registry_cover_the_same_tools() {
        let catalog = build_capability_catalog().unwrap();
        let mut registry = ToolRegistry::new(None);
        let cad: Arc<dyn CadGateway> = Arc::new(MemoryCad::new("Test"));
        let registered = register_builtin_tools(&mut registry, cad);

        assert_eq!(catalog.len(), registered);
        for tool_id in catalog.ids() {
            assert!(registry.has_tool(tool_id), "missing handler for {}", tool_id);
        }
    }

    #[test]
    fn test_selector_ranks_box_instruction_first() {
        let catalog = build_capability_catalog().unwrap();
        let selector = build_selector(&catalog).unwrap();
        let matches = selector.select_tool(
            "create a box 50mm long, 30mm wide, and 20mm high",
            &catalog,
            &WorkspaceContext::default(),
        );
        assert_eq!(matches[0].tool_id, "primitives.create_box");
        assert!(matches[0].confidence >= 0.8);
    }

    #[test]
    fn test_selector_finds_export() {
        let catalog = build_capability_catalog().unwrap();
        let selector = build_selector(&catalog).unwrap();
        let matches = selector.select_tool(
            "export the model to part.stl",
            &catalog,
            &WorkspaceContext::default(),
        );
        assert_eq!(matches[0].tool_id, "export.stl");
        assert_eq!(
            matches[0].parameters.get("path").and_then(|v| v.as_str()),
            Some("part.stl")
        );
    }

    #[test]
    fn test_selection_is_deterministic() {
        let catalog = build_capability_catalog().unwrap();
        let selector = build_selector(&catalog).unwrap();
        let context = WorkspaceContext::default();

        let first = selector.select_tool("rotate box001 90 degrees", &catalog, &context);
        let second = selector.select_tool("rotate box001 90 degrees", &catalog, &context);
        let ids = |matches: &[cadmate_domain::matching::selector::ToolMatch]| {
            matches.iter().map(|m| m.tool_id.clone()).collect::<Vec<_>>()
        };
        assert_eq!(ids(&first), ids(&second));
        assert_eq!(first[0].tool_id, "operations.rotate_object");
    }
}
