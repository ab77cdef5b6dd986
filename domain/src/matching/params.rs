//! Parameter extraction
//!
//! Regex-driven extraction of dimensions, positions, angles, axes, colors,
//! and object names from free-text instructions, with per-tool shaping
//! (e.g., a spoken diameter becomes the radius parameter of radius tools).
//!
//! Lengths normalize to millimetres, angles to radians.

use crate::capability::handler::ToolParams;
use regex::Regex;
use std::sync::LazyLock;

static POSITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"at\s*\(?\s*(-?\d+(?:\.\d+)?)\s*,\s*(-?\d+(?:\.\d+)?)\s*,\s*(-?\d+(?:\.\d+)?)\s*\)?")
        .expect("position regex is valid")
});

static AXIS_OFFSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(-?\d+(?:\.\d+)?)\s*(mm|cm|m)?\s*(?:along|in|on)\s+(?:the\s+)?([xyz])\b")
        .expect("axis offset regex is valid")
});

static ROTATION_AXIS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:around|about)\s+(?:the\s+)?([xyz])(?:\s*-?\s*axis)?")
        .expect("rotation axis regex is valid")
});

static DEGREES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(-?\d+(?:\.\d+)?)\s*(?:°|deg(?:ree)?s?)\b").expect("degrees regex is valid")
});

static RADIANS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(-?\d+(?:\.\d+)?)\s*rad(?:ian)?s?\b").expect("radians regex is valid")
});

static PERCENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*%").expect("percent regex is valid"));

static HEX_COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#[0-9a-fA-F]{6}\b").expect("hex color regex is valid"));

static OBJECT_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Za-z][A-Za-z_]*\d{2,})\b").expect("object name regex is valid")
});

static EXPORT_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:to|as|into)\s+(\S+\.(?:stl|step|stp|obj|iges))\b")
        .expect("export path regex is valid")
});

const NAMED_COLORS: &[&str] = &[
    "red", "green", "blue", "yellow", "orange", "purple", "black", "white", "gray", "grey",
    "cyan", "magenta", "brown", "pink",
];

/// Extract parameters for a specific tool from free text.
pub fn extract_parameters(text: &str, tool_id: &str) -> ToolParams {
    let lowered = text.to_lowercase();
    let mut params = ToolParams::new();

    let method = tool_id.split('.').next_back().unwrap_or(tool_id);
    match method {
        "create_box" => {
            extract_dimension(&lowered, "length", &["long", "length"], &mut params);
            extract_dimension(&lowered, "width", &["wide", "width"], &mut params);
            extract_dimension(&lowered, "height", &["high", "tall", "height"], &mut params);
            extract_position(&lowered, &mut params);
        }
        "create_cylinder" | "create_cone" => {
            extract_radius(&lowered, &mut params);
            extract_dimension(&lowered, "height", &["high", "tall", "height", "long"], &mut params);
            extract_position(&lowered, &mut params);
        }
        "create_sphere" => {
            extract_radius(&lowered, &mut params);
            extract_position(&lowered, &mut params);
        }
        "move_object" => {
            extract_translation(&lowered, &mut params);
            extract_object_name(text, &mut params);
        }
        "rotate_object" => {
            extract_angle(&lowered, &mut params);
            extract_rotation_axis(&lowered, &mut params);
            extract_object_name(text, &mut params);
        }
        "boolean_union" | "boolean_cut" | "boolean_intersection" => {
            extract_object_list(text, &mut params);
        }
        "stl" | "step" => {
            extract_export_path(&lowered, &mut params);
        }
        _ => {
            // Unknown tool: collect everything recognizable
            extract_dimension(&lowered, "length", &["long", "length"], &mut params);
            extract_dimension(&lowered, "width", &["wide", "width"], &mut params);
            extract_dimension(&lowered, "height", &["high", "tall", "height"], &mut params);
            extract_radius(&lowered, &mut params);
            extract_position(&lowered, &mut params);
            extract_angle(&lowered, &mut params);
            extract_object_name(text, &mut params);
        }
    }

    extract_color(&lowered, &mut params);
    extract_percent(&lowered, &mut params);

    params
}

/// Millimetre conversion factor for a captured unit suffix.
fn unit_factor(unit: Option<&str>) -> f64 {
    match unit {
        Some("cm") => 10.0,
        Some("m") => 1000.0,
        _ => 1.0,
    }
}

/// One named dimension: matches both "50mm long" and "length of 50mm".
fn extract_dimension(text: &str, param: &str, keywords: &[&str], params: &mut ToolParams) {
    let alternatives = keywords.join("|");
    let value_first = format!(
        r"(\d+(?:\.\d+)?)\s*(mm|cm|m)?\s*(?:{})\b",
        alternatives
    );
    let keyword_first = format!(
        r"(?:{})\s*(?:of|=|:)?\s*(\d+(?:\.\d+)?)\s*(mm|cm|m)?\b",
        alternatives
    );

    for pattern in [value_first, keyword_first] {
        // Patterns are built from fixed keyword tables; compilation cannot fail
        let regex = Regex::new(&pattern).expect("dimension regex is valid");
        if let Some(captures) = regex.captures(text) {
            let value: f64 = captures[1].parse().unwrap_or(0.0);
            let unit = captures.get(2).map(|m| m.as_str());
            params.insert(param.to_string(), (value * unit_factor(unit)).into());
            return;
        }
    }
}

/// Radius, with diameter halved when only a diameter is spoken.
fn extract_radius(text: &str, params: &mut ToolParams) {
    let mut radius = ToolParams::new();
    extract_dimension(text, "radius", &["radius"], &mut radius);
    if let Some(value) = radius.remove("radius") {
        params.insert("radius".to_string(), value);
        return;
    }

    let mut diameter = ToolParams::new();
    extract_dimension(text, "diameter", &["diameter"], &mut diameter);
    if let Some(value) = diameter.get("diameter").and_then(|v| v.as_f64()) {
        params.insert("radius".to_string(), (value / 2.0).into());
    }
}

fn extract_position(text: &str, params: &mut ToolParams) {
    if let Some(captures) = POSITION_RE.captures(text) {
        let coords: Vec<f64> = (1..=3)
            .map(|index| captures[index].parse().unwrap_or(0.0))
            .collect();
        params.insert("position".to_string(), serde_json::json!(coords));
    }
}

/// Translation vector from "5mm along x" style phrases or a position triple.
fn extract_translation(text: &str, params: &mut ToolParams) {
    let mut vector = [0.0f64; 3];
    let mut found = false;

    for captures in AXIS_OFFSET_RE.captures_iter(text) {
        let value: f64 = captures[1].parse().unwrap_or(0.0);
        let value = value * unit_factor(captures.get(2).map(|m| m.as_str()));
        let index = match &captures[3] {
            "x" => 0,
            "y" => 1,
            _ => 2,
        };
        vector[index] = value;
        found = true;
    }

    if !found && let Some(captures) = POSITION_RE.captures(text) {
        for (index, slot) in vector.iter_mut().enumerate() {
            *slot = captures[index + 1].parse().unwrap_or(0.0);
        }
        found = true;
    }

    if found {
        params.insert("x".to_string(), vector[0].into());
        params.insert("y".to_string(), vector[1].into());
        params.insert("z".to_string(), vector[2].into());
    }
}

/// Angle in radians from degree or radian phrasing.
fn extract_angle(text: &str, params: &mut ToolParams) {
    if let Some(captures) = DEGREES_RE.captures(text) {
        let degrees: f64 = captures[1].parse().unwrap_or(0.0);
        params.insert("angle".to_string(), degrees.to_radians().into());
    } else if let Some(captures) = RADIANS_RE.captures(text) {
        let radians: f64 = captures[1].parse().unwrap_or(0.0);
        params.insert("angle".to_string(), radians.into());
    }
}

/// Rotation axis as a unit vector; defaults to z when an angle was found
/// but no axis was named.
fn extract_rotation_axis(text: &str, params: &mut ToolParams) {
    let axis = ROTATION_AXIS_RE
        .captures(text)
        .map(|captures| captures[1].to_string());
    let vector = match axis.as_deref() {
        Some("x") => [1.0, 0.0, 0.0],
        Some("y") => [0.0, 1.0, 0.0],
        Some("z") => [0.0, 0.0, 1.0],
        None if params.contains_key("angle") => [0.0, 0.0, 1.0],
        None => return,
        // ROTATION_AXIS_RE only captures [xyz]; unreachable in practice.
        Some(_) => return,
    };
    params.insert("axis".to_string(), serde_json::json!(vector));
}

fn extract_object_name(text: &str, params: &mut ToolParams) {
    if let Some(captures) = OBJECT_NAME_RE.captures(text) {
        params.insert("object".to_string(), captures[1].to_string().into());
    }
}

fn extract_object_list(text: &str, params: &mut ToolParams) {
    let names: Vec<String> = OBJECT_NAME_RE
        .captures_iter(text)
        .map(|captures| captures[1].to_string())
        .collect();
    if !names.is_empty() {
        params.insert("objects".to_string(), serde_json::json!(names));
    }
}

fn extract_export_path(text: &str, params: &mut ToolParams) {
    if let Some(captures) = EXPORT_PATH_RE.captures(text) {
        params.insert("path".to_string(), captures[1].to_string().into());
    }
}

fn extract_color(text: &str, params: &mut ToolParams) {
    if let Some(m) = HEX_COLOR_RE.find(text) {
        params.insert("color".to_string(), m.as_str().to_string().into());
        return;
    }
    for color in NAMED_COLORS {
        let pattern = format!(r"\b{}\b", color);
        let regex = Regex::new(&pattern).expect("color regex is valid");
        if regex.is_match(text) {
            params.insert("color".to_string(), (*color).to_string().into());
            return;
        }
    }
}

fn extract_percent(text: &str, params: &mut ToolParams) {
    if let Some(captures) = PERCENT_RE.captures(text) {
        let value: f64 = captures[1].parse().unwrap_or(0.0);
        params.insert("percent".to_string(), value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(params: &ToolParams, key: &str) -> f64 {
        params.get(key).and_then(|v| v.as_f64()).unwrap()
    }

    #[test]
    fn test_box_dimensions() {
        let params = extract_parameters(
            "create a box 50mm long, 30mm wide, and 20mm high",
            "primitives.create_box",
        );

        assert_eq!(params.len(), 3);
        assert!((number(&params, "length") - 50.0).abs() < 1e-9);
        assert!((number(&params, "width") - 30.0).abs() < 1e-9);
        assert!((number(&params, "height") - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_keyword_first_dimensions() {
        let params = extract_parameters(
            "make a box with length 100 and width of 40mm",
            "primitives.create_box",
        );
        assert!((number(&params, "length") - 100.0).abs() < 1e-9);
        assert!((number(&params, "width") - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_unit_conversion() {
        let params = extract_parameters("create a box 5cm long", "primitives.create_box");
        assert!((number(&params, "length") - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_sphere_radius() {
        let params =
            extract_parameters("create a sphere with 25mm radius", "primitives.create_sphere");
        assert!((number(&params, "radius") - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_diameter_halved_for_radius_tools() {
        let params = extract_parameters(
            "create a cylinder with diameter 40mm and height 80mm",
            "primitives.create_cylinder",
        );
        assert!((number(&params, "radius") - 20.0).abs() < 1e-9);
        assert!((number(&params, "height") - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_move_along_axis() {
        let params = extract_parameters("move box001 5mm along x", "operations.move_object");
        assert!((number(&params, "x") - 5.0).abs() < 1e-9);
        assert!((number(&params, "y")).abs() < 1e-9);
        assert!((number(&params, "z")).abs() < 1e-9);
        assert_eq!(params.get("object").and_then(|v| v.as_str()), Some("box001"));
    }

    #[test]
    fn test_position_triple() {
        let params =
            extract_parameters("create a box at (10, -5, 2.5)", "primitives.create_box");
        assert_eq!(params["position"], serde_json::json!([10.0, -5.0, 2.5]));
    }

    #[test]
    fn test_rotation_degrees_to_radians() {
        let params = extract_parameters(
            "rotate Box001 by 90 degrees around the z axis",
            "operations.rotate_object",
        );
        assert!((number(&params, "angle") - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
        assert_eq!(params["axis"], serde_json::json!([0.0, 0.0, 1.0]));
        assert_eq!(params.get("object").and_then(|v| v.as_str()), Some("Box001"));
    }

    #[test]
    fn test_boolean_object_list() {
        let params = extract_parameters(
            "fuse Box001 and Cylinder001 together",
            "operations.boolean_union",
        );
        assert_eq!(params["objects"], serde_json::json!(["Box001", "Cylinder001"]));
    }

    #[test]
    fn test_export_path() {
        let params = extract_parameters("export the model to part.stl", "export.stl");
        assert_eq!(params.get("path").and_then(|v| v.as_str()), Some("part.stl"));
    }

    #[test]
    fn test_color_and_percent() {
        let params = extract_parameters("make it red at 50% opacity", "misc.unknown");
        assert_eq!(params.get("color").and_then(|v| v.as_str()), Some("red"));
        assert!((number(&params, "percent") - 50.0).abs() < 1e-9);
    }
}
