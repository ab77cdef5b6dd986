//! Built-in tool handlers and the runtime registry

pub mod catalog;
pub mod export;
pub mod measurement;
pub mod operations;
pub mod primitives;
pub mod registry;

pub use catalog::{build_capability_catalog, build_selector, register_builtin_tools};
pub use registry::{DEP_ACTIVE_DOCUMENT, DEP_OBJECTS_PREFIX, DEP_SELECTION, ToolRegistry};

use cadmate_domain::capability::handler::ToolParams;

/// Read a `[x, y, z]` vector parameter from a JSON array.
pub(crate) fn vec3_param(params: &ToolParams, name: &str) -> Option<[f64; 3]> {
    let array = params.get(name)?.as_array()?;
    if array.len() != 3 {
        return None;
    }
    let mut vector = [0.0; 3];
    for (slot, value) in vector.iter_mut().zip(array) {
        *slot = value.as_f64()?;
    }
    Some(vector)
}

/// Read a list of strings, ignoring non-string entries.
pub(crate) fn string_list_param(params: &ToolParams, name: &str) -> Vec<String> {
    params
        .get(name)
        .and_then(|value| value.as_array())
        .map(|array| {
            array
                .iter()
                .filter_map(|value| value.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_param() {
        let mut params = ToolParams::new();
        params.insert("position".to_string(), serde_json::json!([1.0, 2.0, 3.0]));
        assert_eq!(vec3_param(&params, "position"), Some([1.0, 2.0, 3.0]));

        params.insert("short".to_string(), serde_json::json!([1.0]));
        assert_eq!(vec3_param(&params, "short"), None);
        assert_eq!(vec3_param(&params, "missing"), None);
    }

    #[test]
    fn test_string_list_param_skips_non_strings() {
        let mut params = ToolParams::new();
        params.insert("objects".to_string(), serde_json::json!(["a", 1, "b"]));
        assert_eq!(string_list_param(&params, "objects"), vec!["a", "b"]);
        assert!(string_list_param(&params, "missing").is_empty());
    }
}
