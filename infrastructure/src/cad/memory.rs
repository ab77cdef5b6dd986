//! In-memory CAD workspace
//!
//! A self-contained [`CadGateway`] implementation used for standalone runs
//! and tests. Geometry is analytic (volumes and bounding boxes computed
//! from shape parameters), undo is snapshot-based, and export writes
//! minimal ASCII STL / STEP stubs.

use async_trait::async_trait;
use cadmate_application::ports::cad_gateway::{BooleanKind, CadError, CadGateway, ExportFormat};
use cadmate_domain::capability::entities::ToolOutcome;
use cadmate_domain::context::entities::{DocumentInfo, ObjectRef, SketchConstraints, ViewSection};
use std::collections::HashMap;
use std::f64::consts::PI;
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

/// Analytic shape of a stored object
#[derive(Debug, Clone)]
enum Shape {
    Box { length: f64, width: f64, height: f64 },
    Cylinder { radius: f64, height: f64 },
    Sphere { radius: f64 },
    Cone { radius1: f64, radius2: f64, height: f64 },
    /// Result of a boolean operation; volume precomputed
    Compound { volume: f64, extent: [f64; 3] },
}

impl Shape {
    fn type_name(&self) -> &'static str {
        match self {
            Shape::Box { .. } => "Part::Box",
            Shape::Cylinder { .. } => "Part::Cylinder",
            Shape::Sphere { .. } => "Part::Sphere",
            Shape::Cone { .. } => "Part::Cone",
            Shape::Compound { .. } => "Part::Compound",
        }
    }

    fn volume(&self) -> f64 {
        match self {
            Shape::Box {
                length,
                width,
                height,
            } => length * width * height,
            Shape::Cylinder { radius, height } => PI * radius * radius * height,
            Shape::Sphere { radius } => 4.0 / 3.0 * PI * radius.powi(3),
            Shape::Cone {
                radius1,
                radius2,
                height,
            } => PI * height / 3.0 * (radius1 * radius1 + radius1 * radius2 + radius2 * radius2),
            Shape::Compound { volume, .. } => *volume,
        }
    }

    /// Axis-aligned extent of the shape around its position
    fn extent(&self) -> [f64; 3] {
        match self {
            Shape::Box {
                length,
                width,
                height,
            } => [*length, *width, *height],
            Shape::Cylinder { radius, height } => [2.0 * radius, 2.0 * radius, *height],
            Shape::Sphere { radius } => [2.0 * radius; 3],
            Shape::Cone {
                radius1,
                radius2,
                height,
            } => {
                let diameter = 2.0 * radius1.max(*radius2);
                [diameter, diameter, *height]
            }
            Shape::Compound { extent, .. } => *extent,
        }
    }
}

#[derive(Debug, Clone)]
struct MemoryObject {
    name: String,
    shape: Shape,
    position: [f64; 3],
}

impl MemoryObject {
    fn as_ref(&self) -> ObjectRef {
        ObjectRef::new(&self.name, self.shape.type_name())
    }
}

/// Snapshot-able document state
#[derive(Debug, Clone, Default)]
struct DocState {
    objects: Vec<MemoryObject>,
    selection: Vec<String>,
    counters: HashMap<String, u32>,
    modified: bool,
}

impl DocState {
    fn next_name(&mut self, prefix: &str) -> String {
        let counter = self.counters.entry(prefix.to_string()).or_insert(0);
        *counter += 1;
        format!("{}{:03}", prefix, counter)
    }

    fn find(&self, name: &str) -> Option<&MemoryObject> {
        self.objects.iter().find(|object| object.name == name)
    }

    fn find_mut(&mut self, name: &str) -> Option<&mut MemoryObject> {
        self.objects.iter_mut().find(|object| object.name == name)
    }
}

/// In-memory CAD document with snapshot undo.
pub struct MemoryCad {
    document_name: String,
    state: Mutex<DocState>,
    undo_snapshots: Mutex<Vec<DocState>>,
    workbench: String,
}

impl MemoryCad {
    pub fn new(document_name: impl Into<String>) -> Self {
        Self {
            document_name: document_name.into(),
            state: Mutex::new(DocState::default()),
            undo_snapshots: Mutex::new(Vec::new()),
            workbench: "Part".to_string(),
        }
    }

    /// Mark objects as selected, replacing the previous selection
    pub fn set_selection(&self, names: &[&str]) {
        let mut state = self.lock_state();
        state.selection = names.iter().map(|name| name.to_string()).collect();
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, DocState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Push an undo snapshot before a mutation
    fn snapshot(&self, state: &DocState) {
        let mut snapshots = match self.undo_snapshots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        snapshots.push(state.clone());
    }

    fn add_shape(&self, prefix: &str, shape: Shape, position: [f64; 3], name: Option<&str>) -> ToolOutcome {
        let mut state = self.lock_state();
        let name = match name {
            Some(given) if !given.trim().is_empty() => {
                if state.find(given).is_some() {
                    return ToolOutcome::failed(format!("Object '{}' already exists", given));
                }
                given.to_string()
            }
            _ => state.next_name(prefix),
        };
        self.snapshot(&state);
        let volume = shape.volume();
        state.objects.push(MemoryObject {
            name: name.clone(),
            shape,
            position,
        });
        state.modified = true;
        debug!(object = %name, "object created");
        ToolOutcome::ok(format!("Created {}", name))
            .with_object(name)
            .with_property("volume", volume)
    }

    fn write_export(&self, format: ExportFormat, path: &str, names: &[String]) -> ToolOutcome {
        let state = self.lock_state();
        let targets: Vec<&MemoryObject> = if names.is_empty() {
            state.objects.iter().collect()
        } else {
            let mut found = Vec::new();
            for name in names {
                match state.find(name) {
                    Some(object) => found.push(object),
                    None => return ToolOutcome::failed(format!("Object not found: {}", name)),
                }
            }
            found
        };
        if targets.is_empty() {
            return ToolOutcome::failed("Nothing to export: document is empty");
        }

        let content = match format {
            ExportFormat::Stl => {
                let mut out = String::new();
                for object in &targets {
                    out.push_str(&format!("solid {}\nendsolid {}\n", object.name, object.name));
                }
                out
            }
            ExportFormat::Step => {
                let mut out = String::from("ISO-10303-21;\nHEADER;\n");
                for object in &targets {
                    out.push_str(&format!("/* {} */\n", object.name));
                }
                out.push_str("ENDSEC;\nEND-ISO-10303-21;\n");
                out
            }
        };

        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(error) = std::fs::create_dir_all(parent) {
                    return ToolOutcome::failed(format!("Cannot create '{}': {}", parent.display(), error));
                }
            }
        }
        match std::fs::write(path, content) {
            Ok(()) => ToolOutcome::ok(format!(
                "Exported {} object(s) to {}",
                targets.len(),
                path
            ))
            .with_property("path", path)
            .with_property("format", format.as_str())
            .with_property("objects", targets.len() as f64),
            Err(error) => ToolOutcome::failed(format!("Export to '{}' failed: {}", path, error)),
        }
    }
}

impl Default for MemoryCad {
    fn default() -> Self {
        Self::new("Unnamed")
    }
}

#[async_trait]
impl CadGateway for MemoryCad {
    async fn active_document_exists(&self) -> bool {
        true
    }

    async fn document_info(&self) -> Result<DocumentInfo, CadError> {
        let state = self.lock_state();
        Ok(DocumentInfo::new(
            &self.document_name,
            state.objects.len(),
            state.modified,
        ))
    }

    async fn list_objects(&self) -> Result<Vec<ObjectRef>, CadError> {
        let state = self.lock_state();
        Ok(state.objects.iter().map(MemoryObject::as_ref).collect())
    }

    async fn object_properties(
        &self,
        name: &str,
    ) -> Result<HashMap<String, serde_json::Value>, CadError> {
        let state = self.lock_state();
        let object = state
            .find(name)
            .ok_or_else(|| CadError::ObjectNotFound(name.to_string()))?;
        let mut properties = HashMap::new();
        properties.insert("Type".to_string(), serde_json::json!(object.shape.type_name()));
        properties.insert("Volume".to_string(), serde_json::json!(object.shape.volume()));
        properties.insert("Placement".to_string(), serde_json::json!(object.position));
        Ok(properties)
    }

    async fn get_selection(&self) -> Result<Vec<ObjectRef>, CadError> {
        let state = self.lock_state();
        Ok(state
            .selection
            .iter()
            .filter_map(|name| state.find(name).map(MemoryObject::as_ref))
            .collect())
    }

    async fn list_constraints(&self) -> Result<Vec<SketchConstraints>, CadError> {
        // No sketcher in the in-memory backend
        Ok(Vec::new())
    }

    async fn list_materials(&self) -> Result<Vec<String>, CadError> {
        Ok(Vec::new())
    }

    async fn view_info(&self) -> Result<ViewSection, CadError> {
        Ok(ViewSection {
            camera: Some("isometric".to_string()),
            workbench: Some(self.workbench.clone()),
            error: None,
        })
    }

    async fn undo(&self) -> Result<(), CadError> {
        let mut snapshots = match self.undo_snapshots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let Some(previous) = snapshots.pop() else {
            return Err(CadError::OperationFailed("Nothing to undo".to_string()));
        };
        *self.lock_state() = previous;
        Ok(())
    }

    async fn save(&self) -> Result<(), CadError> {
        self.lock_state().modified = false;
        Ok(())
    }

    async fn create_box(
        &self,
        length: f64,
        width: f64,
        height: f64,
        position: Option<[f64; 3]>,
        name: Option<&str>,
    ) -> ToolOutcome {
        if length <= 0.0 || width <= 0.0 || height <= 0.0 {
            return ToolOutcome::failed("Box dimensions must be positive");
        }
        self.add_shape(
            "Box",
            Shape::Box {
                length,
                width,
                height,
            },
            position.unwrap_or_default(),
            name,
        )
        .with_property("length", length)
        .with_property("width", width)
        .with_property("height", height)
    }

    async fn create_cylinder(
        &self,
        radius: f64,
        height: f64,
        position: Option<[f64; 3]>,
        name: Option<&str>,
    ) -> ToolOutcome {
        if radius <= 0.0 || height <= 0.0 {
            return ToolOutcome::failed("Cylinder dimensions must be positive");
        }
        self.add_shape(
            "Cylinder",
            Shape::Cylinder { radius, height },
            position.unwrap_or_default(),
            name,
        )
        .with_property("radius", radius)
        .with_property("height", height)
    }

    async fn create_sphere(
        &self,
        radius: f64,
        position: Option<[f64; 3]>,
        name: Option<&str>,
    ) -> ToolOutcome {
        if radius <= 0.0 {
            return ToolOutcome::failed("Sphere radius must be positive");
        }
        self.add_shape(
            "Sphere",
            Shape::Sphere { radius },
            position.unwrap_or_default(),
            name,
        )
        .with_property("radius", radius)
    }

    async fn create_cone(
        &self,
        radius1: f64,
        radius2: f64,
        height: f64,
        position: Option<[f64; 3]>,
        name: Option<&str>,
    ) -> ToolOutcome {
        if radius1 < 0.0 || radius2 < 0.0 || height <= 0.0 || radius1.max(radius2) <= 0.0 {
            return ToolOutcome::failed("Cone dimensions must be positive");
        }
        self.add_shape(
            "Cone",
            Shape::Cone {
                radius1,
                radius2,
                height,
            },
            position.unwrap_or_default(),
            name,
        )
        .with_property("radius1", radius1)
        .with_property("radius2", radius2)
        .with_property("height", height)
    }

    async fn move_object(&self, name: &str, offset: [f64; 3]) -> ToolOutcome {
        let mut state = self.lock_state();
        if state.find(name).is_none() {
            return ToolOutcome::failed(format!("Object not found: {}", name));
        }
        self.snapshot(&state);
        if let Some(object) = state.find_mut(name) {
            for axis in 0..3 {
                object.position[axis] += offset[axis];
            }
            let position = object.position;
            state.modified = true;
            ToolOutcome::ok(format!(
                "Moved {} by ({}, {}, {})",
                name, offset[0], offset[1], offset[2]
            ))
            .with_object(name)
            .with_property("position", serde_json::json!(position))
        } else {
            ToolOutcome::failed(format!("Object not found: {}", name))
        }
    }

    async fn rotate_object(&self, name: &str, axis: [f64; 3], angle_rad: f64) -> ToolOutcome {
        let mut state = self.lock_state();
        if state.find(name).is_none() {
            return ToolOutcome::failed(format!("Object not found: {}", name));
        }
        self.snapshot(&state);
        state.modified = true;
        ToolOutcome::ok(format!(
            "Rotated {} by {:.4} rad around ({}, {}, {})",
            name, angle_rad, axis[0], axis[1], axis[2]
        ))
        .with_object(name)
        .with_property("angle", angle_rad)
        .with_property("axis", serde_json::json!(axis))
    }

    async fn boolean_op(
        &self,
        kind: BooleanKind,
        targets: &[String],
        name: Option<&str>,
    ) -> ToolOutcome {
        if targets.len() < 2 {
            return ToolOutcome::failed("Boolean operations need at least two objects");
        }
        let mut state = self.lock_state();
        let mut volumes = Vec::new();
        let mut extents: Vec<[f64; 3]> = Vec::new();
        for target in targets {
            match state.find(target) {
                Some(object) => {
                    volumes.push(object.shape.volume());
                    extents.push(object.shape.extent());
                }
                None => return ToolOutcome::failed(format!("Object not found: {}", target)),
            }
        }
        self.snapshot(&state);

        // Analytic approximations, not real CSG
        let volume = match kind {
            BooleanKind::Union => volumes.iter().sum(),
            BooleanKind::Cut => (volumes[0] - volumes[1..].iter().sum::<f64>()).max(0.0),
            BooleanKind::Intersection => volumes
                .iter()
                .copied()
                .fold(f64::INFINITY, f64::min)
                .max(0.0),
        };
        let extent = extents
            .iter()
            .fold([0.0_f64; 3], |acc, extent| {
                [
                    acc[0].max(extent[0]),
                    acc[1].max(extent[1]),
                    acc[2].max(extent[2]),
                ]
            });

        let position = state
            .find(&targets[0])
            .map(|object| object.position)
            .unwrap_or_default();
        state.objects.retain(|object| !targets.contains(&object.name));
        let prefix = match kind {
            BooleanKind::Union => "Union",
            BooleanKind::Cut => "Cut",
            BooleanKind::Intersection => "Common",
        };
        let result_name = match name {
            Some(given) if !given.trim().is_empty() => given.to_string(),
            _ => state.next_name(prefix),
        };
        state.objects.push(MemoryObject {
            name: result_name.clone(),
            shape: Shape::Compound { volume, extent },
            position,
        });
        state.modified = true;
        ToolOutcome::ok(format!(
            "Applied {} to {} object(s)",
            kind.as_str(),
            targets.len()
        ))
        .with_object(result_name)
        .with_property("volume", volume)
    }

    async fn measure_distance(&self, first: &str, second: &str) -> ToolOutcome {
        let state = self.lock_state();
        let (Some(a), Some(b)) = (state.find(first), state.find(second)) else {
            return ToolOutcome::failed(format!(
                "Both objects must exist: '{}', '{}'",
                first, second
            ));
        };
        let distance = a
            .position
            .iter()
            .zip(b.position.iter())
            .map(|(pa, pb)| (pa - pb).powi(2))
            .sum::<f64>()
            .sqrt();
        ToolOutcome::ok(format!(
            "Distance between {} and {}: {:.3} mm",
            first, second, distance
        ))
        .with_property("distance", distance)
    }

    async fn bounding_box(&self, name: &str) -> ToolOutcome {
        let state = self.lock_state();
        let Some(object) = state.find(name) else {
            return ToolOutcome::failed(format!("Object not found: {}", name));
        };
        let extent = object.shape.extent();
        ToolOutcome::ok(format!(
            "Bounding box of {}: {:.3} x {:.3} x {:.3} mm",
            name, extent[0], extent[1], extent[2]
        ))
        .with_object(name)
        .with_property("extent", serde_json::json!(extent))
        .with_property("position", serde_json::json!(object.position))
    }

    async fn volume(&self, name: &str) -> ToolOutcome {
        let state = self.lock_state();
        let Some(object) = state.find(name) else {
            return ToolOutcome::failed(format!("Object not found: {}", name));
        };
        let volume = object.shape.volume();
        ToolOutcome::ok(format!("Volume of {}: {:.3} mm^3", name, volume))
            .with_object(name)
            .with_property("volume", volume)
    }

    async fn export(&self, format: ExportFormat, path: &str, objects: &[String]) -> ToolOutcome {
        self.write_export(format, path, objects)
    }
}
