//! What an edit operator runs against: the object in edit mode, its
//! modifier stack, the 3D view and the scene's tool settings.

use crate::geometry::{invert_or_identity, ray_triangle_intersect, Matrix4, Point3, Ray, ViewState};
use crate::mesh::{EditMesh, Mesh};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Mirror axes of a mirror modifier, in the mirror frame.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct MirrorAxes: u8 {
        const X = 1 << 0;
        const Y = 1 << 1;
        const Z = 1 << 2;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorModifier {
    pub axes: MirrorAxes,
    /// Keep vertices on the mirror plane from crossing it.
    pub clipping: bool,
    pub tolerance: f64,
    /// World transform of the object the mirror is relative to.
    pub mirror_object: Option<Matrix4>,
    pub realtime: bool,
}

impl Default for MirrorModifier {
    fn default() -> Self {
        Self {
            axes: MirrorAxes::X,
            clipping: false,
            tolerance: 0.001,
            mirror_object: None,
            realtime: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Modifier {
    Mirror(MirrorModifier),
    /// Any modifier the edit tools don't interact with.
    Other { name: String, realtime: bool },
}

impl Modifier {
    pub fn is_realtime(&self) -> bool {
        match self {
            Modifier::Mirror(m) => m.realtime,
            Modifier::Other { realtime, .. } => *realtime,
        }
    }

    /// The mirror settings, when this is an active mirror with clipping.
    pub fn mirror_clipping(&self) -> Option<&MirrorModifier> {
        if !self.is_realtime() {
            return None;
        }
        match self {
            Modifier::Mirror(m) if m.clipping => Some(m),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EditObject {
    pub name: String,
    /// Object to world.
    pub transform: Matrix4,
    pub modifiers: Vec<Modifier>,
    pub edit_mesh: EditMesh,
}

impl EditObject {
    pub fn new(name: &str, edit_mesh: EditMesh) -> Self {
        Self {
            name: name.to_string(),
            transform: Matrix4::identity(),
            modifiers: Vec::new(),
            edit_mesh,
        }
    }

    pub fn with_transform(mut self, transform: Matrix4) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    /// World to object.
    pub fn inverse_transform(&self) -> Matrix4 {
        invert_or_identity(&self.transform)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SnapMode {
    #[default]
    Increment,
    Vertex,
    Edge,
    Face,
    Volume,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolSettings {
    pub snap: bool,
    pub snap_mode: SnapMode,
}

impl ToolSettings {
    /// Whether new geometry is projected onto surfaces under the cursor.
    pub fn project_onto_faces(&self) -> bool {
        self.snap && self.snap_mode == SnapMode::Face
    }
}

/// World-space triangles that geometry can be projected onto.
#[derive(Debug, Clone, Default)]
pub struct SnapSurface {
    pub triangles: Vec<[Point3; 3]>,
}

impl SnapSurface {
    /// Fan-triangulate the faces of `mesh` placed by `transform`.
    pub fn from_mesh(mesh: &Mesh, transform: &Matrix4) -> Self {
        let mut triangles = Vec::new();
        for (id, _) in mesh.faces() {
            let Ok(points) = mesh.face_positions(id) else {
                continue;
            };
            let points: Vec<Point3> = points.iter().map(|p| transform.transform_point(p)).collect();
            for i in 1..points.len().saturating_sub(1) {
                triangles.push([points[0], points[i], points[i + 1]]);
            }
        }
        Self { triangles }
    }

    /// Nearest hit along the ray, with its distance.
    pub fn ray_cast(&self, ray: &Ray) -> Option<(f64, Point3)> {
        self.triangles
            .iter()
            .filter_map(|[a, b, c]| ray_triangle_intersect(ray, a, b, c))
            .map(|(t, _, _)| (t, ray.at(t)))
            .min_by(|x, y| x.0.total_cmp(&y.0))
    }
}

/// Everything an edit-mesh operator reads from its surroundings.
#[derive(Debug, Clone)]
pub struct EditContext {
    pub object: Option<EditObject>,
    pub view: Option<ViewState>,
    /// 3D cursor, world space.
    pub cursor: Point3,
    pub tool_settings: ToolSettings,
    pub snap_surfaces: Vec<SnapSurface>,
}

impl Default for EditContext {
    fn default() -> Self {
        Self {
            object: None,
            view: None,
            cursor: Point3::origin(),
            tool_settings: ToolSettings::default(),
            snap_surfaces: Vec::new(),
        }
    }
}

impl EditContext {
    pub fn new(object: EditObject) -> Self {
        Self {
            object: Some(object),
            ..Self::default()
        }
    }

    pub fn with_view(mut self, view: ViewState) -> Self {
        self.view = Some(view);
        self
    }

    pub fn edit_mesh(&self) -> Option<&EditMesh> {
        self.object.as_ref().map(|ob| &ob.edit_mesh)
    }
}
