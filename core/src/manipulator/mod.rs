//! On-screen manipulators.
//!
//! A [`Gizmo`] is a drawable handle with a transform, colors and
//! interaction state. Gizmos are grouped per tool (see [`spin_group`]) and
//! the groups live in a [`map::GizmoMap`] that checks every redraw whether
//! each group still has something to manipulate.

pub mod draw;
pub mod map;
pub mod primitive;
pub mod spin_group;

#[cfg(test)]
mod tests_spin_group;

pub use draw::{DrawBackend, DrawCommand, DrawList, PrimitiveType};
pub use map::{GizmoGroup, GizmoGroupType, GizmoMap, Liveness};
pub use spin_group::{SpinGizmoGroup, SpinHandle};

use crate::geometry::{matrix_axis, Matrix3, Matrix4, Point3, Vector3};
use crate::operators::{OperatorError, OperatorProperties, OperatorResult};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

pub type Color = [f32; 4];

/// Theme colors for manipulators.
pub mod theme {
    use super::Color;

    pub const GIZMO_DEFAULT: Color = [1.0, 1.0, 1.0, 1.0];
    pub const GIZMO_HIGHLIGHT: Color = [1.0, 1.0, 1.0, 1.0];
    // 0xf5f14d
    pub const GIZMO_PRIMARY: Color = [0.961, 0.945, 0.302, 1.0];
    // 0x63ffff
    pub const GIZMO_SECONDARY: Color = [0.388, 1.0, 1.0, 1.0];
    // 0x2890ff
    pub const AXIS_Z: Color = [0.157, 0.565, 1.0, 1.0];
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct GizmoFlag: u8 {
        /// Show the bound value while dragging.
        const DRAW_VALUE = 1 << 0;
        /// Keep drawing while active.
        const DRAW_ACTIVE = 1 << 1;
        /// Hovering doesn't switch to the highlight color.
        const DRAW_HOVER = 1 << 2;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct GizmoState: u8 {
        const HIGHLIGHT = 1 << 0;
        /// A drag is in progress.
        const MODAL = 1 << 1;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct DialDrawFlags: u8 {
        const ANGLE_MIRROR = 1 << 0;
        const ANGLE_START_Y = 1 << 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArrowStyle {
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrabStyle {
    Ring2d,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimitiveStyle {
    Plane,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GizmoKind {
    Arrow(ArrowStyle),
    Grab(GrabStyle),
    Dial(DialDrawFlags),
    /// No style draws nothing.
    Primitive(Option<PrimitiveStyle>),
}

/// State captured when a drag begins, drawn as a ghost until it ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InteractionSnapshot {
    pub init_matrix: Matrix4,
    pub init_scale: f64,
}

impl InteractionSnapshot {
    /// Basis at drag start with its scale applied, offset excluded.
    pub fn matrix_scaled(&self) -> Matrix4 {
        scale_linear(&self.init_matrix, self.init_scale)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gizmo {
    pub kind: GizmoKind,
    /// Location and orientation.
    pub matrix_basis: Matrix4,
    /// Applied after the scaled basis.
    pub matrix_offset: Matrix4,
    pub scale: f64,
    pub color: Color,
    pub color_hi: Color,
    pub flag: GizmoFlag,
    pub state: GizmoState,
    pub interaction: Option<InteractionSnapshot>,
}

impl Gizmo {
    pub fn new(kind: GizmoKind) -> Self {
        Self {
            kind,
            matrix_basis: Matrix4::identity(),
            matrix_offset: Matrix4::identity(),
            scale: 1.0,
            color: theme::GIZMO_DEFAULT,
            color_hi: theme::GIZMO_HIGHLIGHT,
            flag: GizmoFlag::empty(),
            state: GizmoState::empty(),
            interaction: None,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_flag(mut self, flag: GizmoFlag) -> Self {
        self.flag |= flag;
        self
    }

    pub fn location(&self) -> Vector3 {
        matrix_axis(&self.matrix_basis, 3)
    }

    pub fn set_location(&mut self, location: &Vector3) {
        self.matrix_basis.fixed_view_mut::<3, 1>(0, 3).copy_from(location);
    }

    /// Replace the rotation part of the basis, keeping the location.
    pub fn set_rotation(&mut self, rotation: &Matrix3) {
        self.matrix_basis.fixed_view_mut::<3, 3>(0, 0).copy_from(rotation);
    }

    pub fn set_highlight(&mut self, highlight: bool) {
        self.state.set(GizmoState::HIGHLIGHT, highlight);
    }

    pub fn is_highlighted(&self) -> bool {
        self.state.contains(GizmoState::HIGHLIGHT)
    }

    /// Basis with its rotation scaled, then the offset.
    pub fn matrix_final(&self) -> Matrix4 {
        self.matrix_scaled() * self.matrix_offset
    }

    pub(crate) fn matrix_scaled(&self) -> Matrix4 {
        scale_linear(&self.matrix_basis, self.scale)
    }

    /// Where a point in gizmo space ends up in the world.
    pub fn transform_point(&self, p: &Point3) -> Point3 {
        self.matrix_final().transform_point(p)
    }

    /// Color for drawing in the current highlight state.
    pub fn draw_color(&self, highlight: bool) -> Color {
        if highlight && !self.flag.contains(GizmoFlag::DRAW_HOVER) {
            self.color_hi
        } else {
            self.color
        }
    }

    /// Start a drag: remember how the gizmo looked.
    pub fn begin_interaction(&mut self) {
        self.interaction = Some(InteractionSnapshot {
            init_matrix: self.matrix_basis,
            init_scale: self.scale,
        });
        self.state.insert(GizmoState::MODAL);
    }

    pub fn end_interaction(&mut self) {
        self.interaction = None;
        self.state.remove(GizmoState::MODAL);
    }
}

/// Value read from or written to a gizmo's target property.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetValue {
    Float(f64),
    Vector([f64; 3]),
}

impl TargetValue {
    pub fn from_vector(v: &Vector3) -> Self {
        TargetValue::Vector([v.x, v.y, v.z])
    }

    pub fn as_float(&self, name: &str) -> OperatorResult<f64> {
        match self {
            TargetValue::Float(x) => Ok(*x),
            TargetValue::Vector(_) => Err(OperatorError::PropertyType {
                name: name.to_string(),
                expected: "float",
            }),
        }
    }

    pub fn as_vector(&self, name: &str) -> OperatorResult<Vector3> {
        match self {
            TargetValue::Vector(v) => Ok(Vector3::from(*v)),
            TargetValue::Float(_) => Err(OperatorError::PropertyType {
                name: name.to_string(),
                expected: "vector",
            }),
        }
    }
}

/// Get/set/range callbacks binding a gizmo to operator properties through
/// its group `G`.
pub struct TargetPropertyFns<G> {
    pub name: &'static str,
    pub get: fn(&G, &OperatorProperties) -> OperatorResult<TargetValue>,
    pub set: fn(&G, &mut OperatorProperties, &TargetValue) -> OperatorResult<()>,
    pub range: Option<fn(&G, &OperatorProperties) -> OperatorResult<(f64, f64)>>,
}

fn scale_linear(m: &Matrix4, scale: f64) -> Matrix4 {
    let mut mat = *m;
    let mut linear = mat.fixed_view_mut::<3, 3>(0, 0);
    linear *= scale;
    mat
}
