//! Primitive gizmo: a flat shape with no built-in interaction, for tools
//! that only need something to click and drag.

use super::draw::{DrawBackend, PrimitiveType};
use super::{Color, Gizmo, GizmoFlag, GizmoKind, PrimitiveStyle};
use crate::geometry::Point3;

const VERTS_PLANE: [[f64; 3]; 4] = [[-1.0, -1.0, 0.0], [1.0, -1.0, 0.0], [1.0, 1.0, 0.0], [-1.0, 1.0, 0.0]];

const GHOST_INNER: Color = [0.5, 0.5, 0.5, 0.5];
const GHOST_OUTER: Color = [0.5, 0.5, 0.5, 0.8];

/// New primitive gizmo without a style yet.
pub fn setup() -> Gizmo {
    Gizmo::new(GizmoKind::Primitive(None)).with_flag(GizmoFlag::DRAW_ACTIVE)
}

fn draw_geom(backend: &mut dyn DrawBackend, style: PrimitiveStyle, inner: &Color, outer: &Color) {
    let verts: Vec<Point3> = match style {
        PrimitiveStyle::Plane => VERTS_PLANE.iter().map(|v| Point3::from(*v)).collect(),
    };
    backend.polygon(PrimitiveType::TriFan, &verts, inner);
    backend.polygon(PrimitiveType::LineLoop, &verts, outer);
}

pub(super) fn draw(backend: &mut dyn DrawBackend, gizmo: &Gizmo, highlight: bool) {
    let GizmoKind::Primitive(Some(style)) = gizmo.kind else {
        return;
    };

    let outer = gizmo.draw_color(highlight);
    let mut inner = outer;
    inner[3] *= 0.5;

    backend.push_matrix();
    backend.mult_matrix(&gizmo.matrix_scaled());
    backend.blend(true);
    backend.mult_matrix(&gizmo.matrix_offset);
    draw_geom(backend, style, &inner, &outer);
    backend.blend(false);
    backend.pop_matrix();

    // Ghost of where the drag started.
    if let Some(snapshot) = &gizmo.interaction {
        backend.push_matrix();
        backend.mult_matrix(&snapshot.matrix_scaled());
        backend.blend(true);
        backend.mult_matrix(&gizmo.matrix_offset);
        draw_geom(backend, style, &GHOST_INNER, &GHOST_OUTER);
        backend.blend(false);
        backend.pop_matrix();
    }
}
