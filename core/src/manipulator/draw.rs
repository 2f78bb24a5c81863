//! Immediate-mode drawing of gizmos.
//!
//! Gizmos don't render themselves; they issue matrix-stack and polygon calls
//! against a [`DrawBackend`]. [`DrawList`] records those calls so they can
//! be sent to a client or inspected in tests.

use super::{primitive, Color, Gizmo, GizmoKind};
use crate::geometry::{Matrix4, Point3};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

const DIAL_SEGMENTS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimitiveType {
    Lines,
    LineLoop,
    TriFan,
}

pub trait DrawBackend {
    fn push_matrix(&mut self);
    fn pop_matrix(&mut self);
    fn mult_matrix(&mut self, m: &Matrix4);
    fn blend(&mut self, enabled: bool);
    fn polygon(&mut self, prim: PrimitiveType, verts: &[Point3], color: &Color);
    /// Following polygons belong to selection id `id`.
    fn load_select_id(&mut self, id: u32);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum DrawCommand {
    PushMatrix,
    PopMatrix,
    MultMatrix { matrix: Matrix4 },
    Blend { enabled: bool },
    Polygon {
        prim: PrimitiveType,
        verts: Vec<[f64; 3]>,
        color: Color,
    },
    LoadSelectId { id: u32 },
}

/// A backend that records every call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrawList {
    pub commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn polygons(&self) -> impl Iterator<Item = (&PrimitiveType, &Vec<[f64; 3]>, &Color)> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Polygon { prim, verts, color } => Some((prim, verts, color)),
            _ => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl DrawBackend for DrawList {
    fn push_matrix(&mut self) {
        self.commands.push(DrawCommand::PushMatrix);
    }

    fn pop_matrix(&mut self) {
        self.commands.push(DrawCommand::PopMatrix);
    }

    fn mult_matrix(&mut self, m: &Matrix4) {
        self.commands.push(DrawCommand::MultMatrix { matrix: *m });
    }

    fn blend(&mut self, enabled: bool) {
        self.commands.push(DrawCommand::Blend { enabled });
    }

    fn polygon(&mut self, prim: PrimitiveType, verts: &[Point3], color: &Color) {
        self.commands.push(DrawCommand::Polygon {
            prim,
            verts: verts.iter().map(|p| [p.x, p.y, p.z]).collect(),
            color: *color,
        });
    }

    fn load_select_id(&mut self, id: u32) {
        self.commands.push(DrawCommand::LoadSelectId { id });
    }
}

fn circle_verts(segments: usize) -> Vec<Point3> {
    (0..segments)
        .map(|i| {
            let t = TAU * i as f64 / segments as f64;
            Point3::new(t.cos(), t.sin(), 0.0)
        })
        .collect()
}

/// Draw `gizmo` in its current highlight state.
pub fn draw_gizmo(backend: &mut dyn DrawBackend, gizmo: &Gizmo) {
    draw_intern(backend, gizmo, gizmo.is_highlighted());
}

/// Draw for hit testing: tagged with `select_id`, never highlighted.
pub fn draw_gizmo_select(backend: &mut dyn DrawBackend, gizmo: &Gizmo, select_id: u32) {
    backend.load_select_id(select_id);
    draw_intern(backend, gizmo, false);
}

fn draw_intern(backend: &mut dyn DrawBackend, gizmo: &Gizmo, highlight: bool) {
    let (prim, verts) = match gizmo.kind {
        GizmoKind::Primitive(_) => return primitive::draw(backend, gizmo, highlight),
        GizmoKind::Arrow(_) => (PrimitiveType::Lines, vec![Point3::origin(), Point3::new(0.0, 0.0, 1.0)]),
        GizmoKind::Grab(_) | GizmoKind::Dial(_) => (PrimitiveType::LineLoop, circle_verts(DIAL_SEGMENTS)),
    };
    backend.push_matrix();
    backend.mult_matrix(&gizmo.matrix_final());
    backend.polygon(prim, &verts, &gizmo.draw_color(highlight));
    backend.pop_matrix();
}
