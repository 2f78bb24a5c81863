use super::spin::*;
use super::*;
use crate::geometry::{ApproxEq, Matrix4, Point3, Vector3, ViewState};
use crate::mesh::primitives::{circle, vertex_line};
use crate::mesh::{EditMesh, Mesh, SelectMode, VertId};
use crate::report::Reports;
use crate::scene::{EditContext, EditObject};
use std::f64::consts::FRAC_PI_2;

fn top_view() -> ViewState {
    ViewState::orthographic(Point3::new(0.0, 0.0, 10.0), Point3::origin(), Vector3::y(), 10.0, 200.0, 200.0)
}

/// A single selected vertex at (1, 0, 0).
fn single_vertex() -> Mesh {
    let mut mesh = vertex_line(1, 1.0).unwrap();
    mesh.vert_mut(VertId(0)).unwrap().co = Point3::new(1.0, 0.0, 0.0);
    mesh.select_all();
    mesh
}

/// Selected edge from (1, 0, 0) up to (1, 0, 1).
fn vertical_edge() -> Mesh {
    let mut mesh = vertex_line(2, 1.0).unwrap();
    mesh.vert_mut(VertId(0)).unwrap().co = Point3::new(1.0, 0.0, 0.0);
    mesh.vert_mut(VertId(1)).unwrap().co = Point3::new(1.0, 0.0, 1.0);
    mesh.select_all();
    mesh
}

fn context(mesh: Mesh) -> EditContext {
    EditContext::new(EditObject::new("Mesh", EditMesh::new(mesh, SelectMode::Vertex)))
}

fn selected_positions(ctx: &EditContext) -> Vec<Point3> {
    let mesh = &ctx.edit_mesh().unwrap().mesh;
    mesh.selected_verts().into_iter().map(|v| mesh.vert(v).unwrap().co).collect()
}

// -------------------------------------------------------------------------
// Spin
// -------------------------------------------------------------------------

#[test]
fn test_spin_invoke_fills_center_and_axis() {
    let mut ctx = context(single_vertex()).with_view(top_view());
    let mut props = OperatorKind::Spin.properties();
    let mut reports = Reports::new();

    let status = invoke(OperatorKind::Spin, &mut ctx, &mut props, None, &mut reports);
    assert_eq!(status, OperatorStatus::Finished);
    assert!(props.get_vector("center").unwrap().approx_eq(&Vector3::zeros()));
    assert!(props.get_vector("axis").unwrap().approx_eq(&Vector3::z()));

    let mesh = &ctx.edit_mesh().unwrap().mesh;
    assert_eq!(mesh.vert_count(), 10);
    assert_eq!(mesh.edge_count(), 9);
}

#[test]
fn test_spin_positive_angle_turns_clockwise() {
    let mut ctx = context(single_vertex()).with_view(top_view());
    let mut props = OperatorKind::Spin.properties();
    let mut reports = Reports::new();
    invoke(OperatorKind::Spin, &mut ctx, &mut props, None, &mut reports);

    // Looking down +Z, a quarter turn takes +X to -Y.
    let last = selected_positions(&ctx);
    assert_eq!(last.len(), 1);
    assert!(last[0].approx_eq(&Point3::new(0.0, -1.0, 0.0)));
}

#[test]
fn test_spin_invoke_keeps_explicit_properties() {
    let mut ctx = context(single_vertex()).with_view(top_view());
    ctx.cursor = Point3::new(5.0, 5.0, 5.0);
    let mut props = OperatorKind::Spin
        .properties()
        .with("center", PropertyValue::Vector([0.0, 0.0, 0.0]))
        .unwrap()
        .with("axis", PropertyValue::Vector([0.0, 0.0, -1.0]))
        .unwrap()
        .with("steps", PropertyValue::Int(2))
        .unwrap();
    let mut reports = Reports::new();

    let status = invoke(OperatorKind::Spin, &mut ctx, &mut props, None, &mut reports);
    assert_eq!(status, OperatorStatus::Finished);
    assert!(props.get_vector("center").unwrap().approx_eq(&Vector3::zeros()));
    let last = selected_positions(&ctx);
    assert!(last[0].approx_eq(&Point3::new(0.0, 1.0, 0.0)));
    assert_eq!(ctx.edit_mesh().unwrap().mesh.vert_count(), 3);
}

#[test]
fn test_spin_exec_without_view_keeps_default_axis() {
    let mut ctx = context(single_vertex());
    let mut props = OperatorKind::Spin.properties();
    let mut reports = Reports::new();

    // Default axis is zero; nothing to spin around.
    let status = exec(OperatorKind::Spin, &mut ctx, &mut props, &mut reports);
    assert_eq!(status, OperatorStatus::Cancelled);
    assert_eq!(reports.last_error(), Some("Invalid/unset axis"));
    assert_eq!(ctx.edit_mesh().unwrap().mesh, single_vertex());
}

#[test]
fn test_spin_duplicate_adds_unconnected_copies() {
    let mut ctx = context(single_vertex()).with_view(top_view());
    let mut props = OperatorKind::Spin.properties().with("dupli", PropertyValue::Bool(true)).unwrap();
    let mut reports = Reports::new();

    invoke(OperatorKind::Spin, &mut ctx, &mut props, None, &mut reports);
    let mesh = &ctx.edit_mesh().unwrap().mesh;
    assert_eq!(mesh.vert_count(), 10);
    assert_eq!(mesh.edge_count(), 0);
}

#[test]
fn test_spin_center_and_axis_are_world_space() {
    let obmat = Matrix4::new_translation(&Vector3::new(2.0, 0.0, 0.0));
    let object = EditObject::new("Mesh", EditMesh::new(single_vertex(), SelectMode::Vertex)).with_transform(obmat);
    let mut ctx = EditContext::new(object);
    let props = OperatorKind::Spin
        .properties()
        .with("center", PropertyValue::Vector([2.0, 0.0, 0.0]))
        .unwrap()
        .with("axis", PropertyValue::Vector([0.0, 0.0, 1.0]))
        .unwrap();

    spin_exec(&mut ctx, &props).unwrap();
    // World (3, 0, 0) around world (2, 0, 0): ends at world (2, -1, 0).
    let last = selected_positions(&ctx);
    assert!(last[0].approx_eq(&Point3::new(0.0, -1.0, 0.0)));
}

// -------------------------------------------------------------------------
// Screw
// -------------------------------------------------------------------------

#[test]
fn test_screw_climbs_chain_length_per_turn() {
    let mut ctx = context(vertical_edge());
    let mut object = ctx.object.take().unwrap();
    screw(&mut object, Vector3::zeros(), Vector3::z(), 1, 4).unwrap();

    let mesh = &object.edit_mesh.mesh;
    assert_eq!(mesh.vert_count(), 10);
    assert_eq!(mesh.face_count(), 4);

    let last: Vec<Point3> = mesh.selected_verts().into_iter().map(|v| mesh.vert(v).unwrap().co).collect();
    assert_eq!(last.len(), 2);
    assert!(last.iter().all(|p| p.x.approx_eq(&1.0) && p.y.approx_eq(&0.0)));
    let min_z = last.iter().map(|p| p.z).fold(f64::INFINITY, f64::min);
    assert!(min_z.approx_eq(&-1.0));
}

#[test]
fn test_screw_turns_multiply_steps() {
    let mut ctx = context(vertical_edge());
    let mut object = ctx.object.take().unwrap();
    screw(&mut object, Vector3::zeros(), Vector3::z(), 2, 3).unwrap();
    assert_eq!(object.edit_mesh.mesh.face_count(), 6);
}

#[test]
fn test_screw_needs_open_chain() {
    let mut mesh = circle(8, 1.0).unwrap();
    mesh.select_all();
    let mut ctx = context(mesh.clone()).with_view(top_view());
    let mut props = OperatorKind::Screw.properties();
    let mut reports = Reports::new();

    let status = invoke(OperatorKind::Screw, &mut ctx, &mut props, None, &mut reports);
    assert_eq!(status, OperatorStatus::Cancelled);
    assert_eq!(
        reports.last_error(),
        Some("You have to select a string of connected vertices too")
    );
    assert_eq!(ctx.edit_mesh().unwrap().mesh, mesh);
}

#[test]
fn test_screw_rejects_branching_selection() {
    // Two separate edges: four chain ends.
    let mut mesh = vertical_edge();
    let a = mesh.add_vert(Point3::new(3.0, 0.0, 0.0));
    let b = mesh.add_vert(Point3::new(3.0, 0.0, 1.0));
    let e = mesh.add_edge(a, b).unwrap();
    mesh.edge_select_set(e, true).unwrap();

    let mut object = EditObject::new("Mesh", EditMesh::new(mesh, SelectMode::Vertex));
    assert_eq!(
        screw(&mut object, Vector3::zeros(), Vector3::z(), 1, 4),
        Err(OperatorError::NotConnectedVertexString)
    );
}

#[test]
fn test_screw_checks_axis_before_chain() {
    let mut mesh = circle(8, 1.0).unwrap();
    mesh.select_all();
    let mut object = EditObject::new("Mesh", EditMesh::new(mesh, SelectMode::Vertex));
    assert_eq!(
        screw(&mut object, Vector3::zeros(), Vector3::zeros(), 1, 4),
        Err(OperatorError::InvalidAxis)
    );
}

#[test]
fn test_screw_invoke_uses_view_up() {
    let mut ctx = context(vertical_edge()).with_view(top_view());
    let mut props = OperatorKind::Screw.properties();
    let mut reports = Reports::new();

    let status = invoke(OperatorKind::Screw, &mut ctx, &mut props, None, &mut reports);
    assert_eq!(status, OperatorStatus::Finished);
    assert!(props.get_vector("axis").unwrap().approx_eq(&Vector3::y()));
    assert_eq!(ctx.edit_mesh().unwrap().mesh.face_count(), 9);
}

#[test]
fn test_spin_negative_angle_turns_counter_clockwise() {
    let mut ctx = context(single_vertex());
    let props = OperatorKind::Spin
        .properties()
        .with("axis", PropertyValue::Vector([0.0, 0.0, 1.0]))
        .unwrap()
        .with("angle", PropertyValue::Float(-FRAC_PI_2))
        .unwrap()
        .with("steps", PropertyValue::Int(1))
        .unwrap();
    spin_exec(&mut ctx, &props).unwrap();
    let last = selected_positions(&ctx);
    assert!(last[0].approx_eq(&Point3::new(0.0, 1.0, 0.0)));
}
