use super::*;
use crate::geometry::{ApproxEq, Point3};
use crate::mesh::primitives::vertex_line;
use std::f64::consts::{PI, TAU};

fn spin_slots(mesh: &Mesh, axis: Vector3, steps: i64, angle: f64, dupli: bool) -> Vec<(&'static str, SlotValue)> {
    vec![
        ("geom", SlotValue::Elements(mesh.elements_with_flag(ElemMask::ALL, ElemFlag::Select))),
        ("cent", SlotValue::Vector(Vector3::zeros())),
        ("axis", SlotValue::Vector(axis)),
        ("steps", SlotValue::Int(steps)),
        ("angle", SlotValue::Float(angle)),
        ("use_duplicate", SlotValue::Bool(dupli)),
    ]
}

fn selected_line(count: u32) -> Mesh {
    let mut mesh = vertex_line(count, 1.0).unwrap();
    mesh.vert_mut(VertId(0)).unwrap().co = Point3::new(1.0, 0.0, 0.0);
    if count > 1 {
        mesh.vert_mut(VertId(1)).unwrap().co = Point3::new(1.0, 0.0, 1.0);
    }
    mesh.select_all();
    mesh
}

#[test]
fn test_spin_vertex_full_turn() {
    let mut mesh = selected_line(1);
    let slots = spin_slots(&mesh, Vector3::z(), 4, TAU, false);
    let op = call(&mut mesh, OpName::Spin, slots).unwrap();
    assert_eq!(mesh.vert_count(), 5);
    assert_eq!(mesh.edge_count(), 4);

    let last = op.output("geom_last.out").unwrap();
    assert_eq!(last, &[ElemRef::Vert(VertId(4))]);
    assert!(mesh.vert(VertId(1)).unwrap().co.approx_eq(&Point3::new(0.0, 1.0, 0.0)));
    assert!(mesh.vert(VertId(4)).unwrap().co.approx_eq(&Point3::new(1.0, 0.0, 0.0)));
}

#[test]
fn test_spin_edge_builds_quads() {
    let mut mesh = selected_line(2);
    let slots = spin_slots(&mesh, Vector3::z(), 4, TAU, false);
    call(&mut mesh, OpName::Spin, slots).unwrap();
    assert_eq!(mesh.vert_count(), 10);
    assert_eq!(mesh.edge_count(), 13);
    assert_eq!(mesh.face_count(), 4);
}

#[test]
fn test_spin_duplicate() {
    let mut mesh = selected_line(2);
    let slots = spin_slots(&mesh, Vector3::z(), 3, PI, true);
    let op = call(&mut mesh, OpName::Spin, slots).unwrap();
    assert_eq!(mesh.vert_count(), 8);
    assert_eq!(mesh.edge_count(), 4);
    assert_eq!(mesh.face_count(), 0);
    assert_eq!(op.output("geom_last.out").unwrap().len(), 3);
}

#[test]
fn test_spin_zero_axis_rolls_back() {
    let mut mesh = selected_line(2);
    let mut op = BMOperator::init(&mesh, OpName::Spin);
    for (slot, value) in spin_slots(&mesh, Vector3::zeros(), 4, TAU, false) {
        op.set(slot, value).unwrap();
    }
    op.exec(&mut mesh);
    assert!(matches!(op.finish(&mut mesh), Err(BridgeError::Degenerate(_))));
    assert_eq!(mesh.vert_count(), 2);
    assert_eq!(mesh.edge_count(), 1);
}

#[test]
fn test_spin_zero_steps_passes_input_through() {
    let mut mesh = selected_line(2);
    let slots = spin_slots(&mesh, Vector3::z(), 0, TAU, false);
    let op = call(&mut mesh, OpName::Spin, slots).unwrap();
    assert_eq!(op.output("geom_last.out").unwrap().len(), 3);
    assert_eq!(mesh.vert_count(), 2);
}

#[test]
fn test_spin_dvec_translates_each_step() {
    let mut mesh = selected_line(1);
    let mut slots = spin_slots(&mesh, Vector3::z(), 3, 0.0, false);
    slots.push(("dvec", SlotValue::Vector(Vector3::new(0.0, 0.0, 1.0))));
    call(&mut mesh, OpName::Spin, slots).unwrap();
    assert!(mesh.vert(VertId(3)).unwrap().co.approx_eq(&Point3::new(1.0, 0.0, 3.0)));
}

#[test]
fn test_spin_in_object_space() {
    let mut mesh = selected_line(1);
    let space = Matrix4::new_translation(&Vector3::new(5.0, 0.0, 0.0));
    let mut slots = spin_slots(&mesh, Vector3::z(), 1, PI, true);
    slots.retain(|(name, _)| *name != "cent");
    slots.push(("cent", SlotValue::Vector(Vector3::new(5.0, 0.0, 0.0))));
    slots.push(("space", SlotValue::Matrix4(space)));
    call(&mut mesh, OpName::Spin, slots).unwrap();
    assert!(mesh.vert(VertId(1)).unwrap().co.approx_eq(&Point3::new(-1.0, 0.0, 0.0)));
}
