use super::*;
use crate::geometry::{ApproxEq, Point3, Vector3, ViewState};
use crate::mesh::EditMesh;
use crate::operators::{OperatorError, OperatorHistory, OperatorKind, OperatorProperties, PropertyValue};
use std::f64::consts::{FRAC_PI_2, PI, TAU};

fn top_view() -> ViewState {
    ViewState::orthographic(Point3::new(0.0, 0.0, 10.0), Point3::origin(), Vector3::y(), 10.0, 200.0, 200.0)
}

fn spin_props(center: [f64; 3], axis: [f64; 3]) -> OperatorProperties {
    OperatorKind::Spin
        .properties()
        .with("center", PropertyValue::Vector(center))
        .unwrap()
        .with("axis", PropertyValue::Vector(axis))
        .unwrap()
}

fn history_with(kind: OperatorKind, props: OperatorProperties) -> OperatorHistory {
    let mut history = OperatorHistory::new();
    history.push(kind, props, EditMesh::default());
    history
}

fn synced_group(history: &OperatorHistory, view: Option<&ViewState>) -> SpinGizmoGroup {
    let mut group = SpinGizmoGroup::setup(history.last().unwrap());
    group.draw_prepare(history, view).unwrap();
    group
}

fn float(value: TargetValue) -> f64 {
    value.as_float("test").unwrap()
}

// -------------------------------------------------------------------------
// Setup and placement
// -------------------------------------------------------------------------

#[test]
fn test_setup_handles() {
    let history = history_with(OperatorKind::Spin, spin_props([0.0; 3], [0.0, 0.0, 1.0]));
    let group = SpinGizmoGroup::setup(history.last().unwrap());

    let translate_z = group.gizmo(SpinHandle::TranslateZ);
    assert_eq!(translate_z.kind, GizmoKind::Arrow(ArrowStyle::Normal));
    assert_eq!(translate_z.color, theme::GIZMO_PRIMARY);
    assert!(!translate_z.flag.contains(GizmoFlag::DRAW_VALUE));

    let translate_c = group.gizmo(SpinHandle::TranslateC);
    assert_eq!(translate_c.kind, GizmoKind::Grab(GrabStyle::Ring2d));
    assert_eq!(translate_c.scale, 0.2);

    let rotate_c = group.gizmo(SpinHandle::RotateC);
    assert_eq!(rotate_c.color, theme::GIZMO_SECONDARY);

    let angle_z = group.gizmo(SpinHandle::AngleZ);
    assert_eq!(angle_z.color, theme::AXIS_Z);
    assert_eq!(angle_z.scale, 0.5);

    for handle in [SpinHandle::TranslateC, SpinHandle::RotateC, SpinHandle::AngleZ] {
        assert!(group.gizmo(handle).flag.contains(GizmoFlag::DRAW_VALUE));
    }
}

#[test]
fn test_update_places_handles_at_center_along_axis() {
    let history = history_with(OperatorKind::Spin, spin_props([1.0, 2.0, 3.0], [1.0, 0.0, 0.0]));
    let group = synced_group(&history, Some(&top_view()));

    for handle in SpinHandle::ALL {
        assert!(group.gizmo(handle).location().approx_eq(&Vector3::new(1.0, 2.0, 3.0)));
    }
    // Arrow points along the axis.
    let tip = group.gizmo(SpinHandle::TranslateZ).transform_point(&Point3::new(0.0, 0.0, 1.0));
    assert!(tip.approx_eq(&Point3::new(2.0, 2.0, 3.0)));

    assert!(group.rotate_axis.approx_eq(&Vector3::z()));
    assert!(group.rotate_up.approx_eq(&Vector3::y()));
    assert_eq!(
        group.gizmo(SpinHandle::RotateC).kind,
        GizmoKind::Dial(DialDrawFlags::ANGLE_MIRROR | DialDrawFlags::ANGLE_START_Y)
    );
    // Dial frame: Y along the spin axis, Z along the view.
    let y = group.gizmo(SpinHandle::RotateC).transform_point(&Point3::new(0.0, 1.0, 0.0));
    assert!(y.approx_eq(&Point3::new(2.0, 2.0, 3.0)));
}

#[test]
fn test_update_without_view_skips_view_handles() {
    let history = history_with(OperatorKind::Spin, spin_props([0.0; 3], [0.0, 0.0, 1.0]));
    let group = synced_group(&history, None);
    assert_eq!(group.rotate_axis, Vector3::zeros());
    assert_eq!(group.gizmo(SpinHandle::RotateC).kind, GizmoKind::Dial(DialDrawFlags::empty()));
}

// -------------------------------------------------------------------------
// Liveness
// -------------------------------------------------------------------------

#[test]
fn test_poll_follows_last_record() {
    let mut history = history_with(OperatorKind::Spin, spin_props([0.0; 3], [0.0, 0.0, 1.0]));
    let group = SpinGizmoGroup::setup(history.last().unwrap());
    assert_eq!(group.poll(&history), Liveness::Keep);

    history.push(OperatorKind::Spin, spin_props([0.0; 3], [0.0, 0.0, 1.0]), EditMesh::default());
    assert_eq!(group.poll(&history), Liveness::Rebind);

    history.push(OperatorKind::ExtrudeRegion, OperatorKind::ExtrudeRegion.properties(), EditMesh::default());
    assert_eq!(group.poll(&history), Liveness::Detach);

    history.clear();
    assert_eq!(group.poll(&history), Liveness::Detach);
}

#[test]
fn test_draw_prepare_rebinds_to_newer_spin() {
    let mut history = history_with(OperatorKind::Spin, spin_props([0.0; 3], [0.0, 0.0, 1.0]));
    let mut group = synced_group(&history, None);

    let id = history.push(OperatorKind::Spin, spin_props([5.0, 0.0, 0.0], [0.0, 0.0, 1.0]), EditMesh::default());
    group.draw_prepare(&history, None).unwrap();
    assert_eq!(group.record_id, id);
    assert!(group.gizmo(SpinHandle::AngleZ).location().approx_eq(&Vector3::new(5.0, 0.0, 0.0)));
}

#[test]
fn test_draw_prepare_without_spin_fails() {
    let history = history_with(OperatorKind::Screw, OperatorKind::Screw.properties());
    let spin_history = history_with(OperatorKind::Spin, spin_props([0.0; 3], [0.0, 0.0, 1.0]));
    let mut group = SpinGizmoGroup::setup(spin_history.last().unwrap());
    assert_eq!(group.draw_prepare(&history, None), Err(OperatorError::NoManipulator));
}

#[test]
fn test_map_ensure_and_refresh() {
    let mut map = GizmoMap::new();
    let mut history = history_with(OperatorKind::ExtrudeRegion, OperatorKind::ExtrudeRegion.properties());
    assert!(!map.ensure(GizmoGroupType::Spin, &history));
    assert!(map.is_empty());

    history.push(OperatorKind::Spin, spin_props([0.0; 3], [0.0, 0.0, 1.0]), EditMesh::default());
    assert!(map.ensure(GizmoGroupType::Spin, &history));
    assert!(map.ensure(GizmoGroupType::Spin, &history));
    assert_eq!(map.groups.len(), 1);

    map.refresh(&history, Some(&top_view())).unwrap();
    assert!(map.spin_group().is_some());

    history.push(OperatorKind::Screw, OperatorKind::Screw.properties(), EditMesh::default());
    map.refresh(&history, Some(&top_view())).unwrap();
    assert!(map.is_empty());
}

#[test]
fn test_map_draws_every_handle() {
    let history = history_with(OperatorKind::Spin, spin_props([0.0; 3], [0.0, 0.0, 1.0]));
    let mut map = GizmoMap::new();
    map.ensure(GizmoGroupType::Spin, &history);
    map.refresh(&history, Some(&top_view())).unwrap();

    let mut list = DrawList::new();
    map.draw(&mut list);
    assert_eq!(list.polygons().count(), 4);
}

// -------------------------------------------------------------------------
// Property bindings
// -------------------------------------------------------------------------

#[test]
fn test_getters_reproduce_operator_inputs() {
    let props = spin_props([1.0, 2.0, 0.0], [0.0, 0.0, 1.0]);
    let history = history_with(OperatorKind::Spin, props.clone());
    let group = synced_group(&history, Some(&top_view()));

    assert!(float(group.target_get(SpinHandle::TranslateZ, &props).unwrap()).approx_eq(&0.0));
    assert_eq!(
        group.target_get(SpinHandle::TranslateC, &props).unwrap(),
        TargetValue::Vector([1.0, 2.0, 0.0])
    );
    assert!(float(group.target_get(SpinHandle::AngleZ, &props).unwrap()).approx_eq(&FRAC_PI_2));
}

#[test]
fn test_depth_set_moves_center_along_axis() {
    let mut props = spin_props([1.0, 2.0, 0.0], [0.0, 0.0, 1.0]);
    let history = history_with(OperatorKind::Spin, props.clone());
    let group = synced_group(&history, Some(&top_view()));

    group
        .target_set(SpinHandle::TranslateZ, &mut props, &TargetValue::Float(1.5))
        .unwrap();
    assert!(props.get_vector("center").unwrap().approx_eq(&Vector3::new(1.0, 2.0, 1.5)));
    // Handle is still where the drag started.
    assert!(float(group.target_get(SpinHandle::TranslateZ, &props).unwrap()).approx_eq(&1.5));
}

#[test]
fn test_depth_uses_unit_axis() {
    let mut props = spin_props([0.0; 3], [0.0, 0.0, 0.5]);
    let history = history_with(OperatorKind::Spin, props.clone());
    let group = synced_group(&history, None);

    group
        .target_set(SpinHandle::TranslateZ, &mut props, &TargetValue::Float(2.0))
        .unwrap();
    assert!(props.get_vector("center").unwrap().approx_eq(&Vector3::new(0.0, 0.0, 2.0)));
}

#[test]
fn test_translate_set_writes_center() {
    let mut props = spin_props([0.0; 3], [0.0, 0.0, 1.0]);
    let history = history_with(OperatorKind::Spin, props.clone());
    let group = synced_group(&history, None);

    group
        .target_set(SpinHandle::TranslateC, &mut props, &TargetValue::Vector([3.0, -1.0, 0.5]))
        .unwrap();
    assert_eq!(props.get_vector("center").unwrap(), Vector3::new(3.0, -1.0, 0.5));

    let err = group.target_set(SpinHandle::TranslateC, &mut props, &TargetValue::Float(1.0));
    assert!(matches!(err, Err(OperatorError::PropertyType { .. })));
}

#[test]
fn test_axis_angle_round_trip() {
    let mut props = spin_props([0.0; 3], [0.0, 1.0, 0.0]);
    let history = history_with(OperatorKind::Spin, props.clone());
    let group = synced_group(&history, Some(&top_view()));

    assert!(float(group.target_get(SpinHandle::RotateC, &props).unwrap()).approx_eq(&0.0));

    group
        .target_set(SpinHandle::RotateC, &mut props, &TargetValue::Float(FRAC_PI_2))
        .unwrap();
    assert!(props.get_vector("axis").unwrap().approx_eq(&Vector3::x()));
    assert!(float(group.target_get(SpinHandle::RotateC, &props).unwrap()).approx_eq(&FRAC_PI_2));
}

#[test]
fn test_axis_angle_wraps_to_nearest_turn() {
    let mut props = spin_props([0.0; 3], [0.0, 1.0, 0.0]);
    let history = history_with(OperatorKind::Spin, props.clone());
    let group = synced_group(&history, Some(&top_view()));

    // A full extra turn is the same orientation.
    group
        .target_set(SpinHandle::RotateC, &mut props, &TargetValue::Float(TAU + FRAC_PI_2))
        .unwrap();
    assert!(props.get_vector("axis").unwrap().approx_eq(&Vector3::x()));
}

#[test]
fn test_axis_along_view_has_no_angle() {
    let mut props = spin_props([0.0; 3], [0.0, 0.0, 1.0]);
    let history = history_with(OperatorKind::Spin, props.clone());
    let group = synced_group(&history, Some(&top_view()));

    assert_eq!(group.target_get(SpinHandle::RotateC, &props).unwrap(), TargetValue::Float(0.0));
    group
        .target_set(SpinHandle::RotateC, &mut props, &TargetValue::Float(PI))
        .unwrap();
    assert_eq!(props.get_vector("axis").unwrap(), Vector3::z());
}

#[test]
fn test_angle_binding_and_range() {
    let mut props = spin_props([0.0; 3], [0.0, 0.0, 1.0]);
    let history = history_with(OperatorKind::Spin, props.clone());
    let group = synced_group(&history, None);

    group
        .target_set(SpinHandle::AngleZ, &mut props, &TargetValue::Float(PI))
        .unwrap();
    assert_eq!(props.get_float("angle").unwrap(), PI);
    assert_eq!(group.target_range(SpinHandle::AngleZ, &props).unwrap(), Some((-TAU, TAU)));
    assert_eq!(group.target_range(SpinHandle::TranslateZ, &props).unwrap(), None);
}
