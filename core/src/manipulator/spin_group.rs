//! Manipulators for the last spin.
//!
//! Four handles edit the stored properties of the most recent `mesh.spin`:
//! an arrow moving the center along the axis, a ring moving it freely, a
//! dial tilting the axis in the view plane and a dial for the angle. The
//! properties stay authoritative; handle transforms are rebuilt from them
//! on every draw-prepare.

use super::map::Liveness;
use super::{theme, ArrowStyle, DialDrawFlags, Gizmo, GizmoFlag, GizmoKind, GrabStyle, TargetPropertyFns, TargetValue};
use crate::geometry::{
    angle_compat, angle_signed_on_axis, axis_angle_to_mat3, normalize_or_zero, project_plane_normalized,
    rotation_from_yz_axis, rotation_from_z_axis, Plane, Point3, Vector3, ViewState,
};
use crate::operators::{OperatorError, OperatorHistory, OperatorKind, OperatorProperties, OperatorRecord, OperatorResult};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpinHandle {
    /// Center depth along the axis.
    TranslateZ,
    /// Center in the view plane.
    TranslateC,
    /// Axis orientation.
    RotateC,
    /// Spin angle.
    AngleZ,
}

impl SpinHandle {
    pub const ALL: [SpinHandle; 4] = [
        SpinHandle::TranslateZ,
        SpinHandle::TranslateC,
        SpinHandle::RotateC,
        SpinHandle::AngleZ,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn target(self) -> &'static TargetPropertyFns<SpinGizmoGroup> {
        match self {
            SpinHandle::TranslateZ => &DEPTH,
            SpinHandle::TranslateC => &TRANSLATE,
            SpinHandle::RotateC => &AXIS_ANGLE,
            SpinHandle::AngleZ => &ANGLE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpinGizmoGroup {
    /// Operator record the handles edit.
    pub record_id: Uuid,
    pub gizmos: [Gizmo; 4],
    /// View direction the axis dial turns around.
    pub rotate_axis: Vector3,
    /// Zero angle reference for the axis dial, orthogonal to `rotate_axis`.
    pub rotate_up: Vector3,
}

impl SpinGizmoGroup {
    /// Whether the group type has anything to attach to.
    pub fn poll_type(history: &OperatorHistory) -> bool {
        matches!(history.last(), Some(r) if r.kind == OperatorKind::Spin)
    }

    pub fn setup(record: &OperatorRecord) -> Self {
        let translate_z = Gizmo::new(GizmoKind::Arrow(ArrowStyle::Normal)).with_color(theme::GIZMO_PRIMARY);
        let translate_c = Gizmo::new(GizmoKind::Grab(GrabStyle::Ring2d))
            .with_color(theme::GIZMO_PRIMARY)
            .with_scale(0.2)
            .with_flag(GizmoFlag::DRAW_VALUE);
        let rotate_c = Gizmo::new(GizmoKind::Dial(DialDrawFlags::empty()))
            .with_color(theme::GIZMO_SECONDARY)
            .with_flag(GizmoFlag::DRAW_VALUE);
        let angle_z = Gizmo::new(GizmoKind::Dial(DialDrawFlags::empty()))
            .with_color(theme::AXIS_Z)
            .with_scale(0.5)
            .with_flag(GizmoFlag::DRAW_VALUE);

        debug!(id = %record.id, "spin gizmo group setup");
        Self {
            record_id: record.id,
            gizmos: [translate_z, translate_c, rotate_c, angle_z],
            rotate_axis: Vector3::zeros(),
            rotate_up: Vector3::zeros(),
        }
    }

    pub fn gizmo(&self, handle: SpinHandle) -> &Gizmo {
        &self.gizmos[handle.index()]
    }

    pub fn gizmo_mut(&mut self, handle: SpinHandle) -> &mut Gizmo {
        &mut self.gizmos[handle.index()]
    }

    /// Keep while the last redo target is still our spin.
    pub fn poll(&self, history: &OperatorHistory) -> Liveness {
        match history.last() {
            Some(r) if r.kind == OperatorKind::Spin && r.id == self.record_id => Liveness::Keep,
            Some(r) if r.kind == OperatorKind::Spin => Liveness::Rebind,
            _ => Liveness::Detach,
        }
    }

    /// Place the handles from the operator's current properties.
    pub fn update_from_op(&mut self, props: &OperatorProperties, view: Option<&ViewState>) -> OperatorResult<()> {
        let center = props.get_vector("center")?;
        let axis = props.get_vector("axis")?;

        for handle in SpinHandle::ALL {
            self.gizmo_mut(handle).set_location(&center);
        }
        let axis_rotation = rotation_from_z_axis(&axis);
        self.gizmo_mut(SpinHandle::TranslateZ).set_rotation(&axis_rotation);
        self.gizmo_mut(SpinHandle::AngleZ).set_rotation(&axis_rotation);
        self.gizmo_mut(SpinHandle::TranslateC).scale = 0.2;

        if let Some(view) = view {
            self.rotate_axis = normalize_or_zero(&view.view_axis(2));
            self.rotate_up = normalize_or_zero(&project_plane_normalized(
                &normalize_or_zero(&view.view_axis(1)),
                &self.rotate_axis,
            ));

            self.gizmo_mut(SpinHandle::TranslateC).set_rotation(&axis_rotation);
            let rotate_axis = self.rotate_axis;
            let rotate_c = self.gizmo_mut(SpinHandle::RotateC);
            rotate_c.set_rotation(&rotation_from_yz_axis(&axis, &rotate_axis));
            rotate_c.kind = GizmoKind::Dial(DialDrawFlags::ANGLE_MIRROR | DialDrawFlags::ANGLE_START_Y);
        }
        Ok(())
    }

    /// Re-bind to the current spin record if it changed, then re-sync.
    pub fn draw_prepare(&mut self, history: &OperatorHistory, view: Option<&ViewState>) -> OperatorResult<()> {
        let record = history
            .last()
            .filter(|r| r.kind == OperatorKind::Spin)
            .ok_or(OperatorError::NoManipulator)?;
        if record.id != self.record_id {
            debug!(old = %self.record_id, new = %record.id, "spin gizmo rebind");
            self.record_id = record.id;
        }
        self.update_from_op(&record.properties, view)
    }

    pub fn target_get(&self, handle: SpinHandle, props: &OperatorProperties) -> OperatorResult<TargetValue> {
        (handle.target().get)(self, props)
    }

    /// Write `value` through the handle's binding. The caller re-runs the
    /// operator.
    pub fn target_set(&self, handle: SpinHandle, props: &mut OperatorProperties, value: &TargetValue) -> OperatorResult<()> {
        debug!(?handle, ?value, "spin gizmo set");
        (handle.target().set)(self, props, value)
    }

    pub fn target_range(&self, handle: SpinHandle, props: &OperatorProperties) -> OperatorResult<Option<(f64, f64)>> {
        handle.target().range.map(|range| range(self, props)).transpose()
    }
}

// -----------------------------------------------------------------------------
// Target property bindings
// -----------------------------------------------------------------------------

const DEPTH: TargetPropertyFns<SpinGizmoGroup> = TargetPropertyFns {
    name: "depth",
    get: depth_get,
    set: depth_set,
    range: None,
};

const TRANSLATE: TargetPropertyFns<SpinGizmoGroup> = TargetPropertyFns {
    name: "center",
    get: translate_get,
    set: translate_set,
    range: None,
};

const AXIS_ANGLE: TargetPropertyFns<SpinGizmoGroup> = TargetPropertyFns {
    name: "axis_angle",
    get: axis_angle_get,
    set: axis_angle_set,
    range: None,
};

const ANGLE: TargetPropertyFns<SpinGizmoGroup> = TargetPropertyFns {
    name: "angle",
    get: angle_get,
    set: angle_set,
    range: Some(angle_range),
};

/// Signed distance of the center from the arrow's plane.
fn depth_get(group: &SpinGizmoGroup, props: &OperatorProperties) -> OperatorResult<TargetValue> {
    let center = props.get_vector("center")?;
    let axis = props.get_vector("axis")?;
    let location = group.gizmo(SpinHandle::TranslateZ).location();
    Ok(TargetValue::Float(axis.dot(&center) - axis.dot(&location)))
}

fn depth_set(group: &SpinGizmoGroup, props: &mut OperatorProperties, value: &TargetValue) -> OperatorResult<()> {
    let value = value.as_float(DEPTH.name)?;
    let center = props.get_vector("center")?;
    let axis = normalize_or_zero(&props.get_vector("axis")?);
    if axis.norm_squared() == 0.0 {
        return Ok(());
    }
    let location = group.gizmo(SpinHandle::TranslateZ).location();

    let plane = Plane::from_normal_and_offset(axis, -value - axis.dot(&location));
    let center = plane.project_point(&Point3::from(center));
    props.set_vector("center", &center.coords)
}

fn translate_get(_: &SpinGizmoGroup, props: &OperatorProperties) -> OperatorResult<TargetValue> {
    Ok(TargetValue::from_vector(&props.get_vector("center")?))
}

fn translate_set(_: &SpinGizmoGroup, props: &mut OperatorProperties, value: &TargetValue) -> OperatorResult<()> {
    props.set_vector("center", &value.as_vector(TRANSLATE.name)?)
}

/// Axis projected into the view plane, or None when it points along the
/// view direction.
fn axis_in_view(group: &SpinGizmoGroup, props: &OperatorProperties) -> OperatorResult<Option<(Vector3, f64)>> {
    if group.rotate_axis.norm_squared() == 0.0 {
        return Ok(None);
    }
    let axis = normalize_or_zero(&props.get_vector("axis")?);
    let proj = project_plane_normalized(&axis, &group.rotate_axis);
    if proj.norm_squared() == 0.0 {
        return Ok(None);
    }
    let angle = -angle_signed_on_axis(&proj, &group.rotate_up, &group.rotate_axis);
    Ok(Some((axis, angle)))
}

fn axis_angle_get(group: &SpinGizmoGroup, props: &OperatorProperties) -> OperatorResult<TargetValue> {
    let angle = axis_in_view(group, props)?.map(|(_, angle)| angle).unwrap_or(0.0);
    Ok(TargetValue::Float(angle))
}

fn axis_angle_set(group: &SpinGizmoGroup, props: &mut OperatorProperties, value: &TargetValue) -> OperatorResult<()> {
    let value = value.as_float(AXIS_ANGLE.name)?;
    let Some((axis, angle)) = axis_in_view(group, props)? else {
        return Ok(());
    };
    let delta = angle - angle_compat(value, angle);
    if delta != 0.0 {
        let axis = axis_angle_to_mat3(&group.rotate_axis, delta) * axis;
        props.set_vector("axis", &axis)?;
    }
    Ok(())
}

fn angle_get(_: &SpinGizmoGroup, props: &OperatorProperties) -> OperatorResult<TargetValue> {
    Ok(TargetValue::Float(props.get_float("angle")?))
}

fn angle_set(_: &SpinGizmoGroup, props: &mut OperatorProperties, value: &TargetValue) -> OperatorResult<()> {
    props.set_float("angle", value.as_float(ANGLE.name)?)
}

fn angle_range(_: &SpinGizmoGroup, props: &OperatorProperties) -> OperatorResult<(f64, f64)> {
    let def = props.def("angle")?;
    Ok((def.soft_min, def.soft_max))
}
