//! Spin and screw: revolve the selection around an axis.

use super::{edit_object, OperatorError, OperatorProperties, OperatorResult};
use crate::bridge::{BMOperator, OpName, SlotValue};
use crate::geometry::{matrix_axis, Matrix4, Vector3};
use crate::mesh::{ElemFlag, ElemMask, Mesh, VertId};
use crate::scene::{EditContext, EditObject};
use std::f64::consts::TAU;
use tracing::debug;

/// Arguments of one spin, in world space.
#[derive(Debug, Clone, PartialEq)]
pub struct SpinParams {
    pub center: Vector3,
    pub axis: Vector3,
    /// Translation per step, rotated along with the geometry.
    pub dvec: Vector3,
    pub steps: i64,
    /// Total rotation in radians, right-handed about `axis`.
    pub angle: f64,
    /// Object to world transform of the mesh.
    pub space: Matrix4,
    pub use_duplicate: bool,
}

/// Revolve the selection and select only the last step's geometry.
pub fn spin(mesh: &mut Mesh, params: &SpinParams) -> OperatorResult<()> {
    if params.axis.norm_squared() == 0.0 {
        return Err(OperatorError::InvalidAxis);
    }

    let mut op = BMOperator::init(mesh, OpName::Spin);
    op.set("geom", SlotValue::from_flag(mesh, ElemMask::ALL, ElemFlag::Select))?;
    op.set("cent", SlotValue::Vector(params.center))?;
    op.set("axis", SlotValue::Vector(params.axis))?;
    op.set("dvec", SlotValue::Vector(params.dvec))?;
    op.set("steps", SlotValue::Int(params.steps))?;
    op.set("angle", SlotValue::Float(params.angle))?;
    op.set("space", SlotValue::Matrix4(params.space))?;
    op.set("use_duplicate", SlotValue::Bool(params.use_duplicate))?;
    op.exec(mesh);

    mesh.deselect_all();
    for elem in op.output("geom_last.out")? {
        mesh.elem_select_set(*elem, true)?;
    }
    op.finish(mesh)?;
    mesh.normals_update();
    Ok(())
}

pub fn spin_exec(ctx: &mut EditContext, props: &OperatorProperties) -> OperatorResult<()> {
    let object = edit_object(ctx)?;
    let params = SpinParams {
        center: props.get_vector("center")?,
        axis: props.get_vector("axis")?,
        dvec: Vector3::zeros(),
        steps: props.get_int("steps")?,
        // Positive angles spin clockwise looking down the axis.
        angle: -props.get_float("angle")?,
        space: object.transform,
        use_duplicate: props.get_bool("dupli")?,
    };
    debug!(steps = params.steps, angle = params.angle, "spin");
    spin(&mut object.edit_mesh.mesh, &params)
}

/// Center defaults to the 3D cursor, axis to the view direction.
pub fn spin_invoke(ctx: &mut EditContext, props: &mut OperatorProperties) -> OperatorResult<()> {
    if !props.is_set("center") {
        props.set_vector("center", &ctx.cursor.coords)?;
    }
    if !props.is_set("axis") {
        if let Some(view) = &ctx.view {
            props.set_vector("axis", &view.view_axis(2))?;
        }
    }
    spin_exec(ctx, props)
}

/// The two vertices with exactly one selected edge, when there are exactly two.
fn chain_endpoints(mesh: &Mesh) -> Option<(VertId, VertId)> {
    let mut v1 = None;
    let mut v2 = None;
    for (id, _) in mesh.verts() {
        let valence = mesh
            .edges_of_vert(id)
            .map(|edges| {
                edges
                    .iter()
                    .filter(|e| mesh.edge(**e).map(|e| e.select).unwrap_or(false))
                    .count()
            })
            .unwrap_or(0);
        if valence == 1 {
            if v1.is_none() {
                v1 = Some(id);
            } else if v2.is_none() {
                v2 = Some(id);
            } else {
                return None;
            }
        }
    }
    Some((v1?, v2?))
}

/// Spin the selection `turns` full revolutions, advancing along the axis by
/// the length of the selected vertex chain per turn.
pub fn screw(object: &mut EditObject, center: Vector3, axis: Vector3, turns: i64, steps: i64) -> OperatorResult<()> {
    if axis.norm_squared() == 0.0 {
        return Err(OperatorError::InvalidAxis);
    }
    let mesh = &object.edit_mesh.mesh;
    let (v1, v2) = chain_endpoints(mesh).ok_or(OperatorError::NotConnectedVertexString)?;

    let obmat = object.transform;
    let nor = matrix_axis(&obmat, 2);
    let co1 = obmat.transform_point(&mesh.vert(v1)?.co);
    let co2 = obmat.transform_point(&mesh.vert(v2)?.co);
    let steps = steps.max(1);
    let mut dvec = (co1 - co2) / steps as f64;
    if nor.dot(&dvec) > 0.0 {
        dvec = -dvec;
    }

    let params = SpinParams {
        center,
        axis,
        dvec,
        steps: steps * turns,
        angle: TAU * turns as f64,
        space: obmat,
        use_duplicate: false,
    };
    debug!(steps = params.steps, turns, "screw");
    spin(&mut object.edit_mesh.mesh, &params)
}

pub fn screw_exec(ctx: &mut EditContext, props: &OperatorProperties) -> OperatorResult<()> {
    let center = props.get_vector("center")?;
    let axis = props.get_vector("axis")?;
    let turns = props.get_int("turns")?;
    let steps = props.get_int("steps")?;
    screw(edit_object(ctx)?, center, axis, turns, steps)
}

/// Center defaults to the 3D cursor, axis to the view's up direction.
pub fn screw_invoke(ctx: &mut EditContext, props: &mut OperatorProperties) -> OperatorResult<()> {
    if !props.is_set("center") {
        props.set_vector("center", &ctx.cursor.coords)?;
    }
    if !props.is_set("axis") {
        if let Some(view) = &ctx.view {
            props.set_vector("axis", &view.view_axis(1))?;
        }
    }
    screw_exec(ctx, props)
}
