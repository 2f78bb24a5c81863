use super::{BMOperator, BridgeError, BridgeResult, OpName, SlotValue};
use crate::geometry::axis_angle_to_mat3;
use tracing::debug;

use crate::mesh::Mesh;

/// Revolve geometry about `axis` through `cent`, `angle / steps` per step.
///
/// `cent`, `axis` and `dvec` are given in the coordinates `space` maps the
/// mesh into. Non-duplicating steps region-extrude the previous step's
/// output; `dvec` is rotated along with each step before being applied.
pub(super) fn spin(mesh: &mut Mesh, op: &mut BMOperator) -> BridgeResult<()> {
    let cent = op.vector_in("cent");
    let axis = op
        .vector_in("axis")
        .try_normalize(f64::EPSILON)
        .ok_or_else(|| BridgeError::Degenerate("spin axis has zero length".to_string()))?;
    let mut dvec = op.vector_in("dvec");
    let use_dvec = dvec.norm_squared() > 0.0;
    let steps = op.int_in("steps").max(0);
    let space = op.matrix4_in("space");
    let step_op = if op.bool_in("use_duplicate") {
        OpName::Duplicate
    } else {
        OpName::ExtrudeFaceRegion
    };

    let mut geom_last = op.elements_in("geom");
    if steps > 0 {
        let rmat = axis_angle_to_mat3(&axis, op.float_in("angle") / steps as f64);
        for _ in 0..steps {
            let mut step = BMOperator::new(step_op).with("geom", SlotValue::Elements(geom_last))?;
            step.exec_nested(mesh)?;
            geom_last = step.output("geom.out")?.to_vec();

            let mut rotate = BMOperator::new(OpName::Rotate)
                .with("cent", SlotValue::Vector(cent))?
                .with("matrix", SlotValue::Matrix3(rmat))?
                .with("verts", SlotValue::Elements(geom_last.clone()))?;
            if let Some(space) = space {
                rotate.set("space", SlotValue::Matrix4(space))?;
            }
            rotate.exec_nested(mesh)?;

            if use_dvec {
                dvec = rmat * dvec;
                let mut translate = BMOperator::new(OpName::Translate)
                    .with("vec", SlotValue::Vector(dvec))?
                    .with("verts", SlotValue::Elements(geom_last.clone()))?;
                if let Some(space) = space {
                    translate.set("space", SlotValue::Matrix4(space))?;
                }
                translate.exec_nested(mesh)?;
            }
        }
    }

    debug!(steps, out = geom_last.len(), "spin");
    op.set_output("geom_last.out", geom_last);
    Ok(())
}
