//! Extrude engine.
//!
//! Picks the topological extrude that fits the selection, keeps mirror
//! seams from growing side faces, and moves the selection onto the newly
//! created geometry.

use super::snap::project_snap_verts;
use super::{edit_object, CursorEvent, OperatorError, OperatorProperties, OperatorResult};
use crate::bridge::{self, BMOperator, BridgeResult, OpName, SlotValue};
use crate::geometry::{
    angle_normalized, axis_angle_to_mat3, invert_or_identity, line_point_side_2d, matrix_axis, matrix_linear,
    normalize_or_zero, points_centroid, Matrix3, Point2, Point3, Vector3, ViewState,
};
use crate::mesh::{EditMesh, ElemFlag, ElemMask, ElemRef, Mesh, MeshResult, SelectMode};
use crate::scene::{EditContext, EditObject, MirrorAxes};
use std::collections::BTreeSet;
use tracing::debug;

/// Which extrude the selection calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtrudeKind {
    None,
    Region,
    VertsOnly,
    EdgesOnly,
}

/// Element kinds eligible for extrusion: everything the select mode allows,
/// narrowed to the highest kind that actually has a selection.
pub fn extrude_htype_from_selection(edit_mesh: &EditMesh) -> ElemMask {
    let mut htype = ElemMask::ALL;
    match edit_mesh.select_mode {
        SelectMode::Vertex => {}
        SelectMode::Edge => htype.remove(ElemMask::VERT),
        SelectMode::Face => htype.remove(ElemMask::VERT | ElemMask::EDGE),
    }

    let mesh = &edit_mesh.mesh;
    if mesh.selected_edge_count() == 0 {
        htype.remove(ElemMask::EDGE | ElemMask::FACE);
    } else if mesh.selected_face_count() == 0 {
        htype.remove(ElemMask::FACE);
    }
    htype
}

/// Boundary edges lying on the plane of a clipping mirror modifier. These
/// must not get side faces, or the mirrored halves would stop joining.
pub fn compute_mirror_exclusion(object: &EditObject, flag: ElemFlag) -> BTreeSet<ElemRef> {
    let mesh = &object.edit_mesh.mesh;
    let mut exclude = BTreeSet::new();

    for mirror in object.modifiers.iter().filter_map(|m| m.mirror_clipping()) {
        // Into the mirror object's frame when there is one.
        let mtx = mirror
            .mirror_object
            .map(|mirror_ob| invert_or_identity(&mirror_ob) * object.transform);

        for (id, edge) in mesh.edges() {
            if !edge_on_flagged_boundary(mesh, ElemRef::Edge(id), flag) {
                continue;
            }
            let (Ok(v1), Ok(v2)) = (mesh.vert(edge.verts[0]), mesh.vert(edge.verts[1])) else {
                continue;
            };
            let (co1, co2) = match mtx {
                Some(m) => (m.transform_point(&v1.co), m.transform_point(&v2.co)),
                None => (v1.co, v2.co),
            };

            let on_plane = [MirrorAxes::X, MirrorAxes::Y, MirrorAxes::Z]
                .iter()
                .enumerate()
                .any(|(i, axis)| {
                    mirror.axes.contains(*axis)
                        && co1[i].abs() < mirror.tolerance
                        && co2[i].abs() < mirror.tolerance
                });
            if on_plane {
                exclude.insert(ElemRef::Edge(id));
            }
        }
    }
    exclude
}

fn edge_on_flagged_boundary(mesh: &Mesh, edge: ElemRef, flag: ElemFlag) -> bool {
    let ElemRef::Edge(e) = edge else {
        return false;
    };
    if !mesh.flag_test(edge, flag) {
        return false;
    }
    match mesh.faces_of_edge(e) {
        Ok([f]) => mesh.flag_test(ElemRef::Face(*f), flag),
        _ => false,
    }
}

fn select_elements(mesh: &mut Mesh, elems: &[ElemRef]) -> MeshResult<()> {
    for elem in elems {
        mesh.elem_select_set(*elem, true)?;
    }
    Ok(())
}

/// Run a vertex transform operator on the selected vertices.
fn transform_selected(mesh: &mut Mesh, name: OpName, mut slots: Vec<(&str, SlotValue)>) -> BridgeResult<()> {
    slots.push(("verts", SlotValue::from_flag(mesh, ElemMask::VERT, ElemFlag::Select)));
    bridge::call(mesh, name, slots)?;
    Ok(())
}

/// Extrude the flagged elements of kind `mask` as one region and select
/// the result.
pub fn extrude_region(
    object: &mut EditObject,
    mask: ElemMask,
    flag: ElemFlag,
    use_mirror: bool,
    use_select_history: bool,
) -> OperatorResult<()> {
    let mut mask = mask;
    // Extruded faces take their boundary edges with them.
    if mask.contains(ElemMask::FACE) {
        mask.insert(ElemMask::EDGE);
    }
    let exclude = if use_mirror {
        compute_mirror_exclusion(object, flag)
    } else {
        BTreeSet::new()
    };

    let mesh = &mut object.edit_mesh.mesh;
    let mut op = BMOperator::init(mesh, OpName::ExtrudeFaceRegion);
    op.set("use_select_history", SlotValue::Bool(use_select_history))?;
    op.set("geom", SlotValue::from_flag(mesh, mask, flag))?;
    if !exclude.is_empty() {
        op.set("edges_exclude", SlotValue::ElementSet(exclude))?;
    }

    // Clearing the selection also drops the history the operator remaps.
    let history = std::mem::take(&mut mesh.select_history);
    mesh.deselect_all();
    mesh.select_history = history;

    op.exec(mesh);
    select_elements(mesh, op.output("geom.out")?)?;
    op.finish(mesh)?;
    Ok(())
}

/// One new vertex and edge per flagged vertex. The originals are deselected.
pub fn extrude_verts_indiv(mesh: &mut Mesh, flag: ElemFlag) -> OperatorResult<()> {
    let verts = mesh.elements_with_flag(ElemMask::VERT, flag);
    let mut op = BMOperator::init(mesh, OpName::ExtrudeVertIndiv);
    op.set("use_select_history", SlotValue::Bool(true))?;
    op.set("verts", SlotValue::Elements(verts.clone()))?;

    // Deselect the originals; unlike the region path the history is not kept.
    for v in &verts {
        mesh.elem_select_set(*v, false)?;
    }

    op.exec(mesh);
    select_elements(mesh, op.output("verts.out")?)?;
    op.finish(mesh)?;
    Ok(())
}

/// Extrude flagged edges into side quads, selecting the new edges.
pub fn extrude_edges_indiv(mesh: &mut Mesh, flag: ElemFlag) -> OperatorResult<()> {
    let edges = mesh.elements_with_flag(ElemMask::EDGE, flag);
    let mut op = BMOperator::init(mesh, OpName::ExtrudeEdgeOnly);
    op.set("use_select_history", SlotValue::Bool(true))?;
    op.set("edges", SlotValue::Elements(edges))?;

    let history = std::mem::take(&mut mesh.select_history);
    mesh.deselect_all();
    mesh.select_history = history;

    op.exec(mesh);
    select_elements(mesh, &op.output_filtered("geom.out", ElemMask::VERT | ElemMask::EDGE)?)?;
    op.finish(mesh)?;
    Ok(())
}

/// Extrude every flagged face separately. New caps get flat vertex normals.
pub fn extrude_faces_indiv(mesh: &mut Mesh, flag: ElemFlag) -> OperatorResult<()> {
    let faces = mesh.elements_with_flag(ElemMask::FACE, flag);
    let mut op = BMOperator::init(mesh, OpName::ExtrudeDiscreteFaces);
    op.set("use_select_history", SlotValue::Bool(true))?;
    op.set("faces", SlotValue::Elements(faces))?;

    mesh.deselect_all();
    op.exec(mesh);

    for elem in op.output("faces.out")? {
        let ElemRef::Face(f) = *elem else {
            continue;
        };
        mesh.face_select_set(f, true)?;
        let (verts, no) = {
            let face = mesh.face(f)?;
            (face.verts.clone(), face.no)
        };
        for v in verts {
            mesh.vert_mut(v)?.no = no;
        }
    }
    op.finish(mesh)?;
    Ok(())
}

pub fn classify_extrude(edit_mesh: &EditMesh) -> ExtrudeKind {
    let mesh = &edit_mesh.mesh;
    match edit_mesh.select_mode {
        SelectMode::Vertex => match mesh.selected_vert_count() {
            0 => ExtrudeKind::None,
            1 => ExtrudeKind::VertsOnly,
            _ if mesh.selected_edge_count() == 0 => ExtrudeKind::VertsOnly,
            _ => ExtrudeKind::Region,
        },
        SelectMode::Edge => {
            if mesh.selected_edge_count() == 0 {
                ExtrudeKind::None
            } else if mesh.selected_face_count() == 0 {
                ExtrudeKind::EdgesOnly
            } else {
                ExtrudeKind::Region
            }
        }
        SelectMode::Face => {
            if mesh.selected_face_count() == 0 {
                ExtrudeKind::None
            } else {
                ExtrudeKind::Region
            }
        }
    }
}

/// Extrude whatever is selected with the variant the selection supports.
pub fn extrude_mesh(object: &mut EditObject) -> OperatorResult<()> {
    let kind = classify_extrude(&object.edit_mesh);
    debug!(?kind, "extrude_mesh");

    let result = match kind {
        ExtrudeKind::None => return Err(OperatorError::InvalidExtrudeSelection),
        ExtrudeKind::Region => {
            let htype = extrude_htype_from_selection(&object.edit_mesh);
            extrude_region(object, htype, ElemFlag::Select, true, true)
        }
        ExtrudeKind::VertsOnly => extrude_verts_indiv(&mut object.edit_mesh.mesh, ElemFlag::Select),
        ExtrudeKind::EdgesOnly => extrude_edges_indiv(&mut object.edit_mesh.mesh, ElemFlag::Select),
    };
    result.map_err(|err| {
        debug!(%err, "extrude failed");
        OperatorError::InvalidExtrudeSelection
    })
}

pub fn extrude_region_exec(ctx: &mut EditContext) -> OperatorResult<()> {
    let object = edit_object(ctx)?;
    extrude_mesh(object)?;
    object.edit_mesh.mesh.normals_update();
    Ok(())
}

pub fn extrude_verts_indiv_exec(ctx: &mut EditContext) -> OperatorResult<()> {
    extrude_verts_indiv(&mut edit_object(ctx)?.edit_mesh.mesh, ElemFlag::Select)
}

pub fn extrude_edges_indiv_exec(ctx: &mut EditContext) -> OperatorResult<()> {
    extrude_edges_indiv(&mut edit_object(ctx)?.edit_mesh.mesh, ElemFlag::Select)
}

pub fn extrude_faces_indiv_exec(ctx: &mut EditContext) -> OperatorResult<()> {
    extrude_faces_indiv(&mut edit_object(ctx)?.edit_mesh.mesh, ElemFlag::Select)
}

/// Extrude `steps` times, moving each new layer `offset` along the view
/// depth axis.
pub fn extrude_repeat(object: &mut EditObject, view: &ViewState, steps: i64, offset: f64) -> OperatorResult<()> {
    let dvec = normalize_or_zero(&matrix_axis(&view.persp_inverse(), 2)) * offset;
    // Into object space.
    let tmat = matrix_linear(&object.transform)
        .try_inverse()
        .unwrap_or_else(Matrix3::identity);
    let dvec = tmat * dvec;

    for _ in 0..steps {
        extrude_region(object, ElemMask::ALL, ElemFlag::Select, false, false)?;
        transform_selected(
            &mut object.edit_mesh.mesh,
            OpName::Translate,
            vec![("vec", SlotValue::Vector(dvec))],
        )?;
    }
    object.edit_mesh.mesh.normals_update();
    Ok(())
}

pub fn extrude_repeat_exec(ctx: &mut EditContext, props: &OperatorProperties) -> OperatorResult<()> {
    let steps = props.get_int("steps")?;
    let offset = props.get_float("offset")?;
    let view = ctx.view.clone().ok_or(OperatorError::NoView)?;
    extrude_repeat(edit_object(ctx)?, &view, steps, offset)
}

/// Screen-space direction the selection should grow in, from which side of
/// each selected edge the mouse is on. Returned in object space,
/// perpendicular to the view direction.
fn cursor_extrude_normal(object: &EditObject, view: &ViewState, mval: &Point2) -> Option<Vector3> {
    let mesh = &object.edit_mesh.mesh;
    let mut nor = Vector3::zeros();
    let mut done = false;

    for (_, edge) in mesh.edges().filter(|(_, e)| e.select) {
        let (Ok(v1), Ok(v2)) = (mesh.vert(edge.verts[0]), mesh.vert(edge.verts[1])) else {
            continue;
        };
        let (Some(co1), Some(co2)) = (
            view.project_object(&object.transform, &v1.co),
            view.project_object(&object.transform, &v2.co),
        ) else {
            continue;
        };
        // 2D rotate by 90d while adding.
        if line_point_side_2d(&co1, &co2, mval) >= 0.0 {
            nor.x += co1.y - co2.y;
            nor.y += -(co1.x - co2.x);
        } else {
            nor.x += co2.y - co1.y;
            nor.y += -(co2.x - co1.x);
        }
        done = true;
    }
    if !done {
        return None;
    }

    let viewinv = view.view_inverse();
    let imat = matrix_linear(&object.inverse_transform());
    let nor = imat * (matrix_linear(&viewinv) * nor);
    let view_vec = imat * matrix_axis(&viewinv, 2);
    // Keep it in the view plane.
    let cross = nor.cross(&view_vec);
    Some(normalize_or_zero(&view_vec.cross(&cross)))
}

/// Extrude the selection to the mouse position, or add a vertex there when
/// nothing is selected.
pub fn dupli_extrude_cursor(
    ctx: &mut EditContext,
    rotate_source: bool,
    event: &CursorEvent,
) -> OperatorResult<()> {
    let EditContext {
        object,
        view,
        cursor,
        tool_settings,
        snap_surfaces,
    } = ctx;
    let view = view.as_ref().ok_or(OperatorError::NoView)?;
    let object = object.as_mut().ok_or(OperatorError::NoEditMesh)?;
    let use_proj = tool_settings.project_onto_faces();
    let obmat = object.transform;
    let imat = object.inverse_transform();
    let mval = Point2::new(event.mval[0], event.mval[1]);

    let selected = object.edit_mesh.mesh.selected_verts();
    if !selected.is_empty() {
        let htype = extrude_htype_from_selection(&object.edit_mesh);
        let mesh = &object.edit_mesh.mesh;
        let points = selected
            .iter()
            .map(|v| mesh.vert(*v).map(|v| v.co))
            .collect::<MeshResult<Vec<Point3>>>()?;
        let center = points_centroid(&points);

        let nor = cursor_extrude_normal(object, view, &mval);

        let target = imat.transform_point(&view.win_to_3d(&obmat.transform_point(&center), &mval));
        let ofs = target - center;

        let mut mat = Matrix3::identity();
        if let Some(nor) = nor {
            let vec = normalize_or_zero(&ofs);
            let mut angle = angle_normalized(&vec, &nor);
            if angle != 0.0 {
                let axis = nor.cross(&vec);
                // Source and extrusion each take half of the turn.
                if rotate_source {
                    angle *= 0.5;
                }
                mat = axis_angle_to_mat3(&axis, angle);
            }
        }
        let rotate_slots = || {
            vec![
                ("cent", SlotValue::Vector(center.coords)),
                ("matrix", SlotValue::Matrix3(mat)),
            ]
        };

        if rotate_source {
            transform_selected(&mut object.edit_mesh.mesh, OpName::Rotate, rotate_slots())?;
            if use_proj {
                project_snap_verts(&mut object.edit_mesh.mesh, view, &obmat, snap_surfaces);
            }
        }

        extrude_region(object, htype, ElemFlag::Select, true, true)?;
        let mesh = &mut object.edit_mesh.mesh;
        transform_selected(mesh, OpName::Rotate, rotate_slots())?;
        transform_selected(mesh, OpName::Translate, vec![("vec", SlotValue::Vector(ofs))])?;
        debug!(verts = selected.len(), rotated = nor.is_some(), "dupli_extrude_cursor");
    } else {
        let center = imat.transform_point(&view.win_to_3d(cursor, &mval));
        let mesh = &mut object.edit_mesh.mesh;
        let op = bridge::call(mesh, OpName::CreateVert, vec![("co", SlotValue::Vector(center.coords))])?;
        select_elements(mesh, op.output("vert.out")?)?;
        debug!("dupli_extrude_cursor: new vertex");
    }

    let mesh = &mut object.edit_mesh.mesh;
    if use_proj {
        project_snap_verts(mesh, view, &obmat, snap_surfaces);
    }
    mesh.normals_update();
    Ok(())
}

pub fn dupli_extrude_cursor_invoke(
    ctx: &mut EditContext,
    props: &OperatorProperties,
    event: &CursorEvent,
) -> OperatorResult<()> {
    let rotate_source = props.get_bool("rotate_source")?;
    dupli_extrude_cursor(ctx, rotate_source, event)
}
