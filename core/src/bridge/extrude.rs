use super::transform::duplicate_region;
use super::{split_elements, BMOperator, BridgeResult};
use crate::mesh::{EdgeId, ElemRef, FaceId, Mesh, VertId};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Extrude a region of faces, edges and vertices as one piece.
///
/// Faces bordering the region are kept attached: when any input edge is
/// used by a face outside the input, the original faces (and the interior
/// edges and vertices they leave behind) are deleted so the copy replaces
/// them. Otherwise the originals stay as the bottom cap, flipped.
pub(super) fn extrude_face_region(mesh: &mut Mesh, op: &mut BMOperator) -> BridgeResult<()> {
    let exclude = op.element_set_in("edges_exclude");
    let (in_verts, mut in_edges, in_faces) = split_elements(&op.elements_in("geom"));
    for f in &in_faces {
        in_edges.extend(mesh.face_edges(*f)?);
    }
    for v in &in_verts {
        mesh.vert(*v)?;
    }

    let mut delete_orig = false;
    let mut del_edges: BTreeSet<EdgeId> = BTreeSet::new();
    for e in &in_edges {
        let faces = mesh.faces_of_edge(*e)?;
        if faces.iter().any(|f| !in_faces.contains(f)) {
            delete_orig = true;
        } else if faces.len() > 1 {
            del_edges.insert(*e);
        }
    }

    let mut del_verts: BTreeSet<VertId> = BTreeSet::new();
    for e in &del_edges {
        for v in mesh.edge(*e)?.verts {
            if mesh.edges_of_vert(v)?.iter().all(|ve| del_edges.contains(ve)) {
                del_verts.insert(v);
            }
        }
    }

    // Side quads, oriented before anything is deleted: (a, b) makes the
    // face [a, b, b', a'].
    let mut sides: Vec<(VertId, VertId)> = Vec::new();
    for e in &in_edges {
        if exclude.contains(&ElemRef::Edge(*e)) {
            continue;
        }
        let faces = mesh.faces_of_edge(*e)?;
        let input: Vec<FaceId> = faces.iter().copied().filter(|f| in_faces.contains(f)).collect();
        if input.len() >= 2 {
            continue;
        }
        let [v1, v2] = mesh.edge(*e)?.verts;
        let side = if let Some(f) = input.first() {
            if mesh.face_runs_from(*f, v1, v2)? {
                (v1, v2)
            } else {
                (v2, v1)
            }
        } else if let Some(f) = faces.first() {
            if mesh.face_runs_from(*f, v1, v2)? {
                (v2, v1)
            } else {
                (v1, v2)
            }
        } else {
            (v1, v2)
        };
        sides.push(side);
    }

    let lone_verts: Vec<VertId> = in_verts
        .iter()
        .copied()
        .filter(|v| {
            mesh.edges_of_vert(*v)
                .map(|edges| !edges.iter().any(|e| in_edges.contains(e)))
                .unwrap_or(false)
        })
        .collect();

    let dupe = duplicate_region(mesh, &in_verts, &in_edges, &in_faces)?;
    if op.bool_in("use_select_history") {
        mesh.select_history_remap(&dupe.history_map());
    }

    if delete_orig {
        for f in &in_faces {
            mesh.remove_face(*f)?;
        }
        for e in &del_edges {
            mesh.remove_edge(*e)?;
        }
        for v in &del_verts {
            mesh.remove_vert(*v)?;
        }
        // Excluded seam edges lost their face and got no side: drop them
        // with any vertex they leave loose.
        for elem in &exclude {
            let ElemRef::Edge(e) = *elem else {
                continue;
            };
            if !mesh.contains(*elem) || !mesh.edge_is_wire(e)? {
                continue;
            }
            let verts = mesh.edge(e)?.verts;
            mesh.remove_edge(e)?;
            for v in verts {
                if mesh.contains(ElemRef::Vert(v)) && mesh.edges_of_vert(v)?.is_empty() {
                    mesh.remove_vert(v)?;
                }
            }
        }
    } else {
        for f in &in_faces {
            mesh.face_flip(*f)?;
        }
    }

    for (a, b) in &sides {
        mesh.add_face(&[*a, *b, dupe.vert(*b)?, dupe.vert(*a)?])?;
    }
    for v in &lone_verts {
        mesh.add_edge(*v, dupe.vert(*v)?)?;
    }

    debug!(
        verts = in_verts.len(),
        edges = in_edges.len(),
        faces = in_faces.len(),
        sides = sides.len(),
        delete_orig,
        "extrude_face_region"
    );
    op.set_output("geom.out", dupe.new_elements());
    Ok(())
}

/// Every input vertex gets a copy joined to it by a wire edge.
pub(super) fn extrude_vert_indiv(mesh: &mut Mesh, op: &mut BMOperator) -> BridgeResult<()> {
    let (verts, _, _) = split_elements(&op.elements_in("verts"));
    let mut verts_out = Vec::with_capacity(verts.len());
    let mut edges_out = Vec::with_capacity(verts.len());
    let mut history = HashMap::new();
    for v in verts {
        let (co, no) = {
            let src = mesh.vert(v)?;
            (src.co, src.no)
        };
        let copy = mesh.add_vert(co);
        mesh.vert_mut(copy)?.no = no;
        let e = mesh.add_edge(v, copy)?;
        verts_out.push(ElemRef::Vert(copy));
        edges_out.push(ElemRef::Edge(e));
        history.insert(ElemRef::Vert(v), ElemRef::Vert(copy));
    }
    if op.bool_in("use_select_history") {
        mesh.select_history_remap(&history);
    }
    debug!(count = verts_out.len(), "extrude_vert_indiv");
    op.set_output("verts.out", verts_out);
    op.set_output("edges.out", edges_out);
    Ok(())
}

/// Extrude edges into quads, sharing copied vertices between neighbours.
pub(super) fn extrude_edge_only(mesh: &mut Mesh, op: &mut BMOperator) -> BridgeResult<()> {
    let (_, edges, _) = split_elements(&op.elements_in("edges"));
    let dupe = duplicate_region(mesh, &BTreeSet::new(), &edges, &BTreeSet::new())?;

    let mut faces_out = Vec::with_capacity(edges.len());
    for e in &edges {
        let [v1, v2] = mesh.edge(*e)?.verts;
        // Continue the winding of an adjacent face if there is one.
        let runs_back = match mesh.faces_of_edge(*e)?.first() {
            Some(f) => mesh.face_runs_from(*f, v2, v1)?,
            None => false,
        };
        let (a, b) = if runs_back { (v1, v2) } else { (v2, v1) };
        let f = mesh.add_face(&[a, b, dupe.vert(b)?, dupe.vert(a)?])?;
        faces_out.push(ElemRef::Face(f));
    }

    if op.bool_in("use_select_history") {
        mesh.select_history_remap(&dupe.history_map());
    }
    let mut geom_out = dupe.new_elements();
    geom_out.extend(faces_out);
    debug!(edges = edges.len(), "extrude_edge_only");
    op.set_output("geom.out", geom_out);
    Ok(())
}

/// Extrude each face on its own, with its own copied vertices.
pub(super) fn extrude_discrete_faces(mesh: &mut Mesh, op: &mut BMOperator) -> BridgeResult<()> {
    let (_, _, faces) = split_elements(&op.elements_in("faces"));
    let mut faces_out = Vec::with_capacity(faces.len());
    let mut history = HashMap::new();
    for f in faces.iter().copied() {
        let loop_verts = mesh.face(f)?.verts.clone();
        let mut copies = Vec::with_capacity(loop_verts.len());
        for v in &loop_verts {
            let (co, no) = {
                let src = mesh.vert(*v)?;
                (src.co, src.no)
            };
            let copy = mesh.add_vert(co);
            mesh.vert_mut(copy)?.no = no;
            copies.push(copy);
        }
        let cap = mesh.add_face(&copies)?;
        let n = loop_verts.len();
        for i in 0..n {
            let j = (i + 1) % n;
            mesh.add_face(&[loop_verts[i], loop_verts[j], copies[j], copies[i]])?;
        }
        faces_out.push(ElemRef::Face(cap));
        history.insert(ElemRef::Face(f), ElemRef::Face(cap));
    }
    if op.bool_in("use_select_history") {
        mesh.select_history_remap(&history);
    }
    for f in &faces {
        mesh.remove_face(*f)?;
    }
    debug!(faces = faces_out.len(), "extrude_discrete_faces");
    op.set_output("faces.out", faces_out);
    Ok(())
}
