use super::{split_elements, BMOperator, BridgeResult};
use crate::geometry::{invert_or_identity, Matrix4, Point3};
use crate::mesh::{EdgeId, ElemRef, FaceId, Mesh, MeshError, VertId};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Source to copy correspondence from [`duplicate_region`].
#[derive(Debug, Default)]
pub(super) struct DupeMap {
    pub verts: BTreeMap<VertId, VertId>,
    pub edges: BTreeMap<EdgeId, EdgeId>,
    pub faces: BTreeMap<FaceId, FaceId>,
}

impl DupeMap {
    pub fn vert(&self, v: VertId) -> BridgeResult<VertId> {
        Ok(self.verts.get(&v).copied().ok_or(MeshError::InvalidVert(v))?)
    }

    /// The copies, vertices first.
    pub fn new_elements(&self) -> Vec<ElemRef> {
        self.verts
            .values()
            .map(|v| ElemRef::Vert(*v))
            .chain(self.edges.values().map(|e| ElemRef::Edge(*e)))
            .chain(self.faces.values().map(|f| ElemRef::Face(*f)))
            .collect()
    }

    pub fn history_map(&self) -> HashMap<ElemRef, ElemRef> {
        self.verts
            .iter()
            .map(|(a, b)| (ElemRef::Vert(*a), ElemRef::Vert(*b)))
            .chain(self.edges.iter().map(|(a, b)| (ElemRef::Edge(*a), ElemRef::Edge(*b))))
            .chain(self.faces.iter().map(|(a, b)| (ElemRef::Face(*a), ElemRef::Face(*b))))
            .collect()
    }
}

/// Copy faces together with their edges and vertices, edges with their
/// vertices, and the given vertices.
pub(super) fn duplicate_region(
    mesh: &mut Mesh,
    verts: &BTreeSet<VertId>,
    edges: &BTreeSet<EdgeId>,
    faces: &BTreeSet<FaceId>,
) -> BridgeResult<DupeMap> {
    let mut all_edges = edges.clone();
    for f in faces {
        all_edges.extend(mesh.face_edges(*f)?);
    }
    let mut all_verts = verts.clone();
    for e in &all_edges {
        all_verts.extend(mesh.edge(*e)?.verts);
    }

    let mut map = DupeMap::default();
    for v in &all_verts {
        let (co, no) = {
            let src = mesh.vert(*v)?;
            (src.co, src.no)
        };
        let copy = mesh.add_vert(co);
        mesh.vert_mut(copy)?.no = no;
        map.verts.insert(*v, copy);
    }
    for e in &all_edges {
        let [a, b] = mesh.edge(*e)?.verts;
        let copy = mesh.add_edge(map.vert(a)?, map.vert(b)?)?;
        map.edges.insert(*e, copy);
    }
    for f in faces {
        let loop_verts = mesh
            .face(*f)?
            .verts
            .iter()
            .map(|v| map.vert(*v))
            .collect::<BridgeResult<Vec<_>>>()?;
        let copy = mesh.add_face(&loop_verts)?;
        map.faces.insert(*f, copy);
    }
    Ok(map)
}

/// `m` expressed in the coordinates `space` maps into.
fn in_space(m: Matrix4, space: Option<Matrix4>) -> Matrix4 {
    match space {
        Some(space) => invert_or_identity(&space) * m * space,
        None => m,
    }
}

fn transform_verts(mesh: &mut Mesh, elems: &[ElemRef], m: &Matrix4) -> BridgeResult<()> {
    let (verts, _, _) = split_elements(elems);
    for v in verts {
        let vert = mesh.vert_mut(v)?;
        vert.co = m.transform_point(&vert.co);
    }
    Ok(())
}

pub(super) fn translate(mesh: &mut Mesh, op: &mut BMOperator) -> BridgeResult<()> {
    let m = in_space(Matrix4::new_translation(&op.vector_in("vec")), op.matrix4_in("space"));
    transform_verts(mesh, &op.elements_in("verts"), &m)
}

/// Rotate about `cent` by the 3x3 `matrix`.
pub(super) fn rotate(mesh: &mut Mesh, op: &mut BMOperator) -> BridgeResult<()> {
    let cent = op.vector_in("cent");
    let pivot = Matrix4::new_translation(&cent)
        * op.matrix3_in("matrix").to_homogeneous()
        * Matrix4::new_translation(&-cent);
    let m = in_space(pivot, op.matrix4_in("space"));
    transform_verts(mesh, &op.elements_in("verts"), &m)
}

pub(super) fn create_vert(mesh: &mut Mesh, op: &mut BMOperator) -> BridgeResult<()> {
    let v = mesh.add_vert(Point3::from(op.vector_in("co")));
    op.set_output("vert.out", vec![ElemRef::Vert(v)]);
    Ok(())
}

pub(super) fn duplicate(mesh: &mut Mesh, op: &mut BMOperator) -> BridgeResult<()> {
    let (verts, edges, faces) = split_elements(&op.elements_in("geom"));
    let map = duplicate_region(mesh, &verts, &edges, &faces)?;
    if op.bool_in("use_select_history") {
        mesh.select_history_remap(&map.history_map());
    }
    op.set_output("geom.out", map.new_elements());
    Ok(())
}
