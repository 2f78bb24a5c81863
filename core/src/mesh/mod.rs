//! Boundary-representation edit mesh.
//!
//! Elements live in arenas addressed by typed ids. Removing an element
//! leaves a hole in its arena so ids handed out earlier stay valid (they
//! simply stop resolving). Adjacency (edges of a vertex, faces of an edge)
//! is maintained incrementally by the add/remove operations.

use crate::geometry::{polygon_normal, Point3, Vector3};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

pub mod primitives;
pub mod selection;
pub use selection::SelectMode;

#[cfg(test)]
mod tests_topology;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FaceId(pub u32);

/// A reference to any element of the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ElemRef {
    Vert(VertId),
    Edge(EdgeId),
    Face(FaceId),
}

impl ElemRef {
    pub fn kind(&self) -> ElemMask {
        match self {
            ElemRef::Vert(_) => ElemMask::VERT,
            ElemRef::Edge(_) => ElemMask::EDGE,
            ElemRef::Face(_) => ElemMask::FACE,
        }
    }
}

bitflags! {
    /// Element kinds, used to filter element sets.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ElemMask: u8 {
        const VERT = 1 << 0;
        const EDGE = 1 << 1;
        const FACE = 1 << 2;
        const ALL = Self::VERT.bits() | Self::EDGE.bits() | Self::FACE.bits();
    }
}

/// Per-element boolean flags an operation can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElemFlag {
    /// User selection.
    Select,
    /// Scratch tag for tools.
    Tag,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vert {
    pub co: Point3,
    pub no: Vector3,
    pub select: bool,
    pub tag: bool,
    edges: Vec<EdgeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub verts: [VertId; 2],
    pub select: bool,
    pub tag: bool,
    faces: Vec<FaceId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    /// Boundary loop, counter-clockwise around `no`.
    pub verts: Vec<VertId>,
    pub no: Vector3,
    pub select: bool,
    pub tag: bool,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshError {
    #[error("Invalid vertex reference: {0:?}")]
    InvalidVert(VertId),

    #[error("Invalid edge reference: {0:?}")]
    InvalidEdge(EdgeId),

    #[error("Invalid face reference: {0:?}")]
    InvalidFace(FaceId),

    #[error("Degenerate edge on {0:?}")]
    DegenerateEdge(VertId),

    #[error("Face needs at least 3 distinct vertices, got {0}")]
    DegenerateFace(usize),
}

pub type MeshResult<T> = Result<T, MeshError>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    verts: Vec<Option<Vert>>,
    edges: Vec<Option<Edge>>,
    faces: Vec<Option<Face>>,
    edge_lookup: HashMap<(VertId, VertId), EdgeId>,
    /// Most recently selected elements, oldest first.
    pub select_history: Vec<ElemRef>,
}

fn edge_key(a: VertId, b: VertId) -> (VertId, VertId) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    // ---------------------------------------------------------------------
    // Element access
    // ---------------------------------------------------------------------

    pub fn vert(&self, v: VertId) -> MeshResult<&Vert> {
        self.verts
            .get(v.0 as usize)
            .and_then(Option::as_ref)
            .ok_or(MeshError::InvalidVert(v))
    }

    pub fn vert_mut(&mut self, v: VertId) -> MeshResult<&mut Vert> {
        self.verts
            .get_mut(v.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(MeshError::InvalidVert(v))
    }

    pub fn edge(&self, e: EdgeId) -> MeshResult<&Edge> {
        self.edges
            .get(e.0 as usize)
            .and_then(Option::as_ref)
            .ok_or(MeshError::InvalidEdge(e))
    }

    pub fn edge_mut(&mut self, e: EdgeId) -> MeshResult<&mut Edge> {
        self.edges
            .get_mut(e.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(MeshError::InvalidEdge(e))
    }

    pub fn face(&self, f: FaceId) -> MeshResult<&Face> {
        self.faces
            .get(f.0 as usize)
            .and_then(Option::as_ref)
            .ok_or(MeshError::InvalidFace(f))
    }

    pub fn face_mut(&mut self, f: FaceId) -> MeshResult<&mut Face> {
        self.faces
            .get_mut(f.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(MeshError::InvalidFace(f))
    }

    pub fn contains(&self, elem: ElemRef) -> bool {
        match elem {
            ElemRef::Vert(v) => self.vert(v).is_ok(),
            ElemRef::Edge(e) => self.edge(e).is_ok(),
            ElemRef::Face(f) => self.face(f).is_ok(),
        }
    }

    pub fn verts(&self) -> impl Iterator<Item = (VertId, &Vert)> + '_ {
        self.verts
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.as_ref().map(|v| (VertId(i as u32), v)))
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|e| (EdgeId(i as u32), e)))
    }

    pub fn faces(&self) -> impl Iterator<Item = (FaceId, &Face)> + '_ {
        self.faces
            .iter()
            .enumerate()
            .filter_map(|(i, f)| f.as_ref().map(|f| (FaceId(i as u32), f)))
    }

    pub fn vert_ids(&self) -> Vec<VertId> {
        self.verts().map(|(id, _)| id).collect()
    }

    pub fn edge_ids(&self) -> Vec<EdgeId> {
        self.edges().map(|(id, _)| id).collect()
    }

    pub fn face_ids(&self) -> Vec<FaceId> {
        self.faces().map(|(id, _)| id).collect()
    }

    pub fn vert_count(&self) -> usize {
        self.verts().count()
    }

    pub fn edge_count(&self) -> usize {
        self.edges().count()
    }

    pub fn face_count(&self) -> usize {
        self.faces().count()
    }

    // ---------------------------------------------------------------------
    // Topology queries
    // ---------------------------------------------------------------------

    pub fn edges_of_vert(&self, v: VertId) -> MeshResult<&[EdgeId]> {
        Ok(&self.vert(v)?.edges)
    }

    pub fn faces_of_edge(&self, e: EdgeId) -> MeshResult<&[FaceId]> {
        Ok(&self.edge(e)?.faces)
    }

    pub fn edge_between(&self, a: VertId, b: VertId) -> Option<EdgeId> {
        self.edge_lookup.get(&edge_key(a, b)).copied()
    }

    /// An edge used by exactly one face.
    pub fn edge_is_boundary(&self, e: EdgeId) -> MeshResult<bool> {
        Ok(self.edge(e)?.faces.len() == 1)
    }

    /// An edge used by no face.
    pub fn edge_is_wire(&self, e: EdgeId) -> MeshResult<bool> {
        Ok(self.edge(e)?.faces.is_empty())
    }

    /// Edges around a face, in loop order (edge `i` runs from vertex `i` to `i + 1`).
    pub fn face_edges(&self, f: FaceId) -> MeshResult<Vec<EdgeId>> {
        let face = self.face(f)?;
        let n = face.verts.len();
        (0..n)
            .map(|i| {
                let a = face.verts[i];
                let b = face.verts[(i + 1) % n];
                self.edge_between(a, b).ok_or(MeshError::DegenerateEdge(a))
            })
            .collect()
    }

    /// Whether the face loop walks from `a` directly to `b`.
    pub fn face_runs_from(&self, f: FaceId, a: VertId, b: VertId) -> MeshResult<bool> {
        let face = self.face(f)?;
        let n = face.verts.len();
        Ok((0..n).any(|i| face.verts[i] == a && face.verts[(i + 1) % n] == b))
    }

    pub fn face_positions(&self, f: FaceId) -> MeshResult<Vec<Point3>> {
        self.face(f)?
            .verts
            .iter()
            .map(|v| self.vert(*v).map(|v| v.co))
            .collect()
    }

    pub fn face_center(&self, f: FaceId) -> MeshResult<Point3> {
        Ok(crate::geometry::points_centroid(&self.face_positions(f)?))
    }

    pub fn calc_face_normal(&self, f: FaceId) -> MeshResult<Vector3> {
        Ok(polygon_normal(&self.face_positions(f)?))
    }

    // ---------------------------------------------------------------------
    // Construction
    // ---------------------------------------------------------------------

    pub fn add_vert(&mut self, co: Point3) -> VertId {
        let id = VertId(self.verts.len() as u32);
        self.verts.push(Some(Vert {
            co,
            no: Vector3::zeros(),
            select: false,
            tag: false,
            edges: Vec::new(),
        }));
        id
    }

    /// Add an edge, or return the existing edge between the two vertices.
    pub fn add_edge(&mut self, a: VertId, b: VertId) -> MeshResult<EdgeId> {
        self.vert(a)?;
        self.vert(b)?;
        if a == b {
            return Err(MeshError::DegenerateEdge(a));
        }
        if let Some(e) = self.edge_between(a, b) {
            return Ok(e);
        }
        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(Some(Edge {
            verts: [a, b],
            select: false,
            tag: false,
            faces: Vec::new(),
        }));
        self.edge_lookup.insert(edge_key(a, b), id);
        self.vert_mut(a)?.edges.push(id);
        self.vert_mut(b)?.edges.push(id);
        Ok(id)
    }

    /// Add a face over an ordered vertex loop, creating missing edges.
    pub fn add_face(&mut self, verts: &[VertId]) -> MeshResult<FaceId> {
        let mut distinct = verts.to_vec();
        distinct.sort();
        distinct.dedup();
        if verts.len() < 3 || distinct.len() != verts.len() {
            return Err(MeshError::DegenerateFace(distinct.len()));
        }
        for v in verts {
            self.vert(*v)?;
        }
        let id = FaceId(self.faces.len() as u32);
        let n = verts.len();
        for i in 0..n {
            let e = self.add_edge(verts[i], verts[(i + 1) % n])?;
            self.edge_mut(e)?.faces.push(id);
        }
        let positions: Vec<Point3> = verts
            .iter()
            .map(|v| self.vert(*v).map(|v| v.co))
            .collect::<MeshResult<_>>()?;
        self.faces.push(Some(Face {
            verts: verts.to_vec(),
            no: polygon_normal(&positions),
            select: false,
            tag: false,
        }));
        Ok(id)
    }

    /// Reverse a face's winding and normal.
    pub fn face_flip(&mut self, f: FaceId) -> MeshResult<()> {
        let face = self.face_mut(f)?;
        face.verts.reverse();
        face.no = -face.no;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Removal
    // ---------------------------------------------------------------------

    /// Remove a face; its edges and vertices stay.
    pub fn remove_face(&mut self, f: FaceId) -> MeshResult<()> {
        let edges = self.face_edges(f)?;
        for e in edges {
            self.edge_mut(e)?.faces.retain(|x| *x != f);
        }
        self.faces[f.0 as usize] = None;
        self.select_history.retain(|h| *h != ElemRef::Face(f));
        Ok(())
    }

    /// Remove an edge together with the faces using it.
    pub fn remove_edge(&mut self, e: EdgeId) -> MeshResult<()> {
        let faces = self.edge(e)?.faces.clone();
        for f in faces {
            self.remove_face(f)?;
        }
        let [a, b] = self.edge(e)?.verts;
        self.vert_mut(a)?.edges.retain(|x| *x != e);
        self.vert_mut(b)?.edges.retain(|x| *x != e);
        self.edge_lookup.remove(&edge_key(a, b));
        self.edges[e.0 as usize] = None;
        self.select_history.retain(|h| *h != ElemRef::Edge(e));
        Ok(())
    }

    /// Remove a vertex together with every edge and face using it.
    pub fn remove_vert(&mut self, v: VertId) -> MeshResult<()> {
        let edges = self.vert(v)?.edges.clone();
        for e in edges {
            self.remove_edge(e)?;
        }
        self.verts[v.0 as usize] = None;
        self.select_history.retain(|h| *h != ElemRef::Vert(v));
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Flags & normals
    // ---------------------------------------------------------------------

    pub fn flag_test(&self, elem: ElemRef, flag: ElemFlag) -> bool {
        let pick = |select: bool, tag: bool| match flag {
            ElemFlag::Select => select,
            ElemFlag::Tag => tag,
        };
        match elem {
            ElemRef::Vert(v) => self.vert(v).map(|v| pick(v.select, v.tag)).unwrap_or(false),
            ElemRef::Edge(e) => self.edge(e).map(|e| pick(e.select, e.tag)).unwrap_or(false),
            ElemRef::Face(f) => self.face(f).map(|f| pick(f.select, f.tag)).unwrap_or(false),
        }
    }

    /// Every element whose kind is in `mask` and which carries `flag`, verts
    /// first, then edges, then faces.
    pub fn elements_with_flag(&self, mask: ElemMask, flag: ElemFlag) -> Vec<ElemRef> {
        let mut out = Vec::new();
        if mask.contains(ElemMask::VERT) {
            out.extend(self.verts().map(|(id, _)| ElemRef::Vert(id)));
        }
        if mask.contains(ElemMask::EDGE) {
            out.extend(self.edges().map(|(id, _)| ElemRef::Edge(id)));
        }
        if mask.contains(ElemMask::FACE) {
            out.extend(self.faces().map(|(id, _)| ElemRef::Face(id)));
        }
        out.retain(|elem| self.flag_test(*elem, flag));
        out
    }

    /// Recompute face normals, then vertex normals as the normalized sum of
    /// adjacent face normals. Vertices without faces keep their normal.
    pub fn normals_update(&mut self) {
        let face_ids = self.face_ids();
        for f in &face_ids {
            if let Ok(no) = self.calc_face_normal(*f) {
                if let Ok(face) = self.face_mut(*f) {
                    face.no = no;
                }
            }
        }

        let mut accum: HashMap<VertId, Vector3> = HashMap::new();
        for (_, face) in self.faces() {
            for v in &face.verts {
                *accum.entry(*v).or_insert_with(Vector3::zeros) += face.no;
            }
        }
        for (v, sum) in accum {
            if let Ok(vert) = self.vert_mut(v) {
                let len = sum.norm();
                if len > f64::EPSILON {
                    vert.no = sum / len;
                }
            }
        }
    }
}

/// A mesh in edit mode together with its selection granularity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditMesh {
    pub mesh: Mesh,
    pub select_mode: SelectMode,
}

impl EditMesh {
    pub fn new(mesh: Mesh, select_mode: SelectMode) -> Self {
        Self { mesh, select_mode }
    }
}
