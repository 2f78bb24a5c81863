use super::{Matrix4, Point3, Vector3};
use crate::mesh::{ElemRef, Mesh};
use serde::{Deserialize, Serialize};

/// Render buffers for an edit mesh, in world space.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Tessellation {
    pub vertices: Vec<f32>, // Flattened x, y, z
    pub indices: Vec<u32>,  // Triangle indices
    pub normals: Vec<f32>,  // Flattened nx, ny, nz
    pub triangle_ids: Vec<ElemRef>, // Maps triangle index -> source face
    pub triangle_selected: Vec<bool>,

    // Edges
    pub line_indices: Vec<u32>, // Pairs of indices into vertices
    pub line_ids: Vec<ElemRef>,
    pub line_selected: Vec<bool>,

    // Vertices
    pub point_indices: Vec<u32>,
    pub point_ids: Vec<ElemRef>,
    pub point_selected: Vec<bool>,
}

impl Tessellation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fan-triangulate every face and emit lines for edges and points for
    /// vertices, all transformed by `obmat`.
    pub fn from_mesh(mesh: &Mesh, obmat: &Matrix4) -> Self {
        let mut tess = Self::new();
        let normal_mat = super::matrix_linear(obmat)
            .try_inverse()
            .map(|m| m.transpose())
            .unwrap_or_else(super::Matrix3::identity);

        for (id, face) in mesh.faces() {
            let points: Vec<Point3> = face
                .verts
                .iter()
                .filter_map(|v| mesh.vert(*v).ok())
                .map(|v| obmat.transform_point(&v.co))
                .collect();
            if points.len() < 3 {
                continue;
            }
            let no = (normal_mat * face.no).try_normalize(f64::EPSILON).unwrap_or_else(Vector3::z);
            for i in 1..points.len() - 1 {
                tess.add_triangle(points[0], points[i], points[i + 1], no, ElemRef::Face(id), face.select);
            }
        }

        for (id, edge) in mesh.edges() {
            let (Ok(a), Ok(b)) = (mesh.vert(edge.verts[0]), mesh.vert(edge.verts[1])) else {
                continue;
            };
            tess.add_line(
                obmat.transform_point(&a.co),
                obmat.transform_point(&b.co),
                ElemRef::Edge(id),
                edge.select,
            );
        }

        for (id, vert) in mesh.verts() {
            tess.add_point(obmat.transform_point(&vert.co), ElemRef::Vert(id), vert.select);
        }

        tess
    }

    fn push_vertex(&mut self, p: Point3, n: Vector3) -> u32 {
        let idx = (self.vertices.len() / 3) as u32;
        self.vertices.extend([p.x as f32, p.y as f32, p.z as f32]);
        self.normals.extend([n.x as f32, n.y as f32, n.z as f32]);
        idx
    }

    pub fn add_triangle(&mut self, p1: Point3, p2: Point3, p3: Point3, normal: Vector3, id: ElemRef, selected: bool) {
        let a = self.push_vertex(p1, normal);
        let b = self.push_vertex(p2, normal);
        let c = self.push_vertex(p3, normal);
        self.indices.extend([a, b, c]);
        self.triangle_ids.push(id);
        self.triangle_selected.push(selected);
    }

    pub fn add_line(&mut self, p1: Point3, p2: Point3, id: ElemRef, selected: bool) {
        // Normals are padded so the attribute arrays stay the same length.
        let a = self.push_vertex(p1, Vector3::y());
        let b = self.push_vertex(p2, Vector3::y());
        self.line_indices.extend([a, b]);
        self.line_ids.push(id);
        self.line_selected.push(selected);
    }

    pub fn add_point(&mut self, p: Point3, id: ElemRef, selected: bool) {
        let idx = self.push_vertex(p, Vector3::y());
        self.point_indices.push(idx);
        self.point_ids.push(id);
        self.point_selected.push(selected);
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}
