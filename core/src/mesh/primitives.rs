//! Mesh primitives for seeding an edit session.

use super::{Mesh, MeshResult, VertId};
use crate::geometry::Point3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Primitive {
    /// Single quad in the XY plane, centered at the origin.
    Plane { size: f64 },
    /// Axis-aligned cube centered at the origin.
    Cube { size: f64 },
    /// `x_segments` by `y_segments` quads in the XY plane.
    Grid { x_segments: u32, y_segments: u32, size: f64 },
    /// Closed edge ring in the XY plane.
    Circle { segments: u32, radius: f64 },
    /// Open chain of `count` vertices along +X, spaced `spacing` apart.
    VertexLine { count: u32, spacing: f64 },
}

impl Primitive {
    pub fn build(&self) -> MeshResult<Mesh> {
        match *self {
            Primitive::Plane { size } => plane(size),
            Primitive::Cube { size } => cube(size),
            Primitive::Grid { x_segments, y_segments, size } => grid(x_segments, y_segments, size),
            Primitive::Circle { segments, radius } => circle(segments, radius),
            Primitive::VertexLine { count, spacing } => vertex_line(count, spacing),
        }
    }
}

pub fn plane(size: f64) -> MeshResult<Mesh> {
    grid(1, 1, size)
}

pub fn grid(x_segments: u32, y_segments: u32, size: f64) -> MeshResult<Mesh> {
    let mut mesh = Mesh::new();
    let nx = x_segments.max(1) as usize;
    let ny = y_segments.max(1) as usize;
    let half = size * 0.5;
    let mut ids: Vec<VertId> = Vec::with_capacity((nx + 1) * (ny + 1));
    for j in 0..=ny {
        for i in 0..=nx {
            let x = -half + size * i as f64 / nx as f64;
            let y = -half + size * j as f64 / ny as f64;
            ids.push(mesh.add_vert(Point3::new(x, y, 0.0)));
        }
    }
    let row = nx + 1;
    for j in 0..ny {
        for i in 0..nx {
            let a = ids[j * row + i];
            let b = ids[j * row + i + 1];
            let c = ids[(j + 1) * row + i + 1];
            let d = ids[(j + 1) * row + i];
            mesh.add_face(&[a, b, c, d])?;
        }
    }
    mesh.normals_update();
    Ok(mesh)
}

pub fn cube(size: f64) -> MeshResult<Mesh> {
    let mut mesh = Mesh::new();
    let h = size * 0.5;
    let v: Vec<VertId> = [
        (-h, -h, -h),
        (h, -h, -h),
        (h, h, -h),
        (-h, h, -h),
        (-h, -h, h),
        (h, -h, h),
        (h, h, h),
        (-h, h, h),
    ]
    .iter()
    .map(|&(x, y, z)| mesh.add_vert(Point3::new(x, y, z)))
    .collect();

    // Outward-facing loops.
    let faces: [[usize; 4]; 6] = [
        [0, 3, 2, 1], // bottom
        [4, 5, 6, 7], // top
        [0, 1, 5, 4], // front (-y)
        [1, 2, 6, 5], // right (+x)
        [2, 3, 7, 6], // back (+y)
        [3, 0, 4, 7], // left (-x)
    ];
    for f in faces {
        mesh.add_face(&[v[f[0]], v[f[1]], v[f[2]], v[f[3]]])?;
    }
    mesh.normals_update();
    Ok(mesh)
}

pub fn circle(segments: u32, radius: f64) -> MeshResult<Mesh> {
    let mut mesh = Mesh::new();
    let n = segments.max(3);
    let ids: Vec<VertId> = (0..n)
        .map(|i| {
            let t = std::f64::consts::TAU * i as f64 / n as f64;
            mesh.add_vert(Point3::new(radius * t.cos(), radius * t.sin(), 0.0))
        })
        .collect();
    for i in 0..ids.len() {
        mesh.add_edge(ids[i], ids[(i + 1) % ids.len()])?;
    }
    Ok(mesh)
}

pub fn vertex_line(count: u32, spacing: f64) -> MeshResult<Mesh> {
    let mut mesh = Mesh::new();
    let ids: Vec<VertId> = (0..count.max(1))
        .map(|i| mesh.add_vert(Point3::new(spacing * i as f64, 0.0, 0.0)))
        .collect();
    for pair in ids.windows(2) {
        mesh.add_edge(pair[0], pair[1])?;
    }
    Ok(mesh)
}
