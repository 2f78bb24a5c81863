//! 3D geometry utilities for mesh editing and manipulators.
//!
//! Plane and ray helpers, rotation construction and the signed-angle
//! measurements used by the spin manipulator.

use nalgebra as na;
use super::{Matrix3, Point2, Point3, Vector3, EPSILON};

// =============================================================================
// Plane Representation
// =============================================================================

/// A plane defined by a point and a unit normal.
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    pub origin: Point3,
    pub normal: Vector3,
}

impl Plane {
    /// Create a new plane from origin point and normal vector.
    pub fn new(origin: Point3, normal: Vector3) -> Self {
        Self {
            origin,
            normal: normal.normalize(),
        }
    }

    /// Plane from a unit normal and the `d` term of `n·p + d = 0`.
    pub fn from_normal_and_offset(normal: Vector3, d: f64) -> Self {
        let n = normal.normalize();
        Self {
            origin: Point3::from(n * -d),
            normal: n,
        }
    }

    /// The `d` term of the plane equation `n·p + d = 0`.
    pub fn offset(&self) -> f64 {
        -self.normal.dot(&self.origin.coords)
    }

    /// Signed distance from a point to this plane.
    /// Positive = point is on the side the normal points to.
    pub fn signed_distance(&self, point: &Point3) -> f64 {
        self.normal.dot(&(point - self.origin))
    }

    /// Closest point on this plane.
    pub fn project_point(&self, point: &Point3) -> Point3 {
        point - self.normal * self.signed_distance(point)
    }
}

// =============================================================================
// Ray Representation
// =============================================================================

/// A ray defined by an origin and direction.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Point3,
    pub direction: Vector3,
}

impl Ray {
    /// Create a new ray from origin and direction.
    pub fn new(origin: Point3, direction: Vector3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Get a point along the ray at parameter t.
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + self.direction * t
    }
}

/// Intersect the infinite line carrying `ray` with a plane.
/// Returns None only when the line is parallel to the plane.
pub fn line_plane_intersect(ray: &Ray, plane: &Plane) -> Option<Point3> {
    let denom = plane.normal.dot(&ray.direction);
    if denom.abs() < EPSILON {
        return None;
    }
    let t = plane.normal.dot(&(plane.origin - ray.origin)) / denom;
    Some(ray.at(t))
}

/// Ray-triangle intersection using Möller–Trumbore algorithm.
/// Returns Some((t, u, v)) where t is ray param, u,v are barycentric coords.
pub fn ray_triangle_intersect(
    ray: &Ray,
    v0: &Point3,
    v1: &Point3,
    v2: &Point3,
) -> Option<(f64, f64, f64)> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = ray.direction.cross(&edge2);
    let a = edge1.dot(&h);

    if a.abs() < EPSILON {
        return None; // Ray is parallel to triangle
    }

    let f = 1.0 / a;
    let s = ray.origin - v0;
    let u = f * s.dot(&h);

    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = f * ray.direction.dot(&q);

    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(&q);

    if t > EPSILON {
        Some((t, u, v))
    } else {
        None // Intersection is behind ray
    }
}

// =============================================================================
// Vector Operations
// =============================================================================

/// Remove the component of `v` along the unit vector `n`.
pub fn project_plane_normalized(v: &Vector3, n: &Vector3) -> Vector3 {
    v - n * v.dot(n)
}

/// Normalize, leaving zero-length vectors at zero instead of producing NaN.
pub fn normalize_or_zero(v: &Vector3) -> Vector3 {
    let len = v.norm();
    if len > f64::EPSILON {
        v / len
    } else {
        Vector3::zeros()
    }
}

/// Unsigned angle between two unit vectors.
pub fn angle_normalized(a: &Vector3, b: &Vector3) -> f64 {
    a.dot(b).clamp(-1.0, 1.0).acos()
}

/// Angle between `v1` and `v2` measured in the plane orthogonal to `axis`.
/// Negative when `v2 × v1` points against `axis`.
pub fn angle_signed_on_axis(v1: &Vector3, v2: &Vector3, axis: &Vector3) -> f64 {
    let axis_n = normalize_or_zero(axis);
    let v1_proj = normalize_or_zero(&project_plane_normalized(v1, &axis_n));
    let v2_proj = normalize_or_zero(&project_plane_normalized(v2, &axis_n));
    let angle = angle_normalized(&v1_proj, &v2_proj);
    if v2_proj.cross(&v1_proj).dot(axis) < 0.0 {
        -angle
    } else {
        angle
    }
}

/// Wrap an angle into `[-π, π)`.
pub fn angle_wrap(angle: f64) -> f64 {
    (angle + std::f64::consts::PI).rem_euclid(std::f64::consts::TAU) - std::f64::consts::PI
}

/// The equivalent of `angle` closest to `angle_compat`.
pub fn angle_compat(angle: f64, angle_compat: f64) -> f64 {
    angle_compat + angle_wrap(angle - angle_compat)
}

/// Which side of the 2D line `l1 -> l2` the point lies on (sign only).
pub fn line_point_side_2d(l1: &Point2, l2: &Point2, pt: &Point2) -> f64 {
    (l1.x - pt.x) * (l2.y - pt.y) - (l2.x - pt.x) * (l1.y - pt.y)
}

// =============================================================================
// Rotations
// =============================================================================

/// Right-handed rotation of `angle` radians about `axis`.
/// A zero axis yields identity.
pub fn axis_angle_to_mat3(axis: &Vector3, angle: f64) -> Matrix3 {
    match na::Unit::try_new(*axis, f64::EPSILON) {
        Some(unit) => na::Rotation3::from_axis_angle(&unit, angle).into_inner(),
        None => Matrix3::identity(),
    }
}

/// Two unit vectors completing an orthonormal basis with unit `n`.
pub fn ortho_basis(n: &Vector3) -> (Vector3, Vector3) {
    let f = n.x * n.x + n.y * n.y;
    if f > f64::EPSILON {
        let d = 1.0 / f.sqrt();
        let n1 = Vector3::new(n.y * d, -n.x * d, 0.0);
        let n2 = Vector3::new(-n.z * n1.y, n.z * n1.x, n.x * n1.y - n.y * n1.x);
        (n1, n2)
    } else {
        let x = if n.z < 0.0 { -1.0 } else { 1.0 };
        (Vector3::new(x, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0))
    }
}

/// Rotation matrix whose Z column is `z`; X and Y are an arbitrary stable basis.
pub fn rotation_from_z_axis(z: &Vector3) -> Matrix3 {
    let z = normalize_or_zero(z);
    let (x, y) = ortho_basis(&z);
    Matrix3::from_columns(&[x, y, z])
}

/// Rotation matrix with the given Y and Z columns, X completing the frame.
pub fn rotation_from_yz_axis(y: &Vector3, z: &Vector3) -> Matrix3 {
    let y = normalize_or_zero(y);
    let z = normalize_or_zero(z);
    let x = normalize_or_zero(&y.cross(&z));
    Matrix3::from_columns(&[x, y, z])
}

// =============================================================================
// Point Operations
// =============================================================================

/// Compute the centroid of a set of 3D points.
pub fn points_centroid(points: &[Point3]) -> Point3 {
    if points.is_empty() {
        return Point3::origin();
    }

    let sum: Vector3 = points.iter().map(|p| p.coords).sum();
    Point3::from(sum / points.len() as f64)
}

/// Newell normal of a polygon; zero for degenerate input.
pub fn polygon_normal(points: &[Point3]) -> Vector3 {
    let mut n = Vector3::zeros();
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        n.x += (p.y - q.y) * (p.z + q.z);
        n.y += (p.z - q.z) * (p.x + q.x);
        n.z += (p.x - q.x) * (p.y + q.y);
    }
    normalize_or_zero(&n)
}

// =============================================================================
// Tests
// =============================================================================
