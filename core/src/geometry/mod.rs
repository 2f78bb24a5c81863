use nalgebra as na;

pub type Point2 = na::Point2<f64>;
pub type Point3 = na::Point3<f64>;
pub type Vector3 = na::Vector3<f64>;
pub type Matrix3 = na::Matrix3<f64>;
pub type Matrix4 = na::Matrix4<f64>;

pub const EPSILON: f64 = 1e-6;

pub trait ApproxEq {
    fn approx_eq(&self, other: &Self) -> bool;
}

impl ApproxEq for f64 {
    fn approx_eq(&self, other: &Self) -> bool {
        (self - other).abs() < EPSILON
    }
}

impl ApproxEq for Point3 {
    fn approx_eq(&self, other: &Self) -> bool {
        na::distance_squared(self, other) < EPSILON * EPSILON
    }
}

impl ApproxEq for Vector3 {
    fn approx_eq(&self, other: &Self) -> bool {
        (self - other).norm_squared() < EPSILON * EPSILON
    }
}

pub mod utils_3d;
pub use utils_3d::*;

pub mod view;
pub use view::ViewState;

pub mod tessellation;
pub use tessellation::Tessellation;

/// Column `index` of a 4x4 matrix as a 3D vector (the X/Y/Z axis or translation).
pub fn matrix_axis(m: &Matrix4, index: usize) -> Vector3 {
    Vector3::new(m[(0, index)], m[(1, index)], m[(2, index)])
}

/// Upper-left 3x3 block (rotation and scale) of a 4x4 matrix.
pub fn matrix_linear(m: &Matrix4) -> Matrix3 {
    m.fixed_view::<3, 3>(0, 0).into_owned()
}

/// Inverse of `m`, falling back to identity for singular matrices.
pub fn invert_or_identity(m: &Matrix4) -> Matrix4 {
    m.try_inverse().unwrap_or_else(Matrix4::identity)
}
