//! Viewport projection for a 3D region.
//!
//! Region coordinates are pixels with the origin at the bottom-left corner,
//! matching the mouse positions carried by cursor events.

use serde::{Deserialize, Serialize};
use super::{invert_or_identity, line_plane_intersect, matrix_axis, Matrix4, Plane, Point2, Point3, Ray, Vector3};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewState {
    /// World to view (camera) space.
    pub view_matrix: Matrix4,
    /// View to clip space.
    pub window_matrix: Matrix4,
    /// Region size in pixels.
    pub width: f64,
    pub height: f64,
    /// Manipulator groups are only attached while this is set.
    pub show_gizmos: bool,
}

impl ViewState {
    pub fn new(view_matrix: Matrix4, window_matrix: Matrix4, width: f64, height: f64) -> Self {
        Self {
            view_matrix,
            window_matrix,
            width,
            height,
            show_gizmos: true,
        }
    }

    /// Orthographic view looking from `eye` at `target`, showing `extent`
    /// world units vertically.
    pub fn orthographic(eye: Point3, target: Point3, up: Vector3, extent: f64, width: f64, height: f64) -> Self {
        let aspect = width / height;
        let half_h = extent * 0.5;
        let half_w = half_h * aspect;
        let view = Matrix4::look_at_rh(&eye, &target, &up);
        let window = Matrix4::new_orthographic(-half_w, half_w, -half_h, half_h, 0.01, 1000.0);
        Self::new(view, window, width, height)
    }

    /// Perspective view with vertical field of view `fovy` (radians).
    pub fn perspective(eye: Point3, target: Point3, up: Vector3, fovy: f64, width: f64, height: f64) -> Self {
        let view = Matrix4::look_at_rh(&eye, &target, &up);
        let window = Matrix4::new_perspective(width / height, fovy, 0.01, 1000.0);
        Self::new(view, window, width, height)
    }

    /// View to world.
    pub fn view_inverse(&self) -> Matrix4 {
        invert_or_identity(&self.view_matrix)
    }

    /// World to clip.
    pub fn persp_matrix(&self) -> Matrix4 {
        self.window_matrix * self.view_matrix
    }

    /// Clip to world.
    pub fn persp_inverse(&self) -> Matrix4 {
        invert_or_identity(&self.persp_matrix())
    }

    /// View axis `index` (0 = right, 1 = up, 2 = towards the viewer) in world space.
    pub fn view_axis(&self, index: usize) -> Vector3 {
        matrix_axis(&self.view_inverse(), index)
    }

    /// Project a world-space point into region pixels.
    /// Returns None when the point sits on the camera plane.
    pub fn project(&self, world: &Point3) -> Option<Point2> {
        let clip = self.persp_matrix() * world.to_homogeneous();
        if clip.w.abs() < f64::EPSILON {
            return None;
        }
        let ndc_x = clip.x / clip.w;
        let ndc_y = clip.y / clip.w;
        Some(Point2::new(
            (ndc_x + 1.0) * 0.5 * self.width,
            (ndc_y + 1.0) * 0.5 * self.height,
        ))
    }

    /// Project an object-space point through the object's transform.
    pub fn project_object(&self, object_matrix: &Matrix4, local: &Point3) -> Option<Point2> {
        self.project(&object_matrix.transform_point(local))
    }

    /// World-space ray through a region pixel, pointing into the scene.
    pub fn ray_through(&self, mval: &Point2) -> Ray {
        let persinv = self.persp_inverse();
        let ndc_x = 2.0 * mval.x / self.width - 1.0;
        let ndc_y = 2.0 * mval.y / self.height - 1.0;
        let near = persinv.transform_point(&Point3::new(ndc_x, ndc_y, -1.0));
        let far = persinv.transform_point(&Point3::new(ndc_x, ndc_y, 1.0));
        Ray::new(near, far - near)
    }

    /// Point under the mouse at the view depth of `depth` (world space).
    pub fn win_to_3d(&self, depth: &Point3, mval: &Point2) -> Point3 {
        let plane = Plane::new(*depth, self.view_axis(2));
        line_plane_intersect(&self.ray_through(mval), &plane).unwrap_or(*depth)
    }
}
