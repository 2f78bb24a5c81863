use crate::geometry::{invert_or_identity, Matrix4, ViewState};
use crate::mesh::Mesh;
use crate::scene::SnapSurface;
use tracing::debug;

/// Move selected vertices onto the nearest snap surface under them, as seen
/// from the view. Returns how many vertices moved.
pub fn project_snap_verts(mesh: &mut Mesh, view: &ViewState, obmat: &Matrix4, surfaces: &[SnapSurface]) -> usize {
    let imat = invert_or_identity(obmat);
    let mut moved = 0;
    for v in mesh.selected_verts() {
        let Ok(vert) = mesh.vert_mut(v) else {
            continue;
        };
        let Some(mval) = view.project_object(obmat, &vert.co) else {
            continue;
        };
        let ray = view.ray_through(&mval);
        let hit = surfaces
            .iter()
            .filter_map(|s| s.ray_cast(&ray))
            .min_by(|a, b| a.0.total_cmp(&b.0));
        if let Some((_, co)) = hit {
            vert.co = imat.transform_point(&co);
            moved += 1;
        }
    }
    debug!(moved, "project_snap_verts");
    moved
}
