use crate::geometry::{ApproxEq, Point3, Vector3};
use crate::mesh::primitives::{cube, plane, vertex_line};
use crate::mesh::{ElemFlag, ElemMask, ElemRef, Mesh, MeshError, VertId};

#[test]
fn test_add_face_creates_shared_edges() {
    let mut mesh = Mesh::new();
    let a = mesh.add_vert(Point3::new(0.0, 0.0, 0.0));
    let b = mesh.add_vert(Point3::new(1.0, 0.0, 0.0));
    let c = mesh.add_vert(Point3::new(1.0, 1.0, 0.0));
    let d = mesh.add_vert(Point3::new(0.0, 1.0, 0.0));

    let f1 = mesh.add_face(&[a, b, c]).unwrap();
    let f2 = mesh.add_face(&[a, c, d]).unwrap();

    assert_eq!(mesh.edge_count(), 5);
    let diagonal = mesh.edge_between(a, c).expect("shared edge");
    assert_eq!(mesh.faces_of_edge(diagonal).unwrap(), &[f1, f2]);
    assert!(!mesh.edge_is_boundary(diagonal).unwrap());
    assert!(mesh.edge_is_boundary(mesh.edge_between(a, b).unwrap()).unwrap());
}

#[test]
fn test_degenerate_face_rejected() {
    let mut mesh = Mesh::new();
    let a = mesh.add_vert(Point3::origin());
    let b = mesh.add_vert(Point3::new(1.0, 0.0, 0.0));
    assert_eq!(mesh.add_face(&[a, b, a]), Err(MeshError::DegenerateFace(2)));
    assert_eq!(mesh.add_edge(a, a), Err(MeshError::DegenerateEdge(a)));
}

#[test]
fn test_cube_is_closed() {
    let mesh = cube(2.0).unwrap();
    assert_eq!(mesh.vert_count(), 8);
    assert_eq!(mesh.edge_count(), 12);
    assert_eq!(mesh.face_count(), 6);
    for (id, _) in mesh.edges() {
        assert_eq!(mesh.faces_of_edge(id).unwrap().len(), 2);
    }
}

#[test]
fn test_cube_normals_point_outwards() {
    let mesh = cube(2.0).unwrap();
    for (id, face) in mesh.faces() {
        let center = mesh.face_center(id).unwrap();
        assert!(face.no.dot(&center.coords) > 0.0, "face {:?} points inwards", id);
    }
    for (_, vert) in mesh.verts() {
        assert!(vert.no.approx_eq(&vert.co.coords.normalize()));
    }
}

#[test]
fn test_remove_vert_cascades() {
    let mut mesh = plane(2.0).unwrap();
    let v = VertId(0);
    mesh.remove_vert(v).unwrap();
    assert_eq!(mesh.vert_count(), 3);
    assert_eq!(mesh.edge_count(), 2);
    assert_eq!(mesh.face_count(), 0);
    assert!(!mesh.contains(ElemRef::Vert(v)));
    // Surviving ids still resolve.
    assert!(mesh.vert(VertId(3)).is_ok());
}

#[test]
fn test_remove_face_keeps_edges() {
    let mut mesh = plane(2.0).unwrap();
    let f = mesh.face_ids()[0];
    mesh.remove_face(f).unwrap();
    assert_eq!(mesh.face_count(), 0);
    assert_eq!(mesh.edge_count(), 4);
    for (id, _) in mesh.edges() {
        assert!(mesh.edge_is_wire(id).unwrap());
    }
}

#[test]
fn test_face_runs_from() {
    let mesh = plane(2.0).unwrap();
    let f = mesh.face_ids()[0];
    let loop_verts = mesh.face(f).unwrap().verts.clone();
    assert!(mesh.face_runs_from(f, loop_verts[0], loop_verts[1]).unwrap());
    assert!(!mesh.face_runs_from(f, loop_verts[1], loop_verts[0]).unwrap());
}

#[test]
fn test_elements_with_flag_filters_kind() {
    let mut mesh = vertex_line(3, 1.0).unwrap();
    mesh.vert_mut(VertId(1)).unwrap().tag = true;
    let tagged = mesh.elements_with_flag(ElemMask::ALL, ElemFlag::Tag);
    assert_eq!(tagged, vec![ElemRef::Vert(VertId(1))]);
    assert!(mesh.elements_with_flag(ElemMask::EDGE, ElemFlag::Tag).is_empty());
}

#[test]
fn test_plane_normal_is_up() {
    let mesh = plane(1.0).unwrap();
    let (_, face) = mesh.faces().next().unwrap();
    assert!(face.no.approx_eq(&Vector3::z()));
}
