use super::*;
use crate::geometry::{ApproxEq, Point3, Vector3};
use crate::mesh::primitives::{cube, grid, plane, vertex_line};
use crate::mesh::ElemFlag;

fn all_geom(mesh: &Mesh) -> SlotValue {
    SlotValue::Elements(
        mesh.verts()
            .map(|(id, _)| ElemRef::Vert(id))
            .chain(mesh.edges().map(|(id, _)| ElemRef::Edge(id)))
            .chain(mesh.faces().map(|(id, _)| ElemRef::Face(id)))
            .collect(),
    )
}

#[test]
fn test_region_extrude_isolated_quad() {
    let mut mesh = plane(2.0).unwrap();
    let original = mesh.face_ids()[0];
    let geom = all_geom(&mesh);
    let op = call(&mut mesh, OpName::ExtrudeFaceRegion, vec![("geom", geom)]).unwrap();

    assert_eq!(mesh.vert_count(), 8);
    assert_eq!(mesh.edge_count(), 12);
    assert_eq!(mesh.face_count(), 6);

    let out = op.output("geom.out").unwrap();
    assert_eq!(out.iter().filter(|e| matches!(e, ElemRef::Vert(_))).count(), 4);
    assert_eq!(out.iter().filter(|e| matches!(e, ElemRef::Edge(_))).count(), 4);
    assert_eq!(out.iter().filter(|e| matches!(e, ElemRef::Face(_))).count(), 1);

    // The original stays behind as the flipped bottom cap.
    assert!(mesh.face(original).unwrap().no.approx_eq(&-Vector3::z()));
}

#[test]
fn test_region_extrude_side_faces_point_outwards() {
    let mut mesh = plane(2.0).unwrap();
    let geom = all_geom(&mesh);
    let op = call(&mut mesh, OpName::ExtrudeFaceRegion, vec![("geom", geom)]).unwrap();
    for elem in op.output("geom.out").unwrap() {
        if let ElemRef::Vert(v) = elem {
            mesh.vert_mut(*v).unwrap().co.z += 1.0;
        }
    }
    mesh.normals_update();
    for (id, face) in mesh.faces() {
        let center = mesh.face_center(id).unwrap();
        let from_middle = center - Point3::new(0.0, 0.0, 0.5);
        assert!(face.no.dot(&from_middle) > 0.0, "face {:?} points inwards", id);
    }
}

#[test]
fn test_region_extrude_attached_face_replaces_original() {
    let mut mesh = cube(2.0).unwrap();
    let top = mesh.face_ids()[1];
    let op = call(
        &mut mesh,
        OpName::ExtrudeFaceRegion,
        vec![("geom", SlotValue::Elements(vec![ElemRef::Face(top)]))],
    )
    .unwrap();

    assert!(mesh.face(top).is_err());
    assert_eq!(mesh.face_count(), 10);
    assert_eq!(mesh.vert_count(), 12);
    assert_eq!(mesh.edge_count(), 20);
    assert_eq!(op.output_filtered("geom.out", ElemMask::FACE).unwrap().len(), 1);
    // Closed again: every edge borders exactly two faces.
    for (id, _) in mesh.edges() {
        assert_eq!(mesh.faces_of_edge(id).unwrap().len(), 2);
    }
}

#[test]
fn test_region_extrude_interior_geometry_removed() {
    // Middle and right cells of a 3x1 strip.
    let mut mesh = grid(3, 1, 3.0).unwrap();
    let faces = mesh.face_ids();
    let shared = mesh
        .face_edges(faces[1])
        .unwrap()
        .into_iter()
        .find(|e| mesh.face_edges(faces[2]).unwrap().contains(e))
        .unwrap();
    call(
        &mut mesh,
        OpName::ExtrudeFaceRegion,
        vec![(
            "geom",
            SlotValue::Elements(vec![ElemRef::Face(faces[1]), ElemRef::Face(faces[2])]),
        )],
    )
    .unwrap();
    // The edge between the two input faces had no outside user.
    assert!(mesh.edge(shared).is_err());
    assert!(mesh.face(faces[0]).is_ok());
}

#[test]
fn test_region_extrude_excluded_edge_gets_no_side() {
    let mut mesh = plane(2.0).unwrap();
    let excluded = mesh.edge_ids()[0];
    let mut op = BMOperator::init(&mesh, OpName::ExtrudeFaceRegion);
    op.set("geom", all_geom(&mesh)).unwrap();
    op.set_insert("edges_exclude", ElemRef::Edge(excluded)).unwrap();
    op.set_insert("edges_exclude", ElemRef::Edge(excluded)).unwrap();
    op.exec(&mut mesh);
    op.finish(&mut mesh).unwrap();
    assert_eq!(mesh.face_count(), 5);
    assert_eq!(mesh.faces_of_edge(excluded).unwrap().len(), 1);
}

#[test]
fn test_region_extrude_removes_excluded_edge_left_as_wire() {
    let mut mesh = grid(2, 1, 2.0).unwrap();
    let left = mesh.face_ids()[0];
    let verts = mesh.vert_ids();
    // Left border of the strip, x = -1.
    let seam = mesh.edge_between(verts[0], verts[3]).unwrap();

    let mut op = BMOperator::init(&mesh, OpName::ExtrudeFaceRegion);
    op.set("geom", SlotValue::Elements(vec![ElemRef::Face(left)])).unwrap();
    op.set_insert("edges_exclude", ElemRef::Edge(seam)).unwrap();
    op.exec(&mut mesh);
    op.finish(&mut mesh).unwrap();

    assert!(mesh.edge(seam).is_err());
    // Its corners still carry the top and bottom borders.
    assert!(mesh.vert(verts[0]).is_ok());
    assert!(mesh.vert(verts[3]).is_ok());
    assert_eq!(mesh.face_count(), 5);
    assert_eq!(mesh.edge_count(), 14);
    for (id, _) in mesh.edges() {
        assert!(!mesh.edge_is_wire(id).unwrap());
    }
}

#[test]
fn test_region_extrude_lone_vertex_and_wire_edge() {
    let mut mesh = vertex_line(1, 1.0).unwrap();
    call(
        &mut mesh,
        OpName::ExtrudeFaceRegion,
        vec![("geom", SlotValue::Elements(vec![ElemRef::Vert(VertId(0))]))],
    )
    .unwrap();
    assert_eq!(mesh.vert_count(), 2);
    assert_eq!(mesh.edge_count(), 1);

    let mut mesh = vertex_line(2, 1.0).unwrap();
    let geom = all_geom(&mesh);
    call(&mut mesh, OpName::ExtrudeFaceRegion, vec![("geom", geom)]).unwrap();
    assert_eq!(mesh.vert_count(), 4);
    assert_eq!(mesh.edge_count(), 4);
    assert_eq!(mesh.face_count(), 1);
}

#[test]
fn test_region_extrude_remaps_history() {
    let mut mesh = plane(2.0).unwrap();
    let f = mesh.face_ids()[0];
    mesh.select_history_store(ElemRef::Face(f));
    let geom = all_geom(&mesh);
    let op = call(
        &mut mesh,
        OpName::ExtrudeFaceRegion,
        vec![("geom", geom), ("use_select_history", SlotValue::Bool(true))],
    )
    .unwrap();
    let cap = op.output_filtered("geom.out", ElemMask::FACE).unwrap();
    assert_eq!(mesh.select_history, cap);
}

#[test]
fn test_vert_indiv_outputs() {
    let mut mesh = vertex_line(3, 1.0).unwrap();
    let op = call(
        &mut mesh,
        OpName::ExtrudeVertIndiv,
        vec![(
            "verts",
            SlotValue::Elements(vec![ElemRef::Vert(VertId(0)), ElemRef::Vert(VertId(2))]),
        )],
    )
    .unwrap();
    assert_eq!(op.output("verts.out").unwrap().len(), 2);
    assert_eq!(op.output("edges.out").unwrap().len(), 2);
    assert_eq!(mesh.vert_count(), 5);
    assert_eq!(mesh.edge_count(), 4);
}

#[test]
fn test_edge_only_continues_face_winding() {
    let mut mesh = plane(2.0).unwrap();
    let edge = mesh.edge_ids()[0];
    let [a, b] = mesh.edge(edge).unwrap().verts;
    let plane_face = mesh.face_ids()[0];
    let plane_runs_ab = mesh.face_runs_from(plane_face, a, b).unwrap();

    let op = call(
        &mut mesh,
        OpName::ExtrudeEdgeOnly,
        vec![("edges", SlotValue::Elements(vec![ElemRef::Edge(edge)]))],
    )
    .unwrap();
    let new_faces = op.output_filtered("geom.out", ElemMask::FACE).unwrap();
    assert_eq!(new_faces.len(), 1);
    let ElemRef::Face(side) = new_faces[0] else { panic!("expected a face") };
    assert_eq!(mesh.face_runs_from(side, a, b).unwrap(), !plane_runs_ab);
    assert_eq!(op.output_filtered("geom.out", ElemMask::VERT).unwrap().len(), 2);
}

#[test]
fn test_edge_only_shares_copied_verts() {
    let mut mesh = vertex_line(3, 1.0).unwrap();
    let edges: Vec<ElemRef> = mesh.edge_ids().into_iter().map(ElemRef::Edge).collect();
    call(&mut mesh, OpName::ExtrudeEdgeOnly, vec![("edges", SlotValue::Elements(edges))]).unwrap();
    assert_eq!(mesh.vert_count(), 6);
    assert_eq!(mesh.face_count(), 2);
}

#[test]
fn test_discrete_faces() {
    let mut mesh = grid(2, 1, 2.0).unwrap();
    let faces: Vec<ElemRef> = mesh.face_ids().into_iter().map(ElemRef::Face).collect();
    let op = call(&mut mesh, OpName::ExtrudeDiscreteFaces, vec![("faces", SlotValue::Elements(faces))]).unwrap();
    assert_eq!(op.output("faces.out").unwrap().len(), 2);
    assert_eq!(mesh.face_count(), 10);
    assert_eq!(mesh.vert_count(), 14);
}

#[test]
fn test_failed_exec_rolls_back() {
    let mut mesh = plane(2.0).unwrap();
    mesh.select_all();
    let mut op = BMOperator::init(&mesh, OpName::ExtrudeFaceRegion);
    op.set(
        "geom",
        SlotValue::Elements(vec![ElemRef::Face(FaceId(0)), ElemRef::Vert(VertId(99))]),
    )
    .unwrap();
    mesh.deselect_all();
    op.exec(&mut mesh);
    assert!(op.failed());
    assert!(op.output("geom.out").unwrap().is_empty());
    let err = op.finish(&mut mesh).unwrap_err();
    assert_eq!(err, BridgeError::Mesh(MeshError::InvalidVert(VertId(99))));
    assert_eq!(mesh.face_count(), 1);
    assert_eq!(mesh.selected_count(ElemMask::ALL), 9);
}

#[test]
fn test_slot_validation() {
    let mut op = BMOperator::new(OpName::Translate);
    assert!(matches!(
        op.set("geom", SlotValue::Elements(Vec::new())),
        Err(BridgeError::UnknownSlot { .. })
    ));
    assert!(matches!(
        op.set("vec", SlotValue::Float(1.0)),
        Err(BridgeError::SlotType { expected: SlotKind::Vector, .. })
    ));
    assert_eq!(OpName::from_name("spin"), Ok(OpName::Spin));
    assert!(OpName::from_name("bevel").is_err());
}

#[test]
fn test_translate_in_space() {
    let mut mesh = vertex_line(1, 1.0).unwrap();
    let space = Matrix4::new_scaling(2.0);
    let tagged = SlotValue::from_flag(&mesh, ElemMask::VERT, ElemFlag::Tag);
    call(
        &mut mesh,
        OpName::Translate,
        vec![
            ("vec", SlotValue::Vector(Vector3::new(2.0, 0.0, 0.0))),
            ("verts", tagged),
            ("space", SlotValue::Matrix4(space)),
        ],
    )
    .unwrap();
    // Nothing tagged, nothing moved.
    assert!(mesh.vert(VertId(0)).unwrap().co.approx_eq(&Point3::origin()));

    call(
        &mut mesh,
        OpName::Translate,
        vec![
            ("vec", SlotValue::Vector(Vector3::new(2.0, 0.0, 0.0))),
            ("verts", SlotValue::Elements(vec![ElemRef::Vert(VertId(0))])),
            ("space", SlotValue::Matrix4(space)),
        ],
    )
    .unwrap();
    assert!(mesh.vert(VertId(0)).unwrap().co.approx_eq(&Point3::new(1.0, 0.0, 0.0)));
}

#[test]
fn test_rotate_about_center() {
    let mut mesh = vertex_line(1, 1.0).unwrap();
    mesh.vert_mut(VertId(0)).unwrap().co = Point3::new(2.0, 1.0, 0.0);
    let rot = crate::geometry::axis_angle_to_mat3(&Vector3::z(), std::f64::consts::FRAC_PI_2);
    call(
        &mut mesh,
        OpName::Rotate,
        vec![
            ("cent", SlotValue::Vector(Vector3::new(1.0, 1.0, 0.0))),
            ("matrix", SlotValue::Matrix3(rot)),
            ("verts", SlotValue::Elements(vec![ElemRef::Vert(VertId(0))])),
        ],
    )
    .unwrap();
    assert!(mesh.vert(VertId(0)).unwrap().co.approx_eq(&Point3::new(1.0, 2.0, 0.0)));
}

#[test]
fn test_create_vert_and_duplicate() {
    let mut mesh = Mesh::new();
    let op = call(
        &mut mesh,
        OpName::CreateVert,
        vec![("co", SlotValue::Vector(Vector3::new(1.0, 2.0, 3.0)))],
    )
    .unwrap();
    assert_eq!(op.output("vert.out").unwrap(), &[ElemRef::Vert(VertId(0))]);

    let mut mesh = plane(1.0).unwrap();
    let geom = SlotValue::Elements(vec![ElemRef::Face(FaceId(0))]);
    let op = call(&mut mesh, OpName::Duplicate, vec![("geom", geom)]).unwrap();
    assert_eq!(op.output("geom.out").unwrap().len(), 9);
    assert_eq!(mesh.face_count(), 2);
}
