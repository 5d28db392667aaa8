//! Edge-case tests that cut across modules.

use crate::expand::expand_mesh;
use crate::simplify::{simplify_mesh, SimplifyParams};
use crate::types::{Mesh, Vertex};

fn single_triangle() -> Mesh {
    let mut mesh = Mesh::new();
    mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
    mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
    mesh.vertices.push(Vertex::from_coords(0.5, 1.0, 0.0));
    mesh.faces.push([0, 1, 2]);
    mesh
}

#[test]
fn simplify_empty_mesh() {
    let mesh = Mesh::new();
    let result = simplify_mesh(&mesh, &SimplifyParams::with_target_faces(5)).unwrap();
    assert_eq!(result.original_faces, 0);
    assert_eq!(result.final_faces, 0);
    assert!(result.mesh.is_empty());
}

#[test]
fn simplify_single_triangle_to_zero() {
    let mesh = single_triangle();
    let result = simplify_mesh(&mesh, &SimplifyParams::with_target_faces(0)).unwrap();
    // One edge contraction collapses the only face
    assert_eq!(result.final_faces, 0);
    assert_eq!(result.contractions_performed, 1);
    assert_eq!(result.mesh.vertex_count(), 2);
}

#[test]
fn simplify_target_above_face_count() {
    let mesh = single_triangle();
    let result = simplify_mesh(&mesh, &SimplifyParams::with_target_faces(100)).unwrap();
    assert_eq!(result.final_faces, 1);
    assert_eq!(result.contractions_performed, 0);
}

#[test]
fn round_trip_single_triangle() {
    let mesh = single_triangle();
    let mut params = SimplifyParams::with_target_faces(0);
    params.record_splits = true;

    let simplified = simplify_mesh(&mesh, &params).unwrap().mesh;
    assert_eq!(simplified.face_count(), 0);
    assert_eq!(simplified.split_count(), 1);

    let restored = expand_mesh(&simplified, 1).unwrap().mesh;
    assert_eq!(restored.face_count(), 1);
    assert_eq!(restored.vertex_count(), 3);
}

#[test]
fn expand_target_zero_replays_nothing() {
    let mesh = single_triangle();
    let mut params = SimplifyParams::with_target_faces(0);
    params.record_splits = true;
    let simplified = simplify_mesh(&mesh, &params).unwrap().mesh;

    let result = expand_mesh(&simplified, 0).unwrap();
    assert_eq!(result.splits_replayed, 0);
    assert_eq!(result.mesh.split_count(), 1);
}

#[test]
fn isolated_vertices_survive_simplification() {
    let mut mesh = single_triangle();
    mesh.vertices.push(Vertex::from_coords(9.0, 9.0, 9.0));

    let result = simplify_mesh(&mesh, &SimplifyParams::with_target_faces(1)).unwrap();
    // The isolated vertex is live and keeps its place in the output
    assert_eq!(result.mesh.vertex_count(), 4);
}
