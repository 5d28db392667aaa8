//! Property-based tests for simplification and expansion.
//!
//! These use proptest to generate jittered grid meshes and verify the
//! structural invariants and the progressive round trip.
//!
//! Run with: cargo test -p mesh-simplify --test proptest_simplify

use mesh_simplify::{expand_mesh, simplify_mesh, Mesh, SimplifyParams, Vertex};
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

/// Build an n x n grid surface with per-vertex z jitter. The xy projection of
/// every triangle is non-degenerate, so no jitter can make a face collinear.
fn grid_mesh(n: usize, z: &[f64]) -> Mesh {
    let mut mesh = Mesh::new();

    for row in 0..=n {
        for col in 0..=n {
            let jitter = z[row * (n + 1) + col];
            mesh.vertices
                .push(Vertex::from_coords(col as f64, row as f64, jitter));
        }
    }

    let stride = (n + 1) as u32;
    for row in 0..n as u32 {
        for col in 0..n as u32 {
            let v00 = row * stride + col;
            let v10 = v00 + 1;
            let v01 = v00 + stride;
            let v11 = v01 + 1;
            mesh.faces.push([v00, v10, v11]);
            mesh.faces.push([v00, v11, v01]);
        }
    }

    mesh
}

/// Strategy: a grid mesh (2..=5 cells per side) with jittered heights.
fn arb_grid_mesh() -> impl Strategy<Value = Mesh> {
    (2usize..=5).prop_flat_map(|n| {
        prop::collection::vec(-0.5..0.5f64, (n + 1) * (n + 1))
            .prop_map(move |z| grid_mesh(n, &z))
    })
}

/// Strategy: a grid mesh together with a face-count target below its size.
fn arb_mesh_and_target() -> impl Strategy<Value = (Mesh, usize)> {
    arb_grid_mesh().prop_flat_map(|mesh| {
        let faces = mesh.face_count();
        (Just(mesh), 0..faces)
    })
}

fn recording_params(target: usize) -> SimplifyParams {
    let mut params = SimplifyParams::with_target_faces(target);
    params.record_splits = true;
    params
}

fn sorted_positions(mesh: &Mesh) -> Vec<[f64; 3]> {
    let mut positions: Vec<[f64; 3]> = mesh
        .vertices
        .iter()
        .map(|v| [v.position.x, v.position.y, v.position.z])
        .collect();
    positions.sort_by(|a, b| a.partial_cmp(b).expect("finite coordinates"));
    positions
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    /// Simplification never increases the face count and the reported final
    /// count matches the output mesh.
    #[test]
    fn proptest_face_count_never_increases((mesh, target) in arb_mesh_and_target()) {
        let result = simplify_mesh(&mesh, &SimplifyParams::with_target_faces(target)).unwrap();
        prop_assert!(result.final_faces <= result.original_faces);
        prop_assert_eq!(result.mesh.face_count(), result.final_faces);
    }

    /// Every output face references three distinct, in-range vertices.
    #[test]
    fn proptest_output_faces_well_formed((mesh, target) in arb_mesh_and_target()) {
        let result = simplify_mesh(&mesh, &SimplifyParams::with_target_faces(target)).unwrap();
        for face in &result.mesh.faces {
            for &v in face {
                prop_assert!((v as usize) < result.mesh.vertex_count());
            }
            prop_assert!(face[0] != face[1] && face[1] != face[2] && face[0] != face[2]);
        }
    }

    /// Each contraction removes exactly one vertex, and with split recording
    /// the record count equals the contraction count.
    #[test]
    fn proptest_vertex_bookkeeping((mesh, target) in arb_mesh_and_target()) {
        let result = simplify_mesh(&mesh, &recording_params(target)).unwrap();
        prop_assert_eq!(
            result.mesh.vertex_count() + result.contractions_performed,
            mesh.vertex_count()
        );
        prop_assert_eq!(result.mesh.split_count(), result.contractions_performed);
    }

    /// Round trip: expanding a recorded simplification restores the original
    /// face count, vertex count, and every position.
    #[test]
    fn proptest_round_trip_restores_mesh((mesh, target) in arb_mesh_and_target()) {
        let simplified = simplify_mesh(&mesh, &recording_params(target)).unwrap().mesh;
        let restored = expand_mesh(&simplified, mesh.face_count()).unwrap();

        prop_assert_eq!(restored.final_faces, mesh.face_count());
        prop_assert_eq!(restored.mesh.vertex_count(), mesh.vertex_count());

        let original_positions = sorted_positions(&mesh);
        let restored_positions = sorted_positions(&restored.mesh);
        for (a, b) in original_positions.iter().zip(&restored_positions) {
            for (ca, cb) in a.iter().zip(b) {
                prop_assert!((ca - cb).abs() < 1e-9);
            }
        }
    }

    /// Determinism: identical inputs give identical meshes and splits.
    #[test]
    fn proptest_deterministic((mesh, target) in arb_mesh_and_target()) {
        let a = simplify_mesh(&mesh, &recording_params(target)).unwrap();
        let b = simplify_mesh(&mesh, &recording_params(target)).unwrap();

        prop_assert_eq!(&a.mesh.faces, &b.mesh.faces);
        prop_assert_eq!(&a.mesh.splits, &b.mesh.splits);
        prop_assert_eq!(a.mesh.vertex_count(), b.mesh.vertex_count());
        for (va, vb) in a.mesh.vertices.iter().zip(&b.mesh.vertices) {
            prop_assert_eq!(va.position, vb.position);
        }
    }

    /// Expansion stops exactly when the target is reached or records run out.
    #[test]
    fn proptest_expansion_stops_at_target(
        (mesh, target) in arb_mesh_and_target(),
        expand_target in 0usize..80,
    ) {
        let simplified = simplify_mesh(&mesh, &recording_params(target)).unwrap().mesh;
        let result = expand_mesh(&simplified, expand_target).unwrap();

        prop_assert!(
            result.final_faces >= expand_target || result.mesh.splits.is_empty()
        );
    }
}
