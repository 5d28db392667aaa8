//! Progressive-mesh expansion.
//!
//! Replays vertex-split records to grow a simplified mesh back toward its
//! original resolution. Records are consumed front-to-back; each replay
//! restores the surviving vertex's pre-contraction position, re-materializes
//! the removed vertex, re-targets the faces that had been rewired onto the
//! survivor, and re-creates the faces that collapsed.

use std::collections::{HashSet, VecDeque};

use tracing::debug;

use crate::error::{MeshError, MeshResult};
use crate::tracing_ext::OperationTimer;
use crate::types::{Mesh, Vertex, VertexSplit, SPLIT_SENTINEL};

/// Result of progressive-mesh expansion.
#[derive(Debug, Clone)]
pub struct ExpandResult {
    /// The expanded mesh. Unconsumed split records are carried along; they
    /// stay valid because replay consumes strictly front-to-back.
    pub mesh: Mesh,
    /// Number of faces before expansion.
    pub original_faces: usize,
    /// Number of faces after expansion.
    pub final_faces: usize,
    /// Number of split records replayed.
    pub splits_replayed: usize,
}

/// Expand a mesh toward a target face count by replaying its split records.
///
/// Stops as soon as the face count reaches `target_faces` or the record
/// queue is exhausted, whichever comes first.
///
/// # Example
/// ```
/// use mesh_simplify::{expand_mesh, simplify_mesh, Mesh, SimplifyParams, Vertex};
///
/// let mut mesh = Mesh::new();
/// mesh.vertices.push(Vertex::from_coords(1.0, 1.0, 1.0));
/// mesh.vertices.push(Vertex::from_coords(1.0, -1.0, -1.0));
/// mesh.vertices.push(Vertex::from_coords(-1.0, 1.0, -1.0));
/// mesh.vertices.push(Vertex::from_coords(-1.0, -1.0, 1.0));
/// mesh.faces.push([0, 2, 1]);
/// mesh.faces.push([0, 1, 3]);
/// mesh.faces.push([1, 2, 3]);
/// mesh.faces.push([2, 0, 3]);
///
/// let mut params = SimplifyParams::with_target_faces(2);
/// params.record_splits = true;
/// let simplified = simplify_mesh(&mesh, &params).unwrap().mesh;
///
/// let restored = expand_mesh(&simplified, 4).unwrap();
/// assert_eq!(restored.mesh.face_count(), 4);
/// ```
pub fn expand_mesh(mesh: &Mesh, target_faces: usize) -> MeshResult<ExpandResult> {
    let _timer = OperationTimer::with_context("expand", mesh.face_count(), mesh.vertex_count());

    let original_faces = mesh.face_count();
    let mut vertices = mesh.vertices.clone();
    let mut faces = mesh.faces.clone();

    // Fresh incidence map, maintained incrementally through the replays.
    let mut incidence: Vec<HashSet<u32>> = vec![HashSet::new(); vertices.len()];
    for (face_id, face) in faces.iter().enumerate() {
        for &v in face {
            if v as usize >= vertices.len() {
                return Err(MeshError::InvalidVertexIndex {
                    face_index: face_id,
                    vertex_index: v,
                    vertex_count: vertices.len(),
                });
            }
            incidence[v as usize].insert(face_id as u32);
        }
    }

    let mut queue: VecDeque<VertexSplit> = mesh.splits.iter().cloned().collect();
    let mut splits_replayed = 0;

    while faces.len() < target_faces {
        let Some(split) = queue.pop_front() else {
            break;
        };
        replay_split(&split, &mut vertices, &mut faces, &mut incidence)?;
        splits_replayed += 1;
    }

    let final_faces = faces.len();
    debug!(
        original_faces,
        final_faces,
        splits_replayed,
        splits_remaining = queue.len(),
        "expansion finished"
    );

    Ok(ExpandResult {
        mesh: Mesh {
            vertices,
            faces,
            splits: queue.into_iter().collect(),
        },
        original_faces,
        final_faces,
        splits_replayed,
    })
}

/// Undo one contraction: re-introduce the removed vertex and its faces.
fn replay_split(
    split: &VertexSplit,
    vertices: &mut Vec<Vertex>,
    faces: &mut Vec<[u32; 3]>,
    incidence: &mut Vec<HashSet<u32>>,
) -> MeshResult<()> {
    let survivor = split.survivor;
    if survivor as usize >= vertices.len() {
        return Err(MeshError::InvalidTopology {
            details: format!(
                "split record references survivor {} but mesh has {} vertices",
                survivor,
                vertices.len()
            ),
        });
    }

    // Restore the survivor and re-materialize the removed vertex.
    vertices[survivor as usize].position = split.survivor_pos;
    let fresh = vertices.len() as u32;
    vertices.push(Vertex::new(split.split_pos));
    incidence.push(HashSet::new());

    // Faces incident to the survivor that were originally incident to the
    // removed vertex get their survivor slot re-targeted. The contraction
    // rewrote slots in place, so recorded and live faces line up
    // positionally: the sentinel slot must hold the survivor and the other
    // two slots must match exactly.
    let mut survivor_faces: Vec<u32> = incidence[survivor as usize].iter().copied().collect();
    survivor_faces.sort_unstable();
    for face_id in survivor_faces {
        let face = faces[face_id as usize];
        if let Some(slot) = transferred_slot(&face, survivor, split) {
            faces[face_id as usize][slot] = fresh;
            incidence[survivor as usize].remove(&face_id);
            incidence[fresh as usize].insert(face_id);
        }
    }

    // Recorded faces containing the survivor are the ones that collapsed at
    // contraction time; re-create them.
    for recorded in &split.faces {
        if !recorded.contains(&(survivor as i64)) {
            continue;
        }
        let face_id = faces.len() as u32;
        let mut face = [0u32; 3];
        for (slot, &index) in face.iter_mut().zip(recorded.iter()) {
            let index = if index == SPLIT_SENTINEL {
                fresh as i64
            } else {
                index
            };
            if index < 0 || index as usize >= vertices.len() {
                return Err(MeshError::InvalidTopology {
                    details: format!(
                        "split record references vertex {} but mesh has {} vertices",
                        index,
                        vertices.len()
                    ),
                });
            }
            *slot = index as u32;
        }
        faces.push(face);
        for &v in &face {
            incidence[v as usize].insert(face_id);
        }
    }

    Ok(())
}

/// Find the slot at which a live face matches one of the recorded faces:
/// the sentinel position must hold the survivor and the remaining two slots
/// must be equal position-for-position.
fn transferred_slot(face: &[u32; 3], survivor: u32, split: &VertexSplit) -> Option<usize> {
    for recorded in &split.faces {
        for slot in 0..3 {
            if recorded[slot] != SPLIT_SENTINEL || face[slot] != survivor {
                continue;
            }
            let others_match = (0..3)
                .filter(|&j| j != slot)
                .all(|j| recorded[j] == face[j] as i64);
            if others_match {
                return Some(slot);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simplify::{simplify_mesh, SimplifyParams};

    fn tetrahedron() -> Mesh {
        let mut mesh = Mesh::new();
        mesh.vertices.push(Vertex::from_coords(1.0, 1.0, 1.0));
        mesh.vertices.push(Vertex::from_coords(1.0, -1.0, -1.0));
        mesh.vertices.push(Vertex::from_coords(-1.0, 1.0, -1.0));
        mesh.vertices.push(Vertex::from_coords(-1.0, -1.0, 1.0));
        mesh.faces.push([0, 2, 1]);
        mesh.faces.push([0, 1, 3]);
        mesh.faces.push([1, 2, 3]);
        mesh.faces.push([2, 0, 3]);
        mesh
    }

    fn recording_params(target: usize) -> SimplifyParams {
        let mut params = SimplifyParams::with_target_faces(target);
        params.record_splits = true;
        params
    }

    /// Sorted positions, for comparing meshes whose vertex order differs.
    fn sorted_positions(mesh: &Mesh) -> Vec<[f64; 3]> {
        let mut positions: Vec<[f64; 3]> = mesh
            .vertices
            .iter()
            .map(|v| [v.position.x, v.position.y, v.position.z])
            .collect();
        positions.sort_by(|a, b| a.partial_cmp(b).expect("finite coordinates"));
        positions
    }

    #[test]
    fn test_round_trip_restores_tetrahedron() {
        let original = tetrahedron();
        let simplified = simplify_mesh(&original, &recording_params(2)).unwrap().mesh;
        assert!(simplified.face_count() <= 2);

        let restored = expand_mesh(&simplified, original.face_count())
            .unwrap()
            .mesh;
        assert_eq!(restored.face_count(), original.face_count());
        assert_eq!(restored.vertex_count(), original.vertex_count());
        assert!(restored.splits.is_empty());

        let original_positions = sorted_positions(&original);
        let restored_positions = sorted_positions(&restored);
        for (a, b) in original_positions.iter().zip(&restored_positions) {
            for (ca, cb) in a.iter().zip(b) {
                assert!((ca - cb).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_round_trip_after_full_collapse() {
        let original = tetrahedron();
        let simplified = simplify_mesh(&original, &recording_params(0)).unwrap().mesh;
        assert_eq!(simplified.face_count(), 0);

        let restored = expand_mesh(&simplified, 4).unwrap();
        assert_eq!(restored.final_faces, 4);
        assert_eq!(restored.mesh.vertex_count(), 4);

        let original_positions = sorted_positions(&original);
        let restored_positions = sorted_positions(&restored.mesh);
        assert_eq!(original_positions, restored_positions);
    }

    #[test]
    fn test_partial_expansion_keeps_remaining_splits() {
        let original = tetrahedron();
        let simplified = simplify_mesh(&original, &recording_params(0)).unwrap().mesh;
        let recorded = simplified.split_count();
        assert!(recorded >= 2);

        // Ask for barely more faces than we have; one replay suffices
        let partial = expand_mesh(&simplified, 1).unwrap();
        assert!(partial.final_faces >= 1);
        assert_eq!(partial.splits_replayed, 1);
        assert_eq!(partial.mesh.split_count(), recorded - 1);

        // The remainder replays cleanly from where it stopped
        let full = expand_mesh(&partial.mesh, 4).unwrap();
        assert_eq!(full.final_faces, 4);
        assert_eq!(sorted_positions(&full.mesh), sorted_positions(&original));
    }

    #[test]
    fn test_expand_without_splits_is_noop() {
        let mesh = tetrahedron();
        let result = expand_mesh(&mesh, 100).unwrap();
        assert_eq!(result.final_faces, 4);
        assert_eq!(result.splits_replayed, 0);
    }

    #[test]
    fn test_expand_stops_at_target() {
        let original = tetrahedron();
        let simplified = simplify_mesh(&original, &recording_params(0)).unwrap().mesh;

        let result = expand_mesh(&simplified, 2).unwrap();
        assert!(result.final_faces >= 2);
        assert!(result.mesh.split_count() > 0);
    }

    #[test]
    fn test_bad_survivor_index_is_rejected() {
        let mut mesh = tetrahedron();
        mesh.faces.truncate(1);
        mesh.splits.push(VertexSplit {
            survivor: 99,
            survivor_pos: nalgebra::Point3::origin(),
            split_pos: nalgebra::Point3::origin(),
            faces: Vec::new(),
        });

        let err = expand_mesh(&mesh, 10).unwrap_err();
        assert!(matches!(err, MeshError::InvalidTopology { .. }));
    }
}
