//! Pair-contraction mesh simplification with quadric error metrics.
//!
//! Reduces a triangle mesh to a target face count by repeatedly contracting
//! the vertex pair with the lowest quadric error, in the manner of Garland &
//! Heckbert. The error quadric of a merged vertex is the sum of its
//! ancestors' quadrics. With split recording enabled, every contraction
//! pushes a reversible [`VertexSplit`] record so the result can be expanded
//! back to higher resolutions.

use std::collections::{HashMap, HashSet};

use nalgebra::Point3;
use tracing::{debug, warn};

use crate::error::{MeshError, MeshResult};
use crate::pairs::{canonical, collect_distance_pairs, collect_edge_pairs, Pair, PairKey};
use crate::quadric::Quadric;
use crate::queue::PairQueue;
use crate::tracing_ext::OperationTimer;
use crate::types::{Mesh, Triangle, Vertex, VertexSplit, SPLIT_SENTINEL};

/// Parameters for mesh simplification.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "pipeline-config",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct SimplifyParams {
    /// Target number of faces. The loop stops at or just below this count,
    /// or earlier when no contractible pair remains.
    pub target_faces: usize,
    /// Record a vertex-split for every contraction so the result can be
    /// expanded back. Rejected when the input already carries splits.
    pub record_splits: bool,
    /// Treat degenerate (collinear) input faces as a fatal error instead of
    /// dropping them with a warning.
    pub strict: bool,
    /// When positive, also pair vertices strictly closer than this distance
    /// even if they share no edge. Default: 0 (edge pairs only).
    pub distance_threshold: f64,
}

impl Default for SimplifyParams {
    fn default() -> Self {
        Self {
            target_faces: 0,
            record_splits: false,
            strict: false,
            distance_threshold: 0.0,
        }
    }
}

impl SimplifyParams {
    /// Create params targeting a specific face count.
    pub fn with_target_faces(count: usize) -> Self {
        Self {
            target_faces: count,
            ..Default::default()
        }
    }
}

/// Result of mesh simplification.
#[derive(Debug, Clone)]
pub struct SimplifyResult {
    /// The simplified mesh, vertex indices compacted. Carries split records
    /// (in replay order) when recording was requested.
    pub mesh: Mesh,
    /// Number of faces in the original mesh.
    pub original_faces: usize,
    /// Number of faces in the simplified mesh.
    pub final_faces: usize,
    /// Number of pair contractions performed.
    pub contractions_performed: usize,
    /// Number of degenerate input faces dropped before simplification
    /// (always zero in strict mode).
    pub degenerate_faces_dropped: usize,
}

/// Simplify a mesh to a target face count using pair contraction.
///
/// Degenerate input faces are dropped with a warning (or rejected, in strict
/// mode) before quadrics are assembled; pairs are seeded from the surviving
/// faces. The contraction order is a total order by `(cost, v1, v2)`, so
/// identical inputs produce identical outputs.
///
/// # Example
/// ```
/// use mesh_simplify::{simplify_mesh, Mesh, SimplifyParams, Vertex};
///
/// let mut mesh = Mesh::new();
/// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(1.0, 1.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
/// mesh.faces.push([0, 1, 2]);
/// mesh.faces.push([0, 2, 3]);
///
/// let result = simplify_mesh(&mesh, &SimplifyParams::with_target_faces(1)).unwrap();
/// assert!(result.final_faces <= 1);
/// ```
pub fn simplify_mesh(mesh: &Mesh, params: &SimplifyParams) -> MeshResult<SimplifyResult> {
    let _timer = OperationTimer::with_context("simplify", mesh.face_count(), mesh.vertex_count());

    if params.record_splits && !mesh.splits.is_empty() {
        return Err(MeshError::IncompatibleOptions {
            details: format!(
                "cannot record splits: input mesh already carries {} split records",
                mesh.split_count()
            ),
        });
    }
    if !mesh.splits.is_empty() {
        warn!(
            splits = mesh.split_count(),
            "input split records are invalidated by simplification; dropping them"
        );
    }

    let original_faces = mesh.face_count();

    // Degenerate faces never contribute quadrics or pairs: strict mode
    // rejects them, non-strict drops them before assembly.
    let (kept_faces, degenerate_faces_dropped) = triage_faces(mesh, params.strict)?;

    let mut state = SimplifyState::new(mesh, kept_faces, params);

    let mut contractions_performed = 0;
    while state.live_faces > params.target_faces {
        let Some((v1, v2, cost)) = state.queue.pop_min() else {
            break;
        };
        debug!(v1, v2, cost, faces = state.live_faces, "contracting pair");
        state.contract(v1, v2);
        contractions_performed += 1;
    }

    let final_faces = state.live_faces;
    debug!(
        original_faces,
        final_faces, contractions_performed, "simplification finished"
    );

    Ok(SimplifyResult {
        mesh: state.into_mesh(),
        original_faces,
        final_faces,
        contractions_performed,
        degenerate_faces_dropped,
    })
}

/// Split the face list into non-degenerate faces and a dropped-face count.
/// In strict mode the first degenerate face is a fatal error.
fn triage_faces(mesh: &Mesh, strict: bool) -> MeshResult<(Vec<[u32; 3]>, usize)> {
    let mut kept = Vec::with_capacity(mesh.face_count());
    let mut dropped = 0;

    for (face_index, &face) in mesh.faces.iter().enumerate() {
        let tri = Triangle::new(
            mesh.vertices[face[0] as usize].position,
            mesh.vertices[face[1] as usize].position,
            mesh.vertices[face[2] as usize].position,
        );
        let degenerate =
            face[0] == face[1] || face[1] == face[2] || face[0] == face[2] || tri.is_degenerate();

        if degenerate {
            if strict {
                return Err(MeshError::DegenerateFace {
                    face_index,
                    indices: face,
                    positions: [
                        [tri.v0.x, tri.v0.y, tri.v0.z],
                        [tri.v1.x, tri.v1.y, tri.v1.z],
                        [tri.v2.x, tri.v2.y, tri.v2.z],
                    ],
                });
            }
            warn!(
                face = face_index,
                indices = ?face,
                "dropping degenerate face"
            );
            dropped += 1;
        } else {
            kept.push(face);
        }
    }

    Ok((kept, dropped))
}

/// Working tables of one simplification run.
///
/// Vertex and face indices are the load-time indices throughout; removal is
/// tombstoning (`live` / `Option` slots) and renumbering only happens in
/// [`SimplifyState::into_mesh`].
struct SimplifyState {
    positions: Vec<Point3<f64>>,
    live: Vec<bool>,
    quadrics: Vec<Quadric>,
    faces: Vec<Option<[u32; 3]>>,
    live_faces: usize,
    /// Face ids incident to each live vertex.
    incidence: Vec<HashSet<u32>>,
    /// Pair keys mentioning each live vertex.
    vertex_pairs: Vec<HashSet<PairKey>>,
    /// Pair store; holds the cached target and cost under the canonical key.
    pairs: HashMap<PairKey, Pair>,
    queue: PairQueue,
    record_splits: bool,
    /// Split records in contraction (LIFO) order; reversed on output.
    splits: Vec<VertexSplit>,
    /// The vertex removed by each contraction, parallel to `splits`.
    removed: Vec<u32>,
}

impl SimplifyState {
    fn new(mesh: &Mesh, kept_faces: Vec<[u32; 3]>, params: &SimplifyParams) -> Self {
        let vertex_count = mesh.vertex_count();
        let positions: Vec<Point3<f64>> = mesh.vertices.iter().map(|v| v.position).collect();

        let mut faces = Vec::with_capacity(kept_faces.len());
        let mut incidence = vec![HashSet::new(); vertex_count];
        let mut quadrics = vec![Quadric::default(); vertex_count];

        for (face_id, &face) in kept_faces.iter().enumerate() {
            faces.push(Some(face));
            let tri = Triangle::new(
                positions[face[0] as usize],
                positions[face[1] as usize],
                positions[face[2] as usize],
            );
            // Triage already removed degenerate faces; a missing plane here
            // would mean the face list changed under us.
            if let Some(plane) = Quadric::from_triangle(&tri) {
                for &v in &face {
                    incidence[v as usize].insert(face_id as u32);
                    quadrics[v as usize].add(&plane);
                }
            }
        }

        let mut keys = collect_edge_pairs(kept_faces.iter());
        if params.distance_threshold > 0.0 {
            let distance_pairs = collect_distance_pairs(&positions, params.distance_threshold);
            debug!(
                count = distance_pairs.len(),
                threshold = params.distance_threshold,
                "seeded distance pairs"
            );
            keys.extend(distance_pairs);
        }

        let mut state = Self {
            positions,
            live: vec![true; vertex_count],
            quadrics,
            faces,
            live_faces: kept_faces.len(),
            incidence,
            vertex_pairs: vec![HashSet::new(); vertex_count],
            pairs: HashMap::with_capacity(keys.len()),
            queue: PairQueue::new(),
            record_splits: params.record_splits,
            splits: Vec::new(),
            removed: Vec::new(),
        };

        for key in keys {
            state.admit_pair(key);
        }
        state
    }

    /// Solve a pair's target and cost and enter it into the queue, the pair
    /// store, and both endpoints' pair sets.
    fn admit_pair(&mut self, key: PairKey) {
        let (v1, v2) = key;
        let combined = self.quadrics[v1 as usize].sum(&self.quadrics[v2 as usize]);
        let pair = Pair::solve(
            v1,
            v2,
            &combined,
            &self.positions[v1 as usize],
            &self.positions[v2 as usize],
        );
        self.queue.insert(&pair);
        self.pairs.insert(key, pair);
        self.vertex_pairs[v1 as usize].insert(key);
        self.vertex_pairs[v2 as usize].insert(key);
    }

    /// Contract `v2` into `v1`. The pair must have just been popped from the
    /// queue; `(v1, v2)` is its canonical key.
    fn contract(&mut self, v1: u32, v2: u32) {
        let pair = self.pairs[&(v1, v2)];

        if self.record_splits {
            self.record_split(v1, v2);
        }

        // Move the survivor and fold the quadrics together.
        self.positions[v1 as usize] = pair.target;
        let q2 = self.quadrics[v2 as usize];
        self.quadrics[v1 as usize].add(&q2);

        // Rewire v2's faces to v1; faces containing both endpoints collapse.
        let v2_faces: Vec<u32> = self.incidence[v2 as usize].iter().copied().collect();
        let mut collapsed = Vec::new();
        for face_id in v2_faces {
            if self.incidence[v1 as usize].contains(&face_id) {
                collapsed.push(face_id);
            } else if let Some(face) = self.faces[face_id as usize].as_mut() {
                for slot in face.iter_mut() {
                    if *slot == v2 {
                        *slot = v1;
                    }
                }
                self.incidence[v1 as usize].insert(face_id);
            }
        }
        for face_id in collapsed {
            if let Some(face) = self.faces[face_id as usize].take() {
                self.live_faces -= 1;
                for v in face {
                    self.incidence[v as usize].remove(&face_id);
                }
            }
        }
        self.incidence[v2 as usize].clear();
        self.live[v2 as usize] = false;
        if self.record_splits {
            self.removed.push(v2);
        }

        // Every pair touching either endpoint leaves the queue, gets its
        // endpoints rewritten, and re-enters with a recomputed cost; the
        // contracted pair itself becomes a self-loop and is discarded.
        let mut affected: HashSet<PairKey> =
            std::mem::take(&mut self.vertex_pairs[v1 as usize]);
        affected.extend(std::mem::take(&mut self.vertex_pairs[v2 as usize]));

        let mut rewired: HashSet<PairKey> = HashSet::with_capacity(affected.len());
        for key in affected {
            if let Some(old) = self.pairs.remove(&key) {
                self.queue.remove(&old);
            }
            let (a, b) = key;
            for endpoint in [a, b] {
                if endpoint != v1 && endpoint != v2 {
                    self.vertex_pairs[endpoint as usize].remove(&key);
                }
            }
            let a = if a == v2 { v1 } else { a };
            let b = if b == v2 { v1 } else { b };
            if a == b {
                continue;
            }
            rewired.insert(canonical(a, b));
        }
        for key in rewired {
            self.admit_pair(key);
        }
    }

    /// Push the reversible record for contracting `v2` into `v1`. Runs
    /// before any mutation: it needs the old positions and v2's incidence.
    fn record_split(&mut self, v1: u32, v2: u32) {
        let mut face_ids: Vec<u32> = self.incidence[v2 as usize].iter().copied().collect();
        face_ids.sort_unstable();

        let mut recorded = Vec::with_capacity(face_ids.len());
        for face_id in face_ids {
            if let Some(face) = self.faces[face_id as usize] {
                recorded.push(face.map(|v| {
                    if v == v2 {
                        SPLIT_SENTINEL
                    } else {
                        v as i64
                    }
                }));
            }
        }

        self.splits.push(VertexSplit {
            survivor: v1,
            survivor_pos: self.positions[v1 as usize],
            split_pos: self.positions[v2 as usize],
            faces: recorded,
        });
    }

    /// Build the output mesh: compact surviving vertices (ascending original
    /// order), compact faces (original order), reverse the split stack into
    /// replay order, and translate every recorded index through the extended
    /// compaction map (removed vertices map to the future index they will
    /// occupy when their split is replayed).
    fn into_mesh(mut self) -> Mesh {
        let mut map = vec![u32::MAX; self.positions.len()];
        let mut vertices = Vec::new();
        for (index, &live) in self.live.iter().enumerate() {
            if live {
                map[index] = vertices.len() as u32;
                vertices.push(Vertex::new(self.positions[index]));
            }
        }

        let mut faces = Vec::with_capacity(self.live_faces);
        for face in self.faces.iter().flatten() {
            faces.push([
                map[face[0] as usize],
                map[face[1] as usize],
                map[face[2] as usize],
            ]);
        }

        self.splits.reverse();
        self.removed.reverse();
        let compact_count = vertices.len() as u32;
        for (ordinal, &removed) in self.removed.iter().enumerate() {
            map[removed as usize] = compact_count + ordinal as u32;
        }

        let mut splits = self.splits;
        for split in &mut splits {
            split.survivor = map[split.survivor as usize];
            for face in &mut split.faces {
                for slot in face.iter_mut() {
                    if *slot >= 0 {
                        *slot = map[*slot as usize] as i64;
                    }
                }
            }
        }

        Mesh {
            vertices,
            faces,
            splits,
        }
    }
}
