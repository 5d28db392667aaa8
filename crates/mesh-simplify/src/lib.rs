//! Quadric-error mesh simplification with progressive-mesh expansion.
//!
//! This crate reduces triangle meshes to a target face count by pair
//! contraction under the quadric error metric (Garland & Heckbert), and can
//! record the contractions as reversible vertex-split records so a
//! simplified mesh expands back to higher resolutions (a progressive mesh).
//!
//! # Features
//!
//! - **Simplification**: minimum-cost pair contraction driven by per-vertex
//!   error quadrics, with edge pairs and optional distance pairs
//! - **Progressive meshes**: reversible vertex-split recording and replay
//! - **File I/O**: a triangles-only `.obj` subset with `#vsplit` records
//!   embedded as comments, so progressive files stay valid `.obj`
//! - **Validation**: index and coordinate checks on load
//!
//! # Determinism
//!
//! Contraction order is a total order on `(cost, v1, v2)`. Two runs over the
//! same input with the same parameters produce identical meshes, identical
//! split sequences, and bytewise-identical output files.
//!
//! # Quick Start
//!
//! ```no_run
//! use mesh_simplify::Mesh;
//!
//! let mesh = Mesh::load("model.obj").unwrap();
//!
//! // Reduce to 1000 faces
//! let result = mesh.simplify_to_count(1000).unwrap();
//! println!(
//!     "{} -> {} faces in {} contractions",
//!     result.original_faces, result.final_faces, result.contractions_performed
//! );
//!
//! result.mesh.save("model_out.obj").unwrap();
//! ```
//!
//! # Progressive round trip
//!
//! ```no_run
//! use mesh_simplify::{Mesh, SimplifyParams};
//!
//! let mesh = Mesh::load("model.obj").unwrap();
//!
//! let mut params = SimplifyParams::with_target_faces(1000);
//! params.record_splits = true;
//! let simplified = mesh.simplify_with_params(&params).unwrap().mesh;
//! simplified.save("model_progressive.obj").unwrap();
//!
//! // Later: grow it back to 5000 faces
//! let coarse = Mesh::load("model_progressive.obj").unwrap();
//! let expanded = coarse.expand_to_count(5000).unwrap();
//! assert!(expanded.mesh.face_count() >= 5000 || expanded.mesh.splits.is_empty());
//! ```
//!
//! # Error Handling
//!
//! Operations return `MeshResult<T>`, which is `Result<T, MeshError>`.
//! Degenerate input faces are dropped with a warning by default and are
//! fatal with [`SimplifyParams::strict`]; singular cost solves are always
//! recovered internally and never surface.

mod error;
mod types;

#[cfg(test)]
mod edge_cases;

pub mod expand;
pub mod io;
pub mod pairs;
pub mod quadric;
pub mod queue;
pub mod simplify;
pub mod tracing_ext;
pub mod validate;

// Re-export core types at crate root
pub use error::{MeshError, MeshResult, ValidationIssue};
pub use types::{Mesh, Triangle, Vertex, VertexSplit, SPLIT_SENTINEL};

// Re-export commonly used functions
pub use expand::{expand_mesh, ExpandResult};
pub use io::{load_mesh, save_mesh, save_obj, MeshFormat};
pub use quadric::Quadric;
pub use simplify::{simplify_mesh, SimplifyParams, SimplifyResult};
pub use validate::{validate_mesh_data, DataValidationResult, ValidationOptions};

// Convenience methods on Mesh
impl Mesh {
    /// Load a mesh from a file, auto-detecting format from extension.
    pub fn load(path: impl AsRef<std::path::Path>) -> MeshResult<Self> {
        io::load_mesh(path.as_ref())
    }

    /// Save the mesh to a file, auto-detecting format from extension.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> MeshResult<()> {
        io::save_mesh(self, path.as_ref())
    }

    /// Simplify the mesh to a target face count with default options.
    ///
    /// For split recording, strict mode, or distance pairing, use
    /// `simplify_with_params`.
    pub fn simplify_to_count(&self, target_faces: usize) -> MeshResult<simplify::SimplifyResult> {
        simplify::simplify_mesh(self, &simplify::SimplifyParams::with_target_faces(target_faces))
    }

    /// Simplify the mesh with custom parameters.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_simplify::{Mesh, SimplifyParams, Vertex};
    ///
    /// let mut mesh = Mesh::new();
    /// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
    /// mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
    /// mesh.vertices.push(Vertex::from_coords(1.0, 1.0, 0.0));
    /// mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
    /// mesh.faces.push([0, 1, 2]);
    /// mesh.faces.push([0, 2, 3]);
    ///
    /// let mut params = SimplifyParams::with_target_faces(1);
    /// params.record_splits = true;
    /// let result = mesh.simplify_with_params(&params).unwrap();
    /// assert_eq!(result.mesh.split_count(), result.contractions_performed);
    /// ```
    pub fn simplify_with_params(
        &self,
        params: &simplify::SimplifyParams,
    ) -> MeshResult<simplify::SimplifyResult> {
        simplify::simplify_mesh(self, params)
    }

    /// Expand the mesh toward a target face count by replaying its split
    /// records.
    pub fn expand_to_count(&self, target_faces: usize) -> MeshResult<expand::ExpandResult> {
        expand::expand_mesh(self, target_faces)
    }
}
