//! Core mesh data types.

use nalgebra::{Point3, Vector3};

/// Slot marker in a recorded split face for the vertex that was folded away.
///
/// The expander substitutes the index of the re-materialized vertex; the
/// serializer resolves it to that vertex's future 1-based index.
pub const SPLIT_SENTINEL: i64 = -1;

/// A vertex in the mesh.
///
/// Positions are double precision and unit-agnostic. Vertex indices are
/// stable for the lifetime of a simplification run; renumbering only happens
/// in the final compaction pass when the output mesh is built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// 3D position.
    pub position: Point3<f64>,
}

impl Vertex {
    /// Create a new vertex at the given position.
    #[inline]
    pub fn new(position: Point3<f64>) -> Self {
        Self { position }
    }

    /// Create a vertex from raw coordinates.
    #[inline]
    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }
}

/// A reversible record of one pair contraction.
///
/// Replaying the record re-introduces the removed vertex and the faces that
/// vanished with it. `faces` holds the triangles that were incident to the
/// removed vertex at the moment of contraction, with the removed vertex's
/// slot marked by [`SPLIT_SENTINEL`]; slot order is preserved so the expander
/// can match records against live faces positionally.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexSplit {
    /// Index of the vertex that survived the contraction.
    pub survivor: u32,

    /// Position of the survivor before the contraction moved it.
    pub survivor_pos: Point3<f64>,

    /// Position of the vertex that was folded away.
    pub split_pos: Point3<f64>,

    /// Triangles incident to the removed vertex at contraction time,
    /// sentinel-marked, in ascending face-id order.
    pub faces: Vec<[i64; 3]>,
}

/// A triangle mesh with indexed vertices, faces, and optional split records.
///
/// `splits` is kept in replay order: the front record is the first one the
/// expander consumes (the last contraction the simplifier performed).
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// Vertex data.
    pub vertices: Vec<Vertex>,

    /// Triangle faces as indices into the vertex array.
    /// Each face is [v0, v1, v2]; the ordering carries the front-face normal.
    pub faces: Vec<[u32; 3]>,

    /// Vertex-split records, front-to-back in replay order. Empty unless the
    /// mesh came out of a split-recording simplification or a file that
    /// carried `#vsplit` records.
    pub splits: Vec<VertexSplit>,
}

impl Mesh {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh with pre-allocated capacity.
    pub fn with_capacity(vertex_count: usize, face_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            faces: Vec::with_capacity(face_count),
            splits: Vec::new(),
        }
    }

    /// Number of vertices in the mesh.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of faces (triangles) in the mesh.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Number of split records carried by the mesh.
    #[inline]
    pub fn split_count(&self) -> usize {
        self.splits.len()
    }

    /// Check if mesh is empty (no vertices or faces).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Compute the axis-aligned bounding box.
    /// Returns (min_corner, max_corner) or None if mesh is empty.
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        if self.vertices.is_empty() {
            return None;
        }

        let mut min = self.vertices[0].position;
        let mut max = self.vertices[0].position;

        for vertex in &self.vertices[1..] {
            let p = &vertex.position;
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }

        Some((min, max))
    }

    /// Iterate over triangles, yielding Triangle structs with actual vertex data.
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.faces.iter().map(|&[i0, i1, i2]| Triangle {
            v0: self.vertices[i0 as usize].position,
            v1: self.vertices[i1 as usize].position,
            v2: self.vertices[i2 as usize].position,
        })
    }

    /// Get a specific triangle by face index.
    pub fn triangle(&self, face_idx: usize) -> Option<Triangle> {
        self.faces.get(face_idx).map(|&[i0, i1, i2]| Triangle {
            v0: self.vertices[i0 as usize].position,
            v1: self.vertices[i1 as usize].position,
            v2: self.vertices[i2 as usize].position,
        })
    }
}

/// A triangle with concrete vertex positions.
///
/// Utility type for geometric calculations. The v0→v1→v2 ordering carries
/// the front-face normal by the right-hand rule.
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub v0: Point3<f64>,
    pub v1: Point3<f64>,
    pub v2: Point3<f64>,
}

impl Triangle {
    /// Create a new triangle from three points.
    #[inline]
    pub fn new(v0: Point3<f64>, v1: Point3<f64>, v2: Point3<f64>) -> Self {
        Self { v0, v1, v2 }
    }

    /// Compute the (unnormalized) face normal via cross product.
    #[inline]
    pub fn normal_unnormalized(&self) -> Vector3<f64> {
        let e1 = self.v1 - self.v0;
        let e2 = self.v2 - self.v0;
        e1.cross(&e2)
    }

    /// Compute the unit face normal.
    /// Returns None for degenerate triangles (collinear vertices).
    pub fn normal(&self) -> Option<Vector3<f64>> {
        let n = self.normal_unnormalized();
        let len_sq = n.norm_squared();
        if len_sq > f64::EPSILON {
            Some(n / len_sq.sqrt())
        } else {
            None
        }
    }

    /// Compute the area of the triangle.
    #[inline]
    pub fn area(&self) -> f64 {
        self.normal_unnormalized().norm() * 0.5
    }

    /// Check if the triangle's vertices are collinear (zero cross product).
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.normal().is_none()
    }
}
