//! Quadric error matrices.
//!
//! A quadric is a symmetric 4x4 matrix whose quadratic form at a homogeneous
//! point `(x, y, z, 1)` gives the sum of squared distances to a set of
//! planes. The simplifier assigns each vertex the sum of the plane quadrics
//! of its incident faces; the quadric of a merged vertex is the sum of its
//! ancestors' quadrics.

use nalgebra::{Matrix4, Point3, Vector4};

use crate::types::Triangle;

/// Quadric error matrix (4x4 symmetric matrix stored as 10 values).
#[derive(Debug, Clone, Copy, Default)]
pub struct Quadric {
    // Symmetric 4x4 matrix stored as upper triangle:
    // [a b c d]
    // [  e f g]
    // [    h i]
    // [      j]
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
    g: f64,
    h: f64,
    i: f64,
    j: f64,
}

impl Quadric {
    /// Create a quadric from a plane equation (ax + by + cz + d = 0).
    /// The plane must be normalized (a² + b² + c² = 1).
    pub fn from_plane(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self {
            a: a * a,
            b: a * b,
            c: a * c,
            d: a * d,
            e: b * b,
            f: b * c,
            g: b * d,
            h: c * c,
            i: c * d,
            j: d * d,
        }
    }

    /// Create the plane quadric of a triangle's supporting plane.
    /// Returns None for degenerate triangles (zero cross product).
    pub fn from_triangle(tri: &Triangle) -> Option<Self> {
        let n = tri.normal()?;
        let d = -n.dot(&tri.v0.coords);
        Some(Self::from_plane(n.x, n.y, n.z, d))
    }

    /// Add another quadric to this one.
    pub fn add(&mut self, other: &Quadric) {
        self.a += other.a;
        self.b += other.b;
        self.c += other.c;
        self.d += other.d;
        self.e += other.e;
        self.f += other.f;
        self.g += other.g;
        self.h += other.h;
        self.i += other.i;
        self.j += other.j;
    }

    /// Return the sum of this quadric and another.
    pub fn sum(&self, other: &Quadric) -> Quadric {
        let mut q = *self;
        q.add(other);
        q
    }

    /// Evaluate the quadric error for a point.
    pub fn evaluate(&self, p: &Point3<f64>) -> f64 {
        let (x, y, z) = (p.x, p.y, p.z);

        // v^T * Q * v where v = [x, y, z, 1]
        self.a * x * x
            + 2.0 * self.b * x * y
            + 2.0 * self.c * x * z
            + 2.0 * self.d * x
            + self.e * y * y
            + 2.0 * self.f * y * z
            + 2.0 * self.g * y
            + self.h * z * z
            + 2.0 * self.i * z
            + self.j
    }

    /// Expand to the full symmetric 4x4 matrix.
    pub fn to_matrix(&self) -> Matrix4<f64> {
        Matrix4::new(
            self.a, self.b, self.c, self.d, //
            self.b, self.e, self.f, self.g, //
            self.c, self.f, self.h, self.i, //
            self.d, self.g, self.i, self.j,
        )
    }

    /// Find the point minimizing the quadric error.
    ///
    /// Replaces the last row of the matrix with (0, 0, 0, 1) and inverts; the
    /// optimal point is the last column of the inverse. Returns None when the
    /// derivative matrix is singular and the caller must fall back to
    /// candidate evaluation.
    pub fn optimal_point(&self) -> Option<Point3<f64>> {
        let mut m = self.to_matrix();
        m[(3, 0)] = 0.0;
        m[(3, 1)] = 0.0;
        m[(3, 2)] = 0.0;
        m[(3, 3)] = 1.0;

        let inv = m.try_inverse()?;
        let v = inv * Vector4::new(0.0, 0.0, 0.0, 1.0);
        Some(Point3::new(v.x, v.y, v.z))
    }
}
