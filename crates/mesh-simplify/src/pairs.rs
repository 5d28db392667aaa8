//! Valid-pair discovery and contraction cost solving.
//!
//! A pair is eligible for contraction when its vertices share an edge, or
//! (with a positive distance threshold) when they lie closer than that
//! threshold. Each pair caches the optimal contraction target and its
//! quadric cost.

use std::collections::HashSet;

use nalgebra::Point3;

use crate::quadric::Quadric;

/// Canonical key of an unordered vertex pair, always `(min, max)`.
pub type PairKey = (u32, u32);

/// Normalize a pair key so the smaller index comes first.
#[inline]
pub fn canonical(v1: u32, v2: u32) -> PairKey {
    if v1 < v2 { (v1, v2) } else { (v2, v1) }
}

/// A contraction candidate: an unordered vertex pair with its cached
/// optimal target position and cost.
///
/// Pair identity is the index set alone; the cached target and cost are
/// recomputed whenever either endpoint's quadric changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pair {
    /// Smaller vertex index.
    pub v1: u32,
    /// Larger vertex index.
    pub v2: u32,
    /// Optimal position for the merged vertex.
    pub target: Point3<f64>,
    /// Quadric error of the merged vertex at `target`.
    pub cost: f64,
}

impl Pair {
    /// Solve the minimum-cost contraction target for a vertex pair.
    ///
    /// The combined quadric's derivative matrix is inverted for the optimal
    /// point; when it is singular the error is evaluated at both endpoints
    /// and their midpoint and the cheapest candidate wins.
    pub fn solve(
        v1: u32,
        v2: u32,
        combined: &Quadric,
        p1: &Point3<f64>,
        p2: &Point3<f64>,
    ) -> Self {
        let (target, cost) = match combined.optimal_point() {
            Some(opt) => {
                let cost = combined.evaluate(&opt);
                (opt, cost)
            }
            None => {
                let midpoint = nalgebra::center(p1, p2);
                let mut best = (*p1, combined.evaluate(p1));
                for candidate in [*p2, midpoint] {
                    let cost = combined.evaluate(&candidate);
                    if cost < best.1 {
                        best = (candidate, cost);
                    }
                }
                best
            }
        };

        let (v1, v2) = canonical(v1, v2);
        Self {
            v1,
            v2,
            target,
            cost,
        }
    }

    /// The canonical key of this pair.
    #[inline]
    pub fn key(&self) -> PairKey {
        (self.v1, self.v2)
    }
}

/// Enumerate the distinct edge pairs of a face list.
///
/// Each face contributes its three unordered vertex pairs; deduplication is
/// by set identity.
pub fn collect_edge_pairs<'a, I>(faces: I) -> HashSet<PairKey>
where
    I: IntoIterator<Item = &'a [u32; 3]>,
{
    let mut pairs = HashSet::new();
    for face in faces {
        for i in 0..3 {
            let v1 = face[i];
            let v2 = face[(i + 1) % 3];
            if v1 != v2 {
                pairs.insert(canonical(v1, v2));
            }
        }
    }
    pairs
}

/// Enumerate every pair of vertices strictly closer than `threshold`.
///
/// The scan is quadratic in the vertex count; it only runs when the caller
/// enables distance pairing, and only during seeding (before any vertex has
/// been contracted away).
pub fn collect_distance_pairs(positions: &[Point3<f64>], threshold: f64) -> HashSet<PairKey> {
    let mut pairs = HashSet::new();
    let threshold_sq = threshold * threshold;

    for (i, pi) in positions.iter().enumerate() {
        for (j, pj) in positions.iter().enumerate().skip(i + 1) {
            if (pj - pi).norm_squared() < threshold_sq {
                pairs.insert((i as u32, j as u32));
            }
        }
    }
    pairs
}
