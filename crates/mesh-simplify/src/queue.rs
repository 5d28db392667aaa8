//! Cost-ordered pair queue.
//!
//! An ordered set of contraction candidates, ascending by cost with ties
//! broken by the vertex index pair so identical inputs always contract in
//! the same order. A resident entry's cost is immutable: to change a pair's
//! cost, remove it, recompute, and insert it again.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::pairs::Pair;

/// One queue entry: the pair's cached cost and its canonical endpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
struct QueueEntry {
    cost: f64,
    v1: u32,
    v2: u32,
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .total_cmp(&other.cost)
            .then_with(|| self.v1.cmp(&other.v1))
            .then_with(|| self.v2.cmp(&other.v2))
    }
}

/// Ordered-by-cost set of contraction pairs.
#[derive(Debug, Default)]
pub struct PairQueue {
    set: BTreeSet<QueueEntry>,
}

impl PairQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pair keyed by its current cost.
    pub fn insert(&mut self, pair: &Pair) {
        self.set.insert(QueueEntry {
            cost: pair.cost,
            v1: pair.v1,
            v2: pair.v2,
        });
    }

    /// Remove a pair. The pair's cached cost must be the cost it was
    /// inserted with. Returns whether it was present.
    pub fn remove(&mut self, pair: &Pair) -> bool {
        self.set.remove(&QueueEntry {
            cost: pair.cost,
            v1: pair.v1,
            v2: pair.v2,
        })
    }

    /// Pop the minimum-cost pair, ties broken by `(v1, v2)`.
    pub fn pop_min(&mut self) -> Option<(u32, u32, f64)> {
        let entry = self.set.pop_first()?;
        Some((entry.v1, entry.v2, entry.cost))
    }

    /// Check whether a pair (at its cached cost) is resident.
    pub fn contains(&self, pair: &Pair) -> bool {
        self.set.contains(&QueueEntry {
            cost: pair.cost,
            v1: pair.v1,
            v2: pair.v2,
        })
    }

    /// Number of resident pairs.
    pub fn len(&self) -> usize {
        self.set.len()
    }

    /// Check whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}
