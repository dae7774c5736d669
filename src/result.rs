use conv::ValueFrom;

use crate::error::{KdError, Result};

/// Marks an unfilled result slot (its distance is `f64::INFINITY`).
pub const NULL_INDEX: usize = usize::MAX;

/// Dense `(num_queries, k)` buffers of neighbor indices and squared
/// distances, stored row-major. Row `i` belongs to query `i`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NeighborMatrix {
    indices: Vec<usize>,
    distances: Vec<f64>,
    k: usize,
}

impl NeighborMatrix {
    pub(crate) fn with_capacity(rows: usize, k: usize) -> Self {
        NeighborMatrix {
            indices: Vec::with_capacity(rows * k),
            distances: Vec::with_capacity(rows * k),
            k,
        }
    }

    pub(crate) fn push_row(&mut self, indices: &[usize], distances: &[f64]) {
        debug_assert_eq!(indices.len(), self.k);
        debug_assert_eq!(distances.len(), self.k);
        self.indices.extend_from_slice(indices);
        self.distances.extend_from_slice(distances);
    }

    /// `(num_queries, k)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.num_queries(), self.k)
    }

    #[must_use]
    pub fn num_queries(&self) -> usize {
        if self.k == 0 {
            0
        } else {
            self.indices.len() / self.k
        }
    }

    #[must_use]
    pub fn k(&self) -> usize {
        self.k
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// # Panics
    /// If `i >= self.num_queries()`.
    #[must_use]
    pub fn row(&self, i: usize) -> (&[usize], &[f64]) {
        let range = i * self.k..(i + 1) * self.k;
        (&self.indices[range.clone()], &self.distances[range])
    }

    pub fn rows(&self) -> impl Iterator<Item = (&[usize], &[f64])> + '_ {
        (0..self.num_queries()).map(|i| self.row(i))
    }

    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    #[must_use]
    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    #[must_use]
    pub fn into_parts(self) -> (Vec<usize>, Vec<f64>) {
        (self.indices, self.distances)
    }

    /// The index buffer as 32-bit integers, with `NULL_INDEX` mapped to -1.
    ///
    /// # Errors
    /// `OutOfRange` if an index does not fit into an `i32`.
    pub fn indices_i32(&self) -> Result<Vec<i32>> {
        self.indices
            .iter()
            .map(|&index| {
                if index == NULL_INDEX {
                    return Ok(-1);
                }
                i32::value_from(index).map_err(|_| KdError::OutOfRange {
                    index,
                    target: "i32",
                })
            })
            .collect()
    }
}

/// Result of a single fixed-radius query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RadiusNeighbors {
    /// Up to `k` of the points found, closest first.
    pub indices: Vec<usize>,
    pub distances: Vec<f64>,
    /// Number of points found within the radius, which may exceed
    /// `indices.len()`.
    pub count: usize,
}

/// Result of a batched fixed-radius query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RadiusBatch {
    /// Empty when the batch ran in count-only mode (`k == 0`); otherwise one
    /// row per query, padded with `NULL_INDEX` where fewer than `k` points
    /// were found.
    pub neighbors: NeighborMatrix,
    pub counts: Vec<usize>,
}
