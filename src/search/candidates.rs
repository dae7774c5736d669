use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;

use crate::result::NULL_INDEX;

/// The `k` best `(distance, index)` pairs seen so far.
///
/// Pairs compare lexicographically, so among equal distances the smaller
/// index wins.
pub struct KBest {
    k: usize,
    heap: BinaryHeap<(OrderedFloat<f64>, usize)>,
}

impl KBest {
    pub fn new(k: usize) -> Self {
        KBest {
            k,
            heap: BinaryHeap::with_capacity(k + 1),
        }
    }

    /// Distance of the current k-th best candidate, or infinity while fewer
    /// than `k` candidates are known.
    pub fn max_key(&self) -> f64 {
        if self.heap.len() < self.k {
            return f64::INFINITY;
        }
        self.heap.peek().map_or(f64::INFINITY, |(dist, _)| dist.0)
    }

    pub fn insert(&mut self, distance: f64, index: usize) {
        if self.k == 0 {
            return;
        }
        let entry = (OrderedFloat(distance), index);
        if self.heap.len() < self.k {
            self.heap.push(entry);
        } else if self.heap.peek().map_or(false, |worst| entry < *worst) {
            self.heap.push(entry);
            self.heap.pop();
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// The candidates in ascending order.
    pub fn into_sorted(self) -> (Vec<usize>, Vec<f64>) {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|(dist, index)| (index, dist.0))
            .unzip()
    }

    /// Like [`KBest::into_sorted`], filled up to `k` entries with
    /// `NULL_INDEX` at infinite distance.
    pub fn into_padded(self) -> (Vec<usize>, Vec<f64>) {
        let k = self.k;
        let (mut indices, mut distances) = self.into_sorted();
        indices.resize(k, NULL_INDEX);
        distances.resize(k, f64::INFINITY);
        (indices, distances)
    }
}

#[cfg(test)]
mod tests {
    use super::KBest;
    use crate::result::NULL_INDEX;

    #[test]
    fn keeps_k_smallest() {
        let mut best = KBest::new(3);
        assert_eq!(best.max_key(), f64::INFINITY);
        for (i, d) in [5.0, 1.0, 4.0, 3.0, 2.0].into_iter().enumerate() {
            best.insert(d, i);
        }
        assert_eq!(best.len(), 3);
        assert_eq!(best.max_key(), 3.0);
        let (indices, distances) = best.into_sorted();
        assert_eq!(indices, vec![1, 4, 3]);
        assert_eq!(distances, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn ties_prefer_smaller_index() {
        let mut best = KBest::new(2);
        best.insert(1.0, 7);
        best.insert(1.0, 3);
        best.insert(1.0, 5);
        best.insert(1.0, 9);
        let (indices, _) = best.into_sorted();
        assert_eq!(indices, vec![3, 5]);
    }

    #[test]
    fn padding() {
        let mut best = KBest::new(3);
        best.insert(2.0, 0);
        let (indices, distances) = best.into_padded();
        assert_eq!(indices, vec![0, NULL_INDEX, NULL_INDEX]);
        assert_eq!(distances, vec![2.0, f64::INFINITY, f64::INFINITY]);
    }

    #[test]
    fn zero_capacity() {
        let mut best = KBest::new(0);
        best.insert(1.0, 0);
        assert_eq!(best.len(), 0);
        assert!(best.into_sorted().0.is_empty());
    }
}
