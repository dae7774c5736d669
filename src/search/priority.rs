use std::{cmp::Reverse, collections::BinaryHeap};

use ordered_float::OrderedFloat;

use super::{KBest, Search};
use crate::{distance::squared_euclidean_within, node::Node};

impl Search<'_> {
    /// Best-bin-first search: cells are visited in order of increasing box
    /// distance, and the search stops as soon as the closest pending cell is
    /// farther than the k-th best distance divided by `(1 + eps)^2`.
    pub fn k_nearest_priority(&mut self, k: usize) -> KBest {
        let mut best = KBest::new(k);
        let (root, root_dist) = self.root();
        let mut queue = BinaryHeap::new();
        queue.push(Reverse((OrderedFloat(root_dist), root)));

        while let Some(Reverse((OrderedFloat(box_dist), node_id))) = queue.pop() {
            if self.exhausted() || self.out_of_reach(box_dist, best.max_key()) {
                break;
            }

            // Walk down to the leaf on the query's side, queueing the far
            // siblings along the way.
            let mut current = (node_id, box_dist);
            loop {
                let node = &self.tree.nodes[current.0];
                if let Node::Leaf { start, end } = *node {
                    for &id in self.bucket(start, end) {
                        let bound = best.max_key();
                        if let Some(dist) =
                            squared_euclidean_within(self.query, self.points.row(id), bound)
                        {
                            best.insert(dist, id);
                        }
                    }
                    self.visited += end - start;
                    break;
                }
                match self.children(node, current.1) {
                    Some((near, (far, far_dist))) => {
                        queue.push(Reverse((OrderedFloat(far_dist), far)));
                        current = near;
                    }
                    None => break,
                }
            }
        }
        best
    }
}
