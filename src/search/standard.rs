use super::{KBest, Search};
use crate::{distance::squared_euclidean_within, node::Node};

impl Search<'_> {
    /// Depth-first k-nearest-neighbor search visiting the closer child
    /// first. A far cell is skipped once its box distance, scaled by
    /// `(1 + eps)^2`, exceeds the current k-th best distance.
    pub fn k_nearest(&mut self, k: usize) -> KBest {
        let mut best = KBest::new(k);
        let mut stack = vec![self.root()];
        while let Some((node_id, box_dist)) = stack.pop() {
            if self.exhausted() {
                break;
            }
            if self.out_of_reach(box_dist, best.max_key()) {
                continue;
            }
            let node = &self.tree.nodes[node_id];
            if let Node::Leaf { start, end } = *node {
                for &id in self.bucket(start, end) {
                    let bound = best.max_key();
                    if let Some(dist) = squared_euclidean_within(self.query, self.points.row(id), bound) {
                        best.insert(dist, id);
                    }
                }
                self.visited += end - start;
            } else if let Some((near, far)) = self.children(node, box_dist) {
                stack.push(far);
                stack.push(near);
            }
        }
        best
    }
}
