//! Tree traversals. Each query runs in its own [`Search`] context, so the
//! tree itself is only ever borrowed immutably.

mod candidates;
mod priority;
mod radius;
mod standard;

pub use candidates::KBest;

use crate::{build::Tree, node::Node, points::PointMatrix};

// Relative allowance for rounding in incrementally updated box distances,
// which can land a few ulps above the distance of a point on the cell wall.
const ROUNDING_SLACK: f64 = 1e-9;

pub struct Search<'a> {
    tree: &'a Tree,
    points: &'a PointMatrix,
    query: &'a [f64],
    // (1 + eps)^2, applied to squared box distances.
    max_err: f64,
    limit: Option<usize>,
    visited: usize,
}

impl<'a> Search<'a> {
    pub fn new(
        tree: &'a Tree,
        points: &'a PointMatrix,
        query: &'a [f64],
        eps: f64,
        limit: Option<usize>,
    ) -> Self {
        Search {
            tree,
            points,
            query,
            max_err: (1.0 + eps).powi(2),
            limit,
            visited: 0,
        }
    }

    /// Number of points examined so far.
    pub fn visited(&self) -> usize {
        self.visited
    }

    fn exhausted(&self) -> bool {
        self.limit.map_or(false, |limit| self.visited > limit)
    }

    // True when a cell at `box_dist` cannot hold a point within `bound`.
    fn out_of_reach(&self, box_dist: f64, bound: f64) -> bool {
        box_dist * self.max_err > bound * (1.0 + ROUNDING_SLACK)
    }

    fn root(&self) -> (usize, f64) {
        (self.tree.root, self.tree.bounds.min_distance(self.query))
    }

    fn bucket(&self, start: usize, end: usize) -> &'a [usize] {
        &self.tree.perm[start..end]
    }

    // For a split node, returns the child on the query's side of the cut and
    // the opposite child with its box distance. Only the cut dimension's
    // term of the box distance changes when crossing the plane.
    fn children(&self, node: &Node, box_dist: f64) -> Option<((usize, f64), (usize, f64))> {
        let Node::Split {
            cut_dim,
            cut_val,
            lo_bound,
            hi_bound,
            lo,
            hi,
        } = *node
        else {
            return None;
        };
        let q = self.query[cut_dim];
        let cut_diff = q - cut_val;
        let (near, far, box_diff) = if cut_diff < 0.0 {
            (lo, hi, (lo_bound - q).max(0.0))
        } else {
            (hi, lo, (q - hi_bound).max(0.0))
        };
        let far_dist = (box_dist + cut_diff.powi(2) - box_diff.powi(2)).max(0.0);
        Some(((near, box_dist), (far, far_dist)))
    }
}
