/// A node of the tree arena. Children are referenced by their slot in the
/// arena, leaves by a range of the point permutation.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Leaf {
        start: usize,
        end: usize,
    },
    Split {
        cut_dim: usize,
        cut_val: f64,
        // Bounds of this node's cell along `cut_dim`.
        lo_bound: f64,
        hi_bound: f64,
        lo: usize,
        hi: usize,
    },
}

impl Node {
    #[must_use]
    pub fn leaf(start: usize, end: usize) -> Node {
        Node::Leaf { start, end }
    }
}

impl Default for Node {
    fn default() -> Self {
        Node::Leaf {
            start: usize::MAX,
            end: usize::MAX,
        }
    }
}
