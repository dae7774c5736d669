use ordered_float::OrderedFloat;

use crate::{
    config::{KdTreeConfig, SplitRule},
    node::Node,
    points::PointMatrix,
    rect::Rect,
};

// Sides within this fraction of the longest one count as "longest".
const SIDE_TOLERANCE: f64 = 0.001;

/// The arena of nodes together with the point permutation the leaves index.
pub struct Tree {
    pub nodes: Vec<Node>,
    pub root: usize,
    pub perm: Vec<usize>,
    pub bounds: Rect,
}

impl Tree {
    pub fn build(points: &PointMatrix, config: &KdTreeConfig) -> Tree {
        let n = points.len();
        let mut perm: Vec<usize> = (0..n).collect();
        let bounds = Rect::enclosing(points, &perm);
        let mut nodes = vec![Node::default()];

        let mut stack = vec![(0, 0, n, bounds.clone())];
        while let Some((slot_id, start, end, cell)) = stack.pop() {
            if end - start <= config.bucket_size {
                nodes[slot_id] = Node::leaf(start, end);
                continue;
            }

            let members = &mut perm[start..end];
            let (cut_dim, cut_val, n_lo) = match config.split_rule {
                SplitRule::SlidingMidpoint => sliding_midpoint_split(points, members, &cell),
                SplitRule::Midpoint => midpoint_split(points, members, &cell),
                SplitRule::Median => median_split(points, members),
            };

            let lo = nodes.len();
            let hi = lo + 1;
            nodes.push(Node::default());
            nodes.push(Node::default());
            nodes[slot_id] = Node::Split {
                cut_dim,
                cut_val,
                lo_bound: cell.lo[cut_dim],
                hi_bound: cell.hi[cut_dim],
                lo,
                hi,
            };

            let mut lo_cell = cell.clone();
            lo_cell.hi[cut_dim] = cut_val;
            let mut hi_cell = cell;
            hi_cell.lo[cut_dim] = cut_val;
            stack.push((hi, start + n_lo, end, hi_cell));
            stack.push((lo, start, start + n_lo, lo_cell));
        }

        Tree {
            nodes,
            root: 0,
            perm,
            bounds,
        }
    }

    /// Number of edges on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut queue = vec![(self.root, 0)];
        while let Some((node_id, level)) = queue.pop() {
            match self.nodes[node_id] {
                Node::Leaf { .. } => depth = depth.max(level),
                Node::Split { lo, hi, .. } => {
                    queue.push((lo, level + 1));
                    queue.push((hi, level + 1));
                }
            }
        }
        depth
    }
}

fn coord(points: &PointMatrix, id: usize, dim: usize) -> f64 {
    points.row(id)[dim]
}

fn min_max(points: &PointMatrix, members: &[usize], dim: usize) -> (f64, f64) {
    members.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &id| {
        let x = coord(points, id, dim);
        (min.min(x), max.max(x))
    })
}

fn spread(points: &PointMatrix, members: &[usize], dim: usize) -> f64 {
    let (min, max) = min_max(points, members, dim);
    max - min
}

// Among the (nearly) longest sides of the cell, the one with the widest
// point spread.
fn longest_side_dim(points: &PointMatrix, members: &[usize], cell: &Rect) -> usize {
    let max_length = cell.longest_side();
    let mut max_spread = f64::NEG_INFINITY;
    let mut cut_dim = 0;
    for d in 0..points.dim() {
        if cell.side(d) >= (1.0 - SIDE_TOLERANCE) * max_length {
            let s = spread(points, members, d);
            if s > max_spread {
                max_spread = s;
                cut_dim = d;
            }
        }
    }
    cut_dim
}

// Moves members matching `pred` to the front, returns how many matched.
fn partition(members: &mut [usize], pred: impl Fn(usize) -> bool) -> usize {
    let mut i = 0;
    for j in 0..members.len() {
        if pred(members[j]) {
            members.swap(i, j);
            i += 1;
        }
    }
    i
}

// Reorders members into [< cut | == cut | > cut] and returns both boundaries.
#[allow(clippy::float_cmp)]
fn plane_split(points: &PointMatrix, members: &mut [usize], dim: usize, cut: f64) -> (usize, usize) {
    let br1 = partition(members, |id| coord(points, id, dim) < cut);
    let br2 = br1 + partition(&mut members[br1..], |id| coord(points, id, dim) == cut);
    (br1, br2)
}

fn balanced_count(n: usize, br1: usize, br2: usize) -> usize {
    if br1 > n / 2 {
        br1
    } else if br2 < n / 2 {
        br2
    } else {
        n / 2
    }
}

fn sliding_midpoint_split(
    points: &PointMatrix,
    members: &mut [usize],
    cell: &Rect,
) -> (usize, f64, usize) {
    let n = members.len();
    let cut_dim = longest_side_dim(points, members, cell);
    let ideal = cell.midpoint(cut_dim);
    let (min, max) = min_max(points, members, cut_dim);

    let cut_val = ideal.clamp(min, max);
    let (br1, br2) = plane_split(points, members, cut_dim, cut_val);

    // When the plane slid onto an extreme point, that point alone goes to
    // the near side so neither child is empty.
    let n_lo = if ideal < min {
        1
    } else if ideal > max {
        n - 1
    } else {
        balanced_count(n, br1, br2)
    };
    (cut_dim, cut_val, n_lo)
}

fn midpoint_split(points: &PointMatrix, members: &mut [usize], cell: &Rect) -> (usize, f64, usize) {
    let n = members.len();
    let cut_dim = longest_side_dim(points, members, cell);
    let cut_val = cell.midpoint(cut_dim);
    let (br1, br2) = plane_split(points, members, cut_dim, cut_val);
    (cut_dim, cut_val, balanced_count(n, br1, br2))
}

fn median_split(points: &PointMatrix, members: &mut [usize]) -> (usize, f64, usize) {
    let n = members.len();
    let cut_dim = (0..points.dim())
        .max_by_key(|&d| OrderedFloat(spread(points, members, d)))
        .unwrap_or(0);

    let n_lo = n / 2;
    members.select_nth_unstable_by_key(n_lo, |&id| OrderedFloat(coord(points, id, cut_dim)));
    let upper_min = coord(points, members[n_lo], cut_dim);
    let lower_max = members[..n_lo]
        .iter()
        .map(|&id| coord(points, id, cut_dim))
        .fold(f64::NEG_INFINITY, f64::max);
    (cut_dim, lower_max / 2.0 + upper_min / 2.0, n_lo)
}
