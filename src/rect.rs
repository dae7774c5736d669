use crate::points::PointMatrix;

/// Axis-aligned box bounding a cell of the tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Rect {
    pub lo: Vec<f64>,
    pub hi: Vec<f64>,
}

impl Rect {
    /// The tightest box around the points referenced by `members`.
    pub fn enclosing(points: &PointMatrix, members: &[usize]) -> Rect {
        let dim = points.dim();
        let mut lo = vec![f64::INFINITY; dim];
        let mut hi = vec![f64::NEG_INFINITY; dim];
        for &id in members {
            for (d, &x) in points.row(id).iter().enumerate() {
                lo[d] = lo[d].min(x);
                hi[d] = hi[d].max(x);
            }
        }
        Rect { lo, hi }
    }

    pub fn side(&self, d: usize) -> f64 {
        self.hi[d] - self.lo[d]
    }

    pub fn longest_side(&self) -> f64 {
        (0..self.lo.len()).fold(0.0, |max: f64, d| max.max(self.side(d)))
    }

    pub fn midpoint(&self, d: usize) -> f64 {
        // Halving first keeps huge same-sign bounds from overflowing.
        self.lo[d] / 2.0 + self.hi[d] / 2.0
    }

    /// Squared distance from `point` to the closest point of the box
    /// (zero if the point lies inside).
    pub fn min_distance(&self, point: &[f64]) -> f64 {
        let mut sum = 0.0;
        for (d, &x) in point.iter().enumerate() {
            if x < self.lo[d] {
                sum += (self.lo[d] - x).powi(2);
            } else if x > self.hi[d] {
                sum += (x - self.hi[d]).powi(2);
            }
        }
        sum
    }
}
