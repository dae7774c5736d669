use super::{KBest, Search};
use crate::{distance::squared_euclidean_within, node::Node};

impl Search<'_> {
    /// Counts the points within `sq_radius` of the query (inclusive) and
    /// keeps the `k` closest of them. Cells whose box distance, scaled by
    /// `(1 + eps)^2`, exceeds the radius are not entered.
    pub fn fixed_radius(&mut self, sq_radius: f64, k: usize) -> (KBest, usize) {
        let mut best = KBest::new(k);
        let mut count = 0;
        let mut stack = vec![self.root()];
        while let Some((node_id, box_dist)) = stack.pop() {
            if self.exhausted() {
                break;
            }
            if self.out_of_reach(box_dist, sq_radius) {
                continue;
            }
            let node = &self.tree.nodes[node_id];
            if let Node::Leaf { start, end } = *node {
                for &id in self.bucket(start, end) {
                    if let Some(dist) =
                        squared_euclidean_within(self.query, self.points.row(id), sq_radius)
                    {
                        count += 1;
                        best.insert(dist, id);
                    }
                }
                self.visited += end - start;
            } else if let Some((near, far)) = self.children(node, box_dist) {
                stack.push(far);
                stack.push(near);
            }
        }
        (best, count)
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use crate::{
        build::Tree, config::KdTreeConfig, distance::squared_euclidean, points::PointMatrix,
        search::Search,
    };

    fn line(n: usize) -> PointMatrix {
        let rows: Vec<[f64; 1]> = (0..n).map(|i| [i as f64]).collect();
        PointMatrix::from_rows(&rows).unwrap()
    }

    #[test]
    fn boundary_is_inclusive() {
        let points = line(20);
        let tree = Tree::build(&points, &KdTreeConfig::default());
        let query = [10.0];
        let (best, count) = Search::new(&tree, &points, &query, 0.0, None).fixed_radius(4.0, 20);
        assert_eq!(count, 5);
        let (mut indices, _) = best.into_sorted();
        indices.sort_unstable();
        assert_eq!(indices, vec![8, 9, 10, 11, 12]);
    }

    #[test]
    fn capped() {
        let points = line(20);
        let tree = Tree::build(&points, &KdTreeConfig::default());
        let query = [10.2];
        let (best, count) = Search::new(&tree, &points, &query, 0.0, None).fixed_radius(9.0, 2);
        assert_eq!(count, 6);
        let (indices, _) = best.into_sorted();
        assert_eq!(indices, vec![10, 11]);
    }

    #[test]
    fn count_only() {
        let points = line(20);
        let tree = Tree::build(&points, &KdTreeConfig::default());
        let query = [0.0];
        let (best, count) = Search::new(&tree, &points, &query, 0.0, None).fixed_radius(100.0, 0);
        assert_eq!(count, 11);
        assert_eq!(best.len(), 0);
    }

    #[test]
    fn approximate_undercounts() {
        let mut rng = StdRng::seed_from_u64(5);
        let coords = (0..2000 * 2).map(|_| rng.gen_range(-100.0..100.0)).collect();
        let points = PointMatrix::from_flat(coords, 2).unwrap();
        let tree = Tree::build(&points, &KdTreeConfig::default());
        let eps = 0.5;
        let sq_radius = 400.0;
        let inner_sq_radius = sq_radius / (1.0_f64 + eps).powi(2);

        for _ in 0..50 {
            let query = [rng.gen_range(-100.0..100.0), rng.gen_range(-100.0..100.0)];
            let dists: Vec<f64> = points.rows().map(|p| squared_euclidean(&query, p)).collect();
            let exact = dists.iter().filter(|&&d| d <= sq_radius).count();
            let inner = dists.iter().filter(|&&d| d <= inner_sq_radius).count();

            let (best, count) = Search::new(&tree, &points, &query, eps, None).fixed_radius(sq_radius, 10);
            assert!(count <= exact);
            assert!(count >= inner);

            let (indices, distances) = best.into_sorted();
            assert_eq!(indices.len(), count.min(10));
            assert!(distances.windows(2).all(|w| w[0] <= w[1]));
            assert!(distances.iter().all(|&d| d <= sq_radius));
        }
    }
}
