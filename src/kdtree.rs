use conv::ValueFrom;
use tracing::{debug, trace};

use crate::{
    build::Tree,
    config::KdTreeConfig,
    error::{KdError, Result},
    node::Node,
    points::PointMatrix,
    result::{NeighborMatrix, RadiusBatch, RadiusNeighbors},
    search::{KBest, Search},
};

#[derive(Clone, Copy)]
enum Traversal {
    Standard,
    Priority,
}

/// A static k-d tree over a fixed point set.
///
/// The tree owns its points and never changes after construction, so every
/// query takes `&self` and may run concurrently with others. Distances are
/// squared Euclidean distances in `f64`; indices refer to the order of the
/// points passed at construction.
///
/// Every query takes an approximation slack `eps >= 0`. With `eps == 0.0`
/// results are exact and ties between equal distances are broken by the
/// smaller index. With `eps > 0.0` the i-th reported distance is at most
/// `(1 + eps)^2` times the true i-th nearest distance.
pub struct KdTree {
    points: PointMatrix,
    tree: Tree,
    config: KdTreeConfig,
}

impl KdTree {
    /// Builds a tree with the default configuration.
    ///
    /// # Errors
    /// `InvalidInput` if `points` is empty or holds a non-finite coordinate.
    pub fn new(points: PointMatrix) -> Result<Self> {
        Self::with_config(points, KdTreeConfig::default())
    }

    /// Builds a tree from rows of equal length.
    ///
    /// # Errors
    /// `InvalidInput` if there are no rows, rows differ in length, or a
    /// coordinate is not finite.
    pub fn from_rows<P: AsRef<[f64]>>(rows: &[P]) -> Result<Self> {
        Self::new(PointMatrix::from_rows(rows)?)
    }

    /// # Errors
    /// `InvalidInput` if `points` is empty or holds a non-finite coordinate,
    /// or if the configuration is invalid.
    pub fn with_config(points: PointMatrix, config: KdTreeConfig) -> Result<Self> {
        config.validate()?;
        if points.is_empty() {
            return Err(KdError::invalid("cannot index an empty point set"));
        }
        points.ensure_finite()?;

        let tree = Tree::build(&points, &config);
        let kdtree = KdTree {
            points,
            tree,
            config,
        };
        debug!(
            points = kdtree.len(),
            dim = kdtree.dim(),
            nodes = kdtree.tree.nodes.len(),
            split_rule = ?kdtree.config.split_rule,
            bucket_size = kdtree.config.bucket_size,
            "built k-d tree"
        );
        Ok(kdtree)
    }

    /// Finds the `k` nearest points to `query`, closest first.
    ///
    /// # Errors
    /// `InvalidInput` if `k` is not in `1..=len()`, `eps` is negative or not
    /// finite, or `query` has the wrong dimension or a non-finite coordinate.
    pub fn search(&self, query: &[f64], k: usize, eps: f64) -> Result<(Vec<usize>, Vec<f64>)> {
        self.check_k(k, false)?;
        check_eps(eps)?;
        self.check_query(query)?;
        Ok(self.knn(query, k, eps, Traversal::Standard))
    }

    /// Runs [`KdTree::search`] for every row of `queries`, returning a
    /// `(queries.len(), k)` matrix. An empty batch yields an empty matrix.
    ///
    /// # Errors
    /// As [`KdTree::search`], checked before any query runs.
    pub fn search_batch(&self, queries: &PointMatrix, k: usize, eps: f64) -> Result<NeighborMatrix> {
        self.knn_batch(queries, k, eps, Traversal::Standard)
    }

    /// Like [`KdTree::search`], but visits cells in order of increasing
    /// distance from the query and stops as soon as no pending cell can hold
    /// a closer point. Exact for `eps == 0.0`.
    ///
    /// # Errors
    /// As [`KdTree::search`].
    pub fn priority_search(&self, query: &[f64], k: usize, eps: f64) -> Result<(Vec<usize>, Vec<f64>)> {
        self.check_k(k, false)?;
        check_eps(eps)?;
        self.check_query(query)?;
        Ok(self.knn(query, k, eps, Traversal::Priority))
    }

    /// Batched [`KdTree::priority_search`].
    ///
    /// # Errors
    /// As [`KdTree::search`].
    pub fn priority_search_batch(
        &self,
        queries: &PointMatrix,
        k: usize,
        eps: f64,
    ) -> Result<NeighborMatrix> {
        self.knn_batch(queries, k, eps, Traversal::Priority)
    }

    /// Counts the points within `sq_radius` (a squared distance, inclusive)
    /// of `query` and returns up to `k` of them, closest first. With
    /// `k == 0` only the count is computed.
    ///
    /// # Errors
    /// `InvalidInput` if `k > len()`, `sq_radius` is negative or NaN, `eps`
    /// is invalid, or `query` has the wrong dimension or a non-finite
    /// coordinate.
    pub fn radius_search(
        &self,
        query: &[f64],
        sq_radius: f64,
        k: usize,
        eps: f64,
    ) -> Result<RadiusNeighbors> {
        self.check_k(k, true)?;
        check_eps(eps)?;
        check_radius(sq_radius)?;
        self.check_query(query)?;

        let (best, count) = self.fixed_radius(query, sq_radius, k, eps);
        let (indices, distances) = best.into_sorted();
        Ok(RadiusNeighbors {
            indices,
            distances,
            count,
        })
    }

    /// Batched [`KdTree::radius_search`]. Counts are returned per query; with
    /// `k > 0` the neighbor matrix has one row per query, padded with
    /// [`NULL_INDEX`](crate::NULL_INDEX) where fewer than `k` points were
    /// found. With `k == 0` the neighbor matrix is empty.
    ///
    /// # Errors
    /// As [`KdTree::radius_search`], checked before any query runs.
    pub fn radius_search_batch(
        &self,
        queries: &PointMatrix,
        sq_radius: f64,
        k: usize,
        eps: f64,
    ) -> Result<RadiusBatch> {
        if queries.is_empty() {
            return Ok(RadiusBatch {
                neighbors: NeighborMatrix::with_capacity(0, k),
                counts: Vec::new(),
            });
        }
        self.check_k(k, true)?;
        check_eps(eps)?;
        check_radius(sq_radius)?;
        self.check_batch(queries)?;

        let rows = if k == 0 { 0 } else { queries.len() };
        let mut neighbors = NeighborMatrix::with_capacity(rows, k);
        let mut counts = Vec::with_capacity(queries.len());
        for query in queries.rows() {
            let (best, count) = self.fixed_radius(query, sq_radius, k, eps);
            counts.push(count);
            if k > 0 {
                let (indices, distances) = best.into_padded();
                neighbors.push_row(&indices, &distances);
            }
        }
        Ok(RadiusBatch { neighbors, counts })
    }

    /// Number of indexed points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always `false`: a tree cannot be built over an empty point set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn dim(&self) -> usize {
        self.points.dim()
    }

    #[must_use]
    pub fn point(&self, index: usize) -> Option<&[f64]> {
        self.points.get(index)
    }

    #[must_use]
    pub fn points(&self) -> &PointMatrix {
        &self.points
    }

    #[must_use]
    pub fn config(&self) -> &KdTreeConfig {
        &self.config
    }

    /// Caps the number of points a single query may examine. Queries that
    /// hit the cap return what they found so far, padding k-nearest results
    /// with [`NULL_INDEX`](crate::NULL_INDEX).
    pub fn set_max_points_visit(&mut self, limit: Option<usize>) {
        self.config.max_points_visit = limit;
    }

    #[must_use]
    pub fn stats(&self) -> TreeStats {
        let mut leaves = 0;
        let mut empty_leaves = 0;
        for node in &self.tree.nodes {
            if let Node::Leaf { start, end } = *node {
                leaves += 1;
                if start == end {
                    empty_leaves += 1;
                }
            }
        }
        TreeStats {
            points: self.len(),
            dim: self.dim(),
            nodes: self.tree.nodes.len(),
            leaves,
            empty_leaves,
            depth: self.tree.depth(),
        }
    }

    fn knn(&self, query: &[f64], k: usize, eps: f64, traversal: Traversal) -> (Vec<usize>, Vec<f64>) {
        let mut search = self.start(query, eps);
        let best = match traversal {
            Traversal::Standard => search.k_nearest(k),
            Traversal::Priority => search.k_nearest_priority(k),
        };
        trace!(k, eps, visited = search.visited(), "k-nearest search");
        if best.len() < k {
            debug!(
                k,
                found = best.len(),
                visited = search.visited(),
                "search stopped at the visit limit"
            );
        }
        best.into_padded()
    }

    fn knn_batch(
        &self,
        queries: &PointMatrix,
        k: usize,
        eps: f64,
        traversal: Traversal,
    ) -> Result<NeighborMatrix> {
        if queries.is_empty() {
            return Ok(NeighborMatrix::with_capacity(0, k));
        }
        self.check_k(k, false)?;
        check_eps(eps)?;
        self.check_batch(queries)?;

        let mut result = NeighborMatrix::with_capacity(queries.len(), k);
        for query in queries.rows() {
            let (indices, distances) = self.knn(query, k, eps, traversal);
            result.push_row(&indices, &distances);
        }
        Ok(result)
    }

    fn fixed_radius(&self, query: &[f64], sq_radius: f64, k: usize, eps: f64) -> (KBest, usize) {
        let mut search = self.start(query, eps);
        let (best, count) = search.fixed_radius(sq_radius, k);
        trace!(sq_radius, k, count, visited = search.visited(), "fixed-radius search");
        (best, count)
    }

    fn start<'a>(&'a self, query: &'a [f64], eps: f64) -> Search<'a> {
        Search::new(
            &self.tree,
            &self.points,
            query,
            eps,
            self.config.max_points_visit,
        )
    }

    fn check_k(&self, k: usize, allow_zero: bool) -> Result<()> {
        if k == 0 && !allow_zero {
            return Err(KdError::invalid("k must be at least 1"));
        }
        if k > self.len() {
            return Err(KdError::invalid(format!(
                "k = {k} exceeds the {} indexed points",
                self.len()
            )));
        }
        Ok(())
    }

    fn check_query(&self, query: &[f64]) -> Result<()> {
        if query.len() != self.dim() {
            return Err(KdError::dimension_mismatch(self.dim(), query.len()));
        }
        if query.iter().any(|x| !x.is_finite()) {
            return Err(KdError::invalid("query has a non-finite coordinate"));
        }
        Ok(())
    }

    fn check_batch(&self, queries: &PointMatrix) -> Result<()> {
        if queries.dim() != self.dim() {
            return Err(KdError::dimension_mismatch(self.dim(), queries.dim()));
        }
        queries.ensure_finite()
    }
}

fn check_eps(eps: f64) -> Result<()> {
    if eps.is_finite() && eps >= 0.0 {
        Ok(())
    } else {
        Err(KdError::invalid(format!("eps must be finite and non-negative, got {eps}")))
    }
}

fn check_radius(sq_radius: f64) -> Result<()> {
    if sq_radius >= 0.0 {
        Ok(())
    } else {
        Err(KdError::invalid(format!(
            "squared radius must be non-negative, got {sq_radius}"
        )))
    }
}

/// Shape of a built tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeStats {
    pub points: usize,
    pub dim: usize,
    pub nodes: usize,
    pub leaves: usize,
    pub empty_leaves: usize,
    pub depth: usize,
}

impl TreeStats {
    #[must_use]
    pub fn mean_leaf_size(&self) -> f64 {
        match (f64::value_from(self.points), f64::value_from(self.leaves)) {
            (Ok(points), Ok(leaves)) if leaves > 0.0 => points / leaves,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::KdTree;
    use crate::{config::KdTreeConfig, points::PointMatrix, KdError, SplitRule, NULL_INDEX};

    fn square() -> KdTree {
        KdTree::from_rows(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [5.0, 5.0]]).unwrap()
    }

    #[test]
    fn search_example() {
        let tree = square();
        let (indices, distances) = tree.search(&[0.0, 0.1], 2, 0.0).unwrap();
        assert_eq!(indices, vec![0, 2]);
        assert!((distances[0] - 0.01).abs() < 1e-12);
        assert!((distances[1] - 0.81).abs() < 1e-12);
    }

    #[test]
    fn invalid_arguments() {
        let tree = square();
        let invalid = |r: Result<(Vec<usize>, Vec<f64>), KdError>| {
            matches!(r, Err(KdError::InvalidInput(_)))
        };
        assert!(invalid(tree.search(&[0.0, 0.0], 5, 0.0)));
        assert!(invalid(tree.search(&[0.0, 0.0], 0, 0.0)));
        assert!(invalid(tree.search(&[0.0], 1, 0.0)));
        assert!(invalid(tree.search(&[0.0, f64::NAN], 1, 0.0)));
        assert!(invalid(tree.search(&[0.0, 0.0], 1, -0.5)));
        assert!(invalid(tree.search(&[0.0, 0.0], 1, f64::INFINITY)));
        assert!(invalid(tree.priority_search(&[0.0, 0.0], 5, 0.0)));

        assert!(tree.radius_search(&[0.0, 0.0], -1.0, 1, 0.0).is_err());
        assert!(tree.radius_search(&[0.0, 0.0], f64::NAN, 1, 0.0).is_err());
        assert!(tree.radius_search(&[0.0, 0.0], 1.0, 5, 0.0).is_err());
        assert!(tree.radius_search(&[0.0, 0.0, 0.0], 1.0, 1, 0.0).is_err());
    }

    #[test]
    fn construction_errors() {
        let empty: Vec<[f64; 2]> = Vec::new();
        assert!(matches!(KdTree::from_rows(&empty), Err(KdError::InvalidInput(_))));

        let ragged = vec![vec![0.0, 0.0], vec![1.0]];
        assert!(matches!(KdTree::from_rows(&ragged), Err(KdError::InvalidInput(_))));

        let nan = [[0.0, f64::NAN]];
        assert!(matches!(KdTree::from_rows(&nan), Err(KdError::InvalidInput(_))));

        let points = PointMatrix::from_rows(&[[0.0]]).unwrap();
        let config = KdTreeConfig::default().with_bucket_size(0);
        assert!(KdTree::with_config(points, config).is_err());
    }

    #[test]
    fn radius_example() {
        let tree = square();
        let result = tree.radius_search(&[0.0, 0.0], 1.0, 4, 0.0).unwrap();
        assert_eq!(result.count, 3);
        assert_eq!(result.indices, vec![0, 1, 2]);
        assert_eq!(result.distances, vec![0.0, 1.0, 1.0]);

        let capped = tree.radius_search(&[0.0, 0.0], 1.0, 1, 0.0).unwrap();
        assert_eq!(capped.count, 3);
        assert_eq!(capped.indices, vec![0]);

        let counted = tree.radius_search(&[0.0, 0.0], 100.0, 0, 0.0).unwrap();
        assert_eq!(counted.count, 4);
        assert!(counted.indices.is_empty());
        assert!(counted.distances.is_empty());
    }

    #[test]
    fn radius_batch_padding() {
        let tree = square();
        let queries = PointMatrix::from_rows(&[[0.0, 0.0], [5.0, 5.0]]).unwrap();
        let batch = tree.radius_search_batch(&queries, 1.0, 2, 0.0).unwrap();
        assert_eq!(batch.counts, vec![3, 1]);
        assert_eq!(batch.neighbors.shape(), (2, 2));
        assert_eq!(batch.neighbors.row(0).0, &[0, 1]);
        assert_eq!(batch.neighbors.row(1).0, &[3, NULL_INDEX]);
        assert_eq!(batch.neighbors.row(1).1[1], f64::INFINITY);

        let counts_only = tree.radius_search_batch(&queries, 1.0, 0, 0.0).unwrap();
        assert_eq!(counts_only.counts, vec![3, 1]);
        assert!(counts_only.neighbors.is_empty());
    }

    #[test]
    fn empty_batches() {
        let tree = square();
        let empty = PointMatrix::default();
        let result = tree.search_batch(&empty, 2, 0.0).unwrap();
        assert_eq!(result.shape(), (0, 2));
        let result = tree.priority_search_batch(&empty, 2, 0.0).unwrap();
        assert!(result.is_empty());
        let result = tree.radius_search_batch(&empty, 1.0, 2, 0.0).unwrap();
        assert!(result.counts.is_empty());
        assert!(result.neighbors.is_empty());
    }

    #[test]
    fn batch_dimension_mismatch() {
        let tree = square();
        let queries = PointMatrix::from_rows(&[[0.0, 0.0, 0.0]]).unwrap();
        assert!(tree.search_batch(&queries, 1, 0.0).is_err());
        assert!(tree.radius_search_batch(&queries, 1.0, 0, 0.0).is_err());
    }

    #[test]
    fn visit_limit_pads() {
        let rows: Vec<[f64; 1]> = (0..64_i32).map(|i| [f64::from(i)]).collect();
        let mut tree = KdTree::from_rows(&rows).unwrap();
        tree.set_max_points_visit(Some(1));
        let (indices, distances) = tree.search(&[0.0], 10, 0.0).unwrap();
        assert_eq!(indices.len(), 10);
        assert_eq!(indices[0], 0);
        assert_eq!(indices[9], NULL_INDEX);
        assert_eq!(distances[9], f64::INFINITY);

        tree.set_max_points_visit(None);
        let (indices, _) = tree.search(&[0.0], 10, 0.0).unwrap();
        assert_eq!(indices, (0..10).collect::<Vec<usize>>());
    }

    #[test]
    fn accessors_and_stats() {
        let config = KdTreeConfig::default()
            .with_bucket_size(2)
            .with_split_rule(SplitRule::Median);
        let points = PointMatrix::from_rows(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [5.0, 5.0]]).unwrap();
        let tree = KdTree::with_config(points, config).unwrap();
        assert_eq!(tree.len(), 4);
        assert!(!tree.is_empty());
        assert_eq!(tree.dim(), 2);
        assert_eq!(tree.point(3), Some(&[5.0, 5.0][..]));
        assert_eq!(tree.point(4), None);
        assert_eq!(tree.config().bucket_size, 2);

        let stats = tree.stats();
        assert_eq!(stats.points, 4);
        assert_eq!(stats.leaves, 2);
        assert_eq!(stats.nodes, 3);
        assert_eq!(stats.empty_leaves, 0);
        assert_eq!(stats.depth, 1);
        assert_eq!(stats.mean_leaf_size(), 2.0);
    }
}
