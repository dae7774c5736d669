use crate::{
    distance::squared_euclidean,
    error::{KdError, Result},
    points::PointMatrix,
    result::RadiusNeighbors,
    search::KBest,
};

/// Brute-force index answering the same queries as [`KdTree`](crate::KdTree)
/// by scanning every point. Ties are broken by index, so exact tree results
/// match it entry for entry.
pub struct LinearIndex {
    data: PointMatrix,
}

impl LinearIndex {
    /// # Errors
    /// `InvalidInput` if the point set is empty.
    pub fn new(data: PointMatrix) -> Result<Self> {
        if data.is_empty() {
            return Err(KdError::invalid("cannot index an empty point set"));
        }
        Ok(Self { data })
    }

    /// # Errors
    /// `InvalidInput` on a dimension mismatch or if `k` is not in `1..=len`.
    pub fn search(&self, query: &[f64], k: usize) -> Result<(Vec<usize>, Vec<f64>)> {
        self.check(query, k)?;
        if k == 0 {
            return Err(KdError::invalid("k must be at least 1"));
        }
        let mut best = KBest::new(k);
        for (i, point) in self.data.rows().enumerate() {
            best.insert(squared_euclidean(query, point), i);
        }
        Ok(best.into_sorted())
    }

    /// # Errors
    /// `InvalidInput` on a dimension mismatch or if `k > len`.
    pub fn radius_search(&self, query: &[f64], sq_radius: f64, k: usize) -> Result<RadiusNeighbors> {
        self.check(query, k)?;
        let mut best = KBest::new(k);
        let mut count = 0;
        for (i, point) in self.data.rows().enumerate() {
            let distance = squared_euclidean(query, point);
            if distance <= sq_radius {
                count += 1;
                best.insert(distance, i);
            }
        }
        let (indices, distances) = best.into_sorted();
        Ok(RadiusNeighbors {
            indices,
            distances,
            count,
        })
    }

    #[must_use]
    pub fn num_points(&self) -> usize {
        self.data.len()
    }

    fn check(&self, query: &[f64], k: usize) -> Result<()> {
        if query.len() != self.data.dim() {
            return Err(KdError::dimension_mismatch(self.data.dim(), query.len()));
        }
        if k > self.num_points() {
            return Err(KdError::invalid(format!(
                "k = {k} exceeds the {} indexed points",
                self.num_points()
            )));
        }
        Ok(())
    }
}
