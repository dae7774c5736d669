use crate::error::{KdError, Result};

/// A dense, row-major buffer of `len() x dim()` coordinates.
///
/// Used both for the indexed point set and for batches of query points.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointMatrix {
    coords: Vec<f64>,
    dim: usize,
}

impl PointMatrix {
    /// Builds a matrix from rows. The dimension is taken from the first row
    /// and every other row must match it. An empty slice yields an empty
    /// matrix of dimension zero.
    ///
    /// # Errors
    /// `InvalidInput` if a row has a different length than the first one or
    /// if the rows are zero-dimensional.
    pub fn from_rows<P: AsRef<[f64]>>(rows: &[P]) -> Result<Self> {
        let Some(first) = rows.first() else {
            return Ok(Self::default());
        };
        let dim = first.as_ref().len();
        if dim == 0 {
            return Err(KdError::invalid("points must have at least one dimension"));
        }
        let mut coords = Vec::with_capacity(rows.len() * dim);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != dim {
                return Err(KdError::invalid(format!(
                    "point {i} has dimension {}, expected {dim}",
                    row.len()
                )));
            }
            coords.extend_from_slice(row);
        }
        Ok(PointMatrix { coords, dim })
    }

    /// Wraps a flat buffer holding `coords.len() / dim` points.
    ///
    /// # Errors
    /// `InvalidInput` if `dim` is zero or does not divide the buffer length.
    pub fn from_flat(coords: Vec<f64>, dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(KdError::invalid("points must have at least one dimension"));
        }
        if coords.len() % dim != 0 {
            return Err(KdError::invalid(format!(
                "buffer of {} coordinates is not a whole number of {dim}-dimensional points",
                coords.len()
            )));
        }
        Ok(PointMatrix { coords, dim })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.coords.len() / self.dim
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// # Panics
    /// If `i >= self.len()`.
    #[must_use]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.coords[i * self.dim..(i + 1) * self.dim]
    }

    #[must_use]
    pub fn get(&self, i: usize) -> Option<&[f64]> {
        if i < self.len() {
            Some(self.row(i))
        } else {
            None
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        // `chunks_exact` panics on a zero chunk size.
        self.coords.chunks_exact(self.dim.max(1))
    }

    #[must_use]
    pub fn as_flat(&self) -> &[f64] {
        &self.coords
    }

    pub(crate) fn ensure_finite(&self) -> Result<()> {
        match self.coords.iter().position(|x| !x.is_finite()) {
            Some(pos) => Err(KdError::invalid(format!(
                "point {} has a non-finite coordinate",
                pos / self.dim
            ))),
            None => Ok(()),
        }
    }
}
