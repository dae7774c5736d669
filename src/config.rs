//! Construction and search tuning for [`KdTree`](crate::KdTree).

use serde::{Deserialize, Serialize};

use crate::error::{KdError, Result};

/// How a cell holding too many points is divided in two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SplitRule {
    /// Cut the longest side of the cell at its midpoint. Children may be empty.
    Midpoint,
    /// Cut at the cell midpoint, sliding the plane onto the nearest point
    /// when all points fall on one side.
    #[default]
    SlidingMidpoint,
    /// Cut the dimension of widest point spread at the median point.
    Median,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdTreeConfig {
    /// Maximum number of points stored in a leaf.
    pub bucket_size: usize,
    pub split_rule: SplitRule,
    /// Stop descending once more than this many points have been examined
    /// by a single query. `None` means unlimited.
    pub max_points_visit: Option<usize>,
}

impl Default for KdTreeConfig {
    fn default() -> Self {
        Self {
            bucket_size: 1,
            split_rule: SplitRule::SlidingMidpoint,
            max_points_visit: None,
        }
    }
}

impl KdTreeConfig {
    #[must_use]
    pub fn with_bucket_size(mut self, bucket_size: usize) -> Self {
        self.bucket_size = bucket_size;
        self
    }

    #[must_use]
    pub fn with_split_rule(mut self, split_rule: SplitRule) -> Self {
        self.split_rule = split_rule;
        self
    }

    #[must_use]
    pub fn with_max_points_visit(mut self, limit: Option<usize>) -> Self {
        self.max_points_visit = limit;
        self
    }

    /// # Errors
    /// `InvalidInput` if the bucket size is zero.
    pub fn validate(&self) -> Result<()> {
        if self.bucket_size == 0 {
            return Err(KdError::invalid("bucket size must be at least 1"));
        }
        Ok(())
    }
}
