use thiserror::Error;

/// Errors returned by [`KdTree`](crate::KdTree) and [`LinearIndex`](crate::LinearIndex).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KdError {
    /// A precondition on the arguments was violated (empty point set,
    /// dimension mismatch, `k` larger than the point count, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An index does not fit the integer type it is being exported to.
    #[error("index {index} does not fit into {target}")]
    OutOfRange { index: usize, target: &'static str },
}

impl KdError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        KdError::InvalidInput(msg.into())
    }

    pub(crate) fn dimension_mismatch(expected: usize, got: usize) -> Self {
        KdError::InvalidInput(format!(
            "dimension mismatch: expected {expected}, got {got}"
        ))
    }
}

pub type Result<T> = std::result::Result<T, KdError>;
