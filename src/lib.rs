//! Kindex: a static k-d tree for nearest neighbor search.
//!
//! A [`KdTree`] is built once over a fixed set of points and answers
//! k-nearest-neighbor queries (exact or approximate, depth-first or
//! best-bin-first) and fixed-radius queries with a result cap.
//!
//! ```
//! use kindex::KdTree;
//!
//! let tree = KdTree::from_rows(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [5.0, 5.0]]).unwrap();
//! let (indices, distances) = tree.search(&[0.0, 0.1], 2, 0.0).unwrap();
//! assert_eq!(indices, vec![0, 2]);
//! assert!((distances[1] - 0.81).abs() < 1e-12);
//!
//! let found = tree.radius_search(&[0.0, 0.0], 1.0, 0, 0.0).unwrap();
//! assert_eq!(found.count, 3);
//! ```
mod build;
pub mod config;
mod distance;
mod error;
mod kdtree;
#[allow(clippy::module_name_repetitions)]
mod linear;
mod node;
mod points;
mod rect;
mod result;
mod search;

pub use config::{KdTreeConfig, SplitRule};
pub use error::{KdError, Result};
pub use kdtree::{KdTree, TreeStats};
pub use linear::LinearIndex;
pub use points::PointMatrix;
pub use result::{NeighborMatrix, RadiusBatch, RadiusNeighbors, NULL_INDEX};
