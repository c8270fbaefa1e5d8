//! Error types for the diff crate.

use std::fmt;

use apicmp_forest::ForestError;
use apicmp_types::TypeError;

/// Which input of a co-iteration or comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// The old version.
    Left,
    /// The new version.
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

/// Errors that can occur during diff operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiffError {
    /// A co-iterated input was not strictly increasing.
    #[error("{side} input is not sorted: item {position} is not greater than its predecessor")]
    UnsortedInput { side: Side, position: usize },

    /// A difference analyzer failed.
    #[error("difference analyzer failed: {0}")]
    Analyzer(String),

    /// A report or difference could not be built.
    #[error("invalid report: {0}")]
    Report(#[from] TypeError),

    /// A forest was inconsistent.
    #[error("forest error: {0}")]
    Forest(#[from] ForestError),
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
