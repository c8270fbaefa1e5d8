//! Error types for element forests.

use crate::forest::ElementId;

/// Errors that can occur while mutating a forest or its use-site graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ForestError {
    /// The id was never handed out by this forest.
    #[error("element not found: {0}")]
    NotFound(ElementId),

    /// The element was already removed from the forest.
    #[error("element {0} was already removed")]
    AlreadyRemoved(ElementId),

    /// An operation referenced an element that is no longer in the forest.
    #[error("element {0} is detached from the forest")]
    Detached(ElementId),
}

/// Convenience alias for forest results.
pub type ForestResult<T> = Result<T, ForestError>;
