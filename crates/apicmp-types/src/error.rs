use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("a report needs at least one of the old or new element")]
    EmptyPairing,

    #[error("difference is missing a code")]
    MissingCode,

    #[error("unknown criticality '{0}'")]
    UnknownCriticality(String),

    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("failed to read archive '{archive}': {message}")]
    ArchiveRead { archive: String, message: String },
}

/// Convenience alias for results with [`TypeError`].
pub type TypeResult<T> = Result<T, TypeError>;
