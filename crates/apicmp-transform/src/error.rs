use apicmp_types::{Difference, ElementInfo, TypeError};

/// Errors that can occur while transforming differences.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransformError {
    /// The transforms kept changing the differences of a pairing.
    #[error(
        "transforms did not converge for {} after {rounds} rounds ({} differences left)",
        pairing(.old, .new),
        .last_differences.len()
    )]
    NonConvergent {
        old: Option<ElementInfo>,
        new: Option<ElementInfo>,
        last_differences: Vec<Difference>,
        rounds: usize,
    },

    /// A transform failed.
    #[error("transform '{id}' failed: {message}")]
    Transform { id: String, message: String },

    /// Configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// A difference, report or pattern was invalid.
    #[error(transparent)]
    Type(#[from] TypeError),
}

impl TransformError {
    /// Create a transform error with an id and message.
    pub fn transform(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transform {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Whether the error comes from a misconfigured transform chain rather
    /// than from the artifacts being compared.
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::NonConvergent { .. } | Self::Config(_))
    }
}

fn pairing(old: &Option<ElementInfo>, new: &Option<ElementInfo>) -> String {
    let side = |e: &Option<ElementInfo>| e.as_ref().map_or_else(|| "(none)".to_string(), |e| e.to_string());
    format!("{} -> {}", side(old), side(new))
}

/// Convenience alias for transform results.
pub type TransformResult<T> = Result<T, TransformError>;
