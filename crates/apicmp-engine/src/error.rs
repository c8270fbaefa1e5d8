use thiserror::Error;

use apicmp_diff::DiffError;
use apicmp_forest::ForestError;
use apicmp_transform::TransformError;
use apicmp_types::TypeError;

/// A reporter could not accept a report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ReporterError(pub String);

impl ReporterError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to extract API {api} from archive '{archive}': {message}")]
    Extraction {
        api: String,
        archive: String,
        message: String,
    },

    #[error("reporter '{reporter}' failed: {source}")]
    Reporter {
        reporter: String,
        #[source]
        source: ReporterError,
    },

    #[error("duplicate extension id: {0}")]
    DuplicateExtension(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("transform error: {0}")]
    Transform(#[from] TransformError),

    #[error("diff error: {0}")]
    Diff(#[from] DiffError),

    #[error("forest error: {0}")]
    Forest(#[from] ForestError),

    #[error("type error: {0}")]
    Type(#[from] TypeError),
}

impl EngineError {
    /// Create an extraction error for an archive of an API.
    pub fn extraction(api: impl ToString, archive: impl Into<String>, message: impl ToString) -> Self {
        Self::Extraction {
            api: api.to_string(),
            archive: archive.into(),
            message: message.to_string(),
        }
    }

    /// Whether the error points at a misconfiguration (a cycling transform
    /// chain, an invalid setting) rather than at the analyzed archives.
    pub fn is_configuration_error(&self) -> bool {
        match self {
            Self::Transform(e) => e.is_configuration_error(),
            Self::Config(_) | Self::DuplicateExtension(_) => true,
            _ => false,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
