use serde::{Deserialize, Serialize};

use apicmp_types::{Criticality, SeverityMapping};

use crate::error::{TransformError, TransformResult};

/// Default cap on transform rounds per pairing.
pub const DEFAULT_MAX_ROUNDS: usize = 1_000_000;

/// Configuration for the transform pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Rounds allowed per pairing before the transforms are considered to
    /// cycle.
    pub max_rounds: usize,
    /// Criticality given to differences that no transform assigned one to.
    pub severity_mapping: SeverityMapping,
    /// Criticalities transforms may refer to by name.
    pub criticalities: Vec<Criticality>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            severity_mapping: SeverityMapping::default(),
            criticalities: Criticality::defaults(),
        }
    }
}

impl PipelineConfig {
    /// Default configuration with a different round cap.
    pub fn with_max_rounds(max_rounds: usize) -> Self {
        Self {
            max_rounds,
            ..Default::default()
        }
    }

    /// Look up a known criticality by name.
    pub fn criticality(&self, name: &str) -> TransformResult<&Criticality> {
        Ok(Criticality::by_name(&self.criticalities, name)?)
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> TransformResult<()> {
        if self.max_rounds == 0 {
            return Err(TransformError::Config("maxRounds must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_rounds, 1_000_000);
        assert!(config.validate().is_ok());
        assert_eq!(config.criticality("error").unwrap(), &Criticality::error());
        assert!(config.criticality("nope").is_err());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: PipelineConfig = serde_json::from_str(r#"{"maxRounds": 100}"#).unwrap();
        assert_eq!(config.max_rounds, 100);
        assert_eq!(config.criticalities, Criticality::defaults());
    }

    #[test]
    fn zero_rounds_is_invalid() {
        let err = PipelineConfig::with_max_rounds(0).validate().unwrap_err();
        assert!(err.is_configuration_error());
    }
}
