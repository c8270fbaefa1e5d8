//! Difference transform pipeline for apicmp.
//!
//! Every report produced by a paired traversal passes through the pipeline
//! before it reaches a reporter. The pipeline applies the registered
//! transforms round after round until the differences stop changing, caps
//! the number of rounds so that cycling transforms cannot loop forever, and
//! finally assigns a criticality to every difference that has none.
//!
//! # Quick Start
//!
//! ```rust
//! use apicmp_transform::{DifferencesTransform, PipelineConfig, TransformPipeline};
//! use apicmp_types::{Difference, ElementInfo, Report};
//!
//! let config = PipelineConfig::default();
//! let ignore_added = DifferencesTransform::from_json(
//!     "ignore-added",
//!     serde_json::json!({"differences": [{"code": "added", "ignore": true}]}),
//!     &config.criticalities,
//! )
//! .unwrap();
//!
//! let mut pipeline = TransformPipeline::new(config);
//! pipeline.add_transform(Box::new(ignore_added));
//!
//! let report = Report::new(
//!     None,
//!     Some(ElementInfo::new("key", "a", "a")),
//!     vec![Difference::builder("added").build().unwrap()],
//! )
//! .unwrap();
//! let result = pipeline.process(&report).unwrap();
//! assert!(result.is_empty());
//! ```

pub mod config;
pub mod error;
pub mod pipeline;
pub mod transform;
pub mod transforms;

// Re-exports for convenience.
pub use config::{PipelineConfig, DEFAULT_MAX_ROUNDS};
pub use error::{TransformError, TransformResult};
pub use pipeline::{PipelineResult, TransformPipeline};
pub use transform::{DifferenceTransform, TransformOutcome};
pub use transforms::{DifferenceRecipe, DifferencesConfig, DifferencesTransform};
