//! Analysis orchestration for apicmp.
//!
//! An [`Analysis`] takes the extensions of an [`ExtensionRegistry`] and
//! compares two [`Api`](apicmp_types::Api)s with them: every analyzer builds
//! an old and a new forest through the tree filters, prunes them, and walks
//! them in lock-step; every report passes through the transform pipeline and
//! what survives reaches the reporters.
//!
//! # Key Types
//!
//! - [`ApiAnalyzer`] / [`ArchiveAnalyzer`] -- Format extensions
//! - [`ExtensionRegistry`] -- Analyzers, filters, transforms and reporters
//! - [`Analysis`] / [`AnalysisConfig`] -- One comparison run
//! - [`Reporter`] / [`CollectingReporter`] -- Report consumers
//! - [`JsonApiAnalyzer`] -- Key by key comparison of JSON documents
//!
//! # Quick Start
//!
//! ```rust
//! use apicmp_diff::KeyValueElement;
//! use apicmp_engine::{Analysis, AnalysisConfig, CollectingReporter, ExtensionRegistry, JsonApiAnalyzer};
//! use apicmp_types::{Api, InMemoryArchive};
//!
//! let old = Api::builder().archive(InMemoryArchive::new("v1.json", r#"{"a": "b"}"#.as_bytes().to_vec())).build();
//! let new = Api::builder().archive(InMemoryArchive::new("v2.json", r#"{"a": "c"}"#.as_bytes().to_vec())).build();
//!
//! let reporter = CollectingReporter::new();
//! let reports = reporter.handle();
//! let registry = ExtensionRegistry::<KeyValueElement>::new()
//!     .with_analyzer(JsonApiAnalyzer::new())
//!     .unwrap()
//!     .with_reporter(reporter)
//!     .unwrap();
//!
//! let mut analysis = Analysis::new(AnalysisConfig::default(), registry).unwrap();
//! analysis.run(&old, &new).unwrap();
//! assert_eq!(reports.lock().unwrap()[0].differences()[0].code(), "value-changed");
//! ```

pub mod analysis;
pub mod analyzer;
pub mod build;
pub mod error;
pub mod json;
pub mod registry;
pub mod reporter;
pub mod stats;

// Re-exports for convenience.
pub use analysis::{Analysis, AnalysisConfig};
pub use analyzer::{ApiAnalyzer, ArchiveAnalyzer, Discovered};
pub use build::{build_forest, BuildOptions};
pub use error::{EngineError, EngineResult, ReporterError};
pub use json::{JsonApiAnalyzer, JsonArchiveAnalyzer};
pub use registry::{ExtensionRegistry, FilterFactory};
pub use reporter::{CollectedReports, CollectingReporter, Reporter};
pub use stats::{AnalysisStats, AnalyzerStats};
