//! The analysis entry point: build, prune, walk, transform, report.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use apicmp_diff::{walk, PairingSink};
use apicmp_forest::ElementRef;
use apicmp_transform::{PipelineConfig, TransformPipeline};
use apicmp_types::{Api, Element, ElementInfo, Report};

use crate::analyzer::ApiAnalyzer;
use crate::build::{build_forest, BuildOptions};
use crate::error::{EngineError, EngineResult};
use crate::registry::{combined_filter, ExtensionRegistry, FilterFactory};
use crate::reporter::Reporter;
use crate::stats::{AnalysisStats, AnalyzerStats};

/// Settings for one [`Analysis`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisConfig {
    /// Remove elements outside the observable surface before comparing.
    pub prune_forests: bool,
    /// Whether roots found in supplementary archives enter the forests.
    pub process_supplementary: bool,
    pub pipeline: PipelineConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            prune_forests: true,
            process_supplementary: true,
            pipeline: PipelineConfig::default(),
        }
    }
}

/// Compares two APIs with every registered analyzer.
///
/// Per analyzer, both forests are built through the registered tree
/// filters, optionally pruned, then walked in lock-step. Each report goes
/// through the transform pipeline and what survives is handed to the
/// reporters in registration order.
pub struct Analysis<E: Element> {
    config: AnalysisConfig,
    analyzers: Vec<Box<dyn ApiAnalyzer<E>>>,
    filters: Vec<FilterFactory<E>>,
    pipeline: TransformPipeline,
    reporters: Vec<Box<dyn Reporter>>,
}

impl<E: Element + 'static> Analysis<E> {
    pub fn new(config: AnalysisConfig, registry: ExtensionRegistry<E>) -> EngineResult<Self> {
        config.pipeline.validate()?;

        let parts = registry.into_parts();
        let mut pipeline = TransformPipeline::new(config.pipeline.clone());
        for transform in parts.transforms {
            pipeline.add_transform(transform);
        }

        Ok(Self {
            config,
            analyzers: parts.analyzers,
            filters: parts.filters,
            pipeline,
            reporters: parts.reporters,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Compare `old` against `new`.
    ///
    /// The first error stops the analysis. Reports already delivered stay
    /// delivered.
    pub fn run(&mut self, old: &Api, new: &Api) -> EngineResult<AnalysisStats> {
        info!(
            old = %old,
            new = %new,
            analyzers = self.analyzers.len(),
            transforms = self.pipeline.transform_count(),
            reporters = self.reporters.len(),
            "analysis started"
        );

        let options = BuildOptions {
            include_supplementary: self.config.process_supplementary,
        };
        let mut stats = AnalysisStats::default();

        for analyzer in &mut self.analyzers {
            let mut analyzer_stats = AnalyzerStats {
                analyzer: analyzer.id().to_string(),
                ..AnalyzerStats::default()
            };

            let mut old_archives = analyzer.archive_analyzer(old)?;
            let mut new_archives = analyzer.archive_analyzer(new)?;

            let mut old_forest = build_forest(
                old,
                old_archives.as_mut(),
                combined_filter(&self.filters, old).as_mut(),
                options,
            )?;
            let mut new_forest = build_forest(
                new,
                new_archives.as_mut(),
                combined_filter(&self.filters, new).as_mut(),
                options,
            )?;

            if self.config.prune_forests {
                analyzer_stats.pruned += old_archives.prune(&mut old_forest)?.removed.len();
                analyzer_stats.pruned += new_archives.prune(&mut new_forest)?.removed.len();
            }
            analyzer_stats.old_elements = old_forest.len();
            analyzer_stats.new_elements = new_forest.len();

            let mut differences = analyzer.difference_analyzer()?;
            let mut sink = ReportingSink {
                pipeline: &mut self.pipeline,
                reporters: &mut self.reporters,
                stats: &mut analyzer_stats,
            };
            let walk_stats = walk(&old_forest, &new_forest, differences.as_mut(), &mut sink)?;
            analyzer_stats.walk = walk_stats;

            debug!(
                analyzer = %analyzer_stats.analyzer,
                pairs = walk_stats.pairs,
                reports = analyzer_stats.reports_delivered,
                "analyzer finished"
            );
            stats.analyzers.push(analyzer_stats);
        }

        info!(
            pairs = stats.pairs(),
            reports = stats.reports_delivered(),
            differences = stats.differences_delivered(),
            "analysis finished"
        );
        Ok(stats)
    }
}

/// Routes the reports of a walk through the pipeline to the reporters.
struct ReportingSink<'a> {
    pipeline: &'a mut TransformPipeline,
    reporters: &'a mut [Box<dyn Reporter>],
    stats: &'a mut AnalyzerStats,
}

fn infos<E: Element>(
    old: Option<ElementRef<'_, E>>,
    new: Option<ElementRef<'_, E>>,
) -> (Option<ElementInfo>, Option<ElementInfo>) {
    (old.map(|e| e.info()), new.map(|e| e.info()))
}

impl<E: Element> PairingSink<E> for ReportingSink<'_> {
    type Error = EngineError;

    fn begin(&mut self, old: Option<ElementRef<'_, E>>, new: Option<ElementRef<'_, E>>) -> EngineResult<()> {
        let (old, new) = infos(old, new);
        self.pipeline.start_traversal(old.as_ref(), new.as_ref())?;
        Ok(())
    }

    fn accept(&mut self, report: Report) -> EngineResult<()> {
        let result = self.pipeline.process(&report)?;
        self.stats.discarded += result.discarded;
        self.stats.max_rounds = self.stats.max_rounds.max(result.rounds);
        if result.is_empty() {
            return Ok(());
        }

        for reporter in self.reporters.iter_mut() {
            reporter
                .report(&result.report)
                .map_err(|source| EngineError::Reporter {
                    reporter: reporter.id().to_string(),
                    source,
                })?;
        }
        self.stats.reports_delivered += 1;
        self.stats.differences_delivered += result.report.differences().len();
        Ok(())
    }

    fn end(&mut self, old: Option<ElementRef<'_, E>>, new: Option<ElementRef<'_, E>>) -> EngineResult<()> {
        let (old, new) = infos(old, new);
        self.pipeline.end_traversal(old.as_ref(), new.as_ref())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apicmp_transform::TransformError;
    use serde_json::json;

    #[test]
    fn config_defaults() {
        let config = AnalysisConfig::default();
        assert!(config.prune_forests);
        assert!(config.process_supplementary);
        assert_eq!(config.pipeline, PipelineConfig::default());
    }

    #[test]
    fn partial_json_config_keeps_defaults() {
        let config: AnalysisConfig = serde_json::from_value(json!({
            "pruneForests": false,
            "pipeline": {"maxRounds": 10}
        }))
        .unwrap();
        assert!(!config.prune_forests);
        assert!(config.process_supplementary);
        assert_eq!(config.pipeline.max_rounds, 10);
    }

    #[test]
    fn invalid_pipeline_config_is_rejected_up_front() {
        let config = AnalysisConfig {
            pipeline: PipelineConfig::with_max_rounds(0),
            ..AnalysisConfig::default()
        };
        let err = Analysis::<apicmp_diff::KeyValueElement>::new(config, ExtensionRegistry::new())
            .err()
            .unwrap();
        assert!(matches!(err, EngineError::Transform(TransformError::Config(_))));
        assert!(err.is_configuration_error());
    }

    #[test]
    fn no_analyzers_means_nothing_to_report() {
        let mut analysis =
            Analysis::<apicmp_diff::KeyValueElement>::new(AnalysisConfig::default(), ExtensionRegistry::new())
                .unwrap();
        let api = Api::builder().build();
        let stats = analysis.run(&api, &api).unwrap();
        assert!(stats.analyzers.is_empty());
        assert_eq!(stats.pairs(), 0);
    }
}
