use tracing::{debug, warn};

use apicmp_types::{Difference, DifferenceSeverity, ElementInfo, Report};

use crate::config::PipelineConfig;
use crate::error::{TransformError, TransformResult};
use crate::transform::{DifferenceTransform, TransformOutcome};

// ---------------------------------------------------------------------------
// PipelineResult
// ---------------------------------------------------------------------------

/// The outcome of running one report through the pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineResult {
    /// The report with the surviving differences, each with a criticality.
    pub report: Report,
    /// Rounds run until the differences stopped changing.
    pub rounds: usize,
    /// Replacements that changed a difference, over all rounds.
    pub replaced: usize,
    /// Differences dropped by a transform.
    pub discarded: usize,
}

impl PipelineResult {
    /// Returns `true` if no difference survived.
    pub fn is_empty(&self) -> bool {
        self.report.is_empty()
    }
}

// ---------------------------------------------------------------------------
// TransformPipeline
// ---------------------------------------------------------------------------

/// Applies the registered transforms to every report until the differences
/// reach a fixed point.
///
/// A round offers every difference to every interested transform, in
/// registration order. Rounds repeat while a round ends with a different
/// list of differences than it started with. After
/// [`PipelineConfig::max_rounds`] rounds without a fixed point the pairing
/// fails with [`TransformError::NonConvergent`].
pub struct TransformPipeline {
    transforms: Vec<Box<dyn DifferenceTransform>>,
    config: PipelineConfig,
}

impl TransformPipeline {
    /// Create an empty pipeline with the given configuration.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            transforms: Vec::new(),
            config,
        }
    }

    /// Append a transform to the end of the pipeline.
    pub fn add_transform(&mut self, transform: Box<dyn DifferenceTransform>) {
        self.transforms.push(transform);
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Number of transforms in the pipeline.
    pub fn transform_count(&self) -> usize {
        self.transforms.len()
    }

    /// Tell every transform that a pairing begins.
    pub fn start_traversal(&mut self, old: Option<&ElementInfo>, new: Option<&ElementInfo>) -> TransformResult<()> {
        for transform in &mut self.transforms {
            transform.start_traversal(old, new)?;
        }
        Ok(())
    }

    /// Tell every transform that a pairing ended.
    pub fn end_traversal(&mut self, old: Option<&ElementInfo>, new: Option<&ElementInfo>) -> TransformResult<()> {
        for transform in &mut self.transforms {
            transform.end_traversal(old, new)?;
        }
        Ok(())
    }

    /// Transform the differences of `report` until they stop changing, then
    /// assign criticalities from the severity mapping where none was set.
    pub fn process(&mut self, report: &Report) -> TransformResult<PipelineResult> {
        let old = report.old();
        let new = report.new_element();
        let mut differences = report.differences().to_vec();
        let mut rounds = 0;
        let mut replaced = 0;
        let mut discarded = 0;

        loop {
            rounds += 1;
            let start = differences.clone();

            for transform in &mut self.transforms {
                let mut next = Vec::with_capacity(differences.len());
                for difference in differences {
                    if !transform.is_interested_in(difference.code()) {
                        next.push(difference);
                        continue;
                    }
                    match transform.transform(old, new, &difference)? {
                        TransformOutcome::Keep => next.push(difference),
                        TransformOutcome::Replace(replacement) => {
                            if replacement != difference {
                                debug!(
                                    transform = transform.id(),
                                    from = %difference,
                                    to = %replacement,
                                    "difference replaced"
                                );
                                replaced += 1;
                            }
                            next.push(replacement);
                        }
                        TransformOutcome::Discard => {
                            debug!(transform = transform.id(), difference = %difference, "difference discarded");
                            discarded += 1;
                        }
                    }
                }
                differences = next;
            }

            if differences == start {
                break;
            }
            if rounds % 100 == 0 {
                warn!(
                    pairing = %report,
                    rounds,
                    "transforms keep changing the differences, they may be cycling"
                );
            }
            if rounds >= self.config.max_rounds {
                return Err(TransformError::NonConvergent {
                    old: old.cloned(),
                    new: new.cloned(),
                    last_differences: differences,
                    rounds,
                });
            }
        }

        let differences: Vec<Difference> = differences
            .into_iter()
            .map(|d| self.with_default_criticality(d))
            .collect();

        Ok(PipelineResult {
            report: report.with_differences(differences),
            rounds,
            replaced,
            discarded,
        })
    }

    fn with_default_criticality(&self, difference: Difference) -> Difference {
        if difference.criticality().is_some() {
            return difference;
        }
        let severity = difference.max_severity().unwrap_or(DifferenceSeverity::Equivalent);
        difference.with_criticality(self.config.severity_mapping.criticality_for(severity))
    }
}
