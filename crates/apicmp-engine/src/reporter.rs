//! Reporters receive the differences that survived the transform pipeline.

use std::sync::{Arc, Mutex};

use tracing::debug;

use apicmp_types::{Criticality, Report};

use crate::error::ReporterError;

/// Consumer of final reports.
///
/// Called once per non-empty report, after transforms ran, in registration
/// order. A failure stops the analysis.
pub trait Reporter: Send {
    fn id(&self) -> &str;

    fn report(&mut self, report: &Report) -> Result<(), ReporterError>;
}

/// Shared handle to the reports a [`CollectingReporter`] kept.
pub type CollectedReports = Arc<Mutex<Vec<Report>>>;

/// Keeps every report, minus the differences below a minimum criticality.
///
/// Reports left without differences are dropped.
#[derive(Debug)]
pub struct CollectingReporter {
    id: String,
    minimum: Option<Criticality>,
    reports: CollectedReports,
}

impl CollectingReporter {
    pub const DEFAULT_ID: &'static str = "apicmp.collect";

    pub fn new() -> Self {
        Self {
            id: Self::DEFAULT_ID.to_string(),
            minimum: None,
            reports: CollectedReports::default(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Drop differences whose criticality is lower than `minimum`.
    ///
    /// Differences without a criticality are always kept.
    pub fn with_minimum_criticality(mut self, minimum: Criticality) -> Self {
        self.minimum = Some(minimum);
        self
    }

    /// A handle that stays valid after the reporter moved into a registry.
    pub fn handle(&self) -> CollectedReports {
        Arc::clone(&self.reports)
    }

    fn keeps(&self, criticality: Option<&Criticality>) -> bool {
        match (&self.minimum, criticality) {
            (Some(minimum), Some(criticality)) => criticality >= minimum,
            _ => true,
        }
    }
}

impl Default for CollectingReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for CollectingReporter {
    fn id(&self) -> &str {
        &self.id
    }

    fn report(&mut self, report: &Report) -> Result<(), ReporterError> {
        let kept: Vec<_> = report
            .differences()
            .iter()
            .filter(|d| self.keeps(d.criticality()))
            .cloned()
            .collect();
        if kept.is_empty() {
            debug!(pairing = %report, "all differences below minimum criticality");
            return Ok(());
        }

        let mut reports = self
            .reports
            .lock()
            .map_err(|_| ReporterError::new("collected reports lock poisoned"))?;
        reports.push(report.with_differences(kept));
        Ok(())
    }
}
