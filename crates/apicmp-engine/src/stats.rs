//! Counters collected while an analysis runs.

use serde::{Deserialize, Serialize};

use apicmp_diff::WalkStats;

/// What one analyzer saw and reported.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzerStats {
    pub analyzer: String,
    /// Elements in the old and new forest after filtering and pruning.
    pub old_elements: usize,
    pub new_elements: usize,
    /// Elements removed by pruning, both forests together.
    pub pruned: usize,
    pub walk: WalkStats,
    /// Reports and differences handed to reporters, after transforms.
    pub reports_delivered: usize,
    pub differences_delivered: usize,
    /// Differences dropped by transforms.
    pub discarded: usize,
    /// Most transform rounds any single pairing needed.
    pub max_rounds: usize,
}

/// Counters for a whole analysis, one entry per analyzer in registration
/// order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub analyzers: Vec<AnalyzerStats>,
}

impl AnalysisStats {
    pub fn pairs(&self) -> usize {
        self.analyzers.iter().map(|a| a.walk.pairs).sum()
    }

    pub fn reports_delivered(&self) -> usize {
        self.analyzers.iter().map(|a| a.reports_delivered).sum()
    }

    pub fn differences_delivered(&self) -> usize {
        self.analyzers.iter().map(|a| a.differences_delivered).sum()
    }

    pub fn analyzer(&self, id: &str) -> Option<&AnalyzerStats> {
        self.analyzers.iter().find(|a| a.analyzer == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_sum_over_analyzers() {
        let stats = AnalysisStats {
            analyzers: vec![
                AnalyzerStats {
                    analyzer: "a".into(),
                    walk: WalkStats {
                        pairs: 3,
                        ..WalkStats::default()
                    },
                    reports_delivered: 1,
                    differences_delivered: 2,
                    ..AnalyzerStats::default()
                },
                AnalyzerStats {
                    analyzer: "b".into(),
                    walk: WalkStats {
                        pairs: 4,
                        ..WalkStats::default()
                    },
                    reports_delivered: 2,
                    differences_delivered: 2,
                    ..AnalyzerStats::default()
                },
            ],
        };
        assert_eq!(stats.pairs(), 7);
        assert_eq!(stats.reports_delivered(), 3);
        assert_eq!(stats.differences_delivered(), 4);
        assert_eq!(stats.analyzer("b").map(|s| s.walk.pairs), Some(4));
        assert!(stats.analyzer("c").is_none());
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let value = serde_json::to_value(AnalyzerStats::default()).unwrap();
        assert!(value.get("reportsDelivered").is_some());
        assert!(value.get("oldElements").is_some());
    }
}
