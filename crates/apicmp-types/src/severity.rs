//! Compatibility classification: what kind of compatibility a difference
//! affects, how badly, and how much the project cares.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The dimension of compatibility a difference is classified along.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompatibilityType {
    /// Callers no longer compile against the new version.
    Source,
    /// Already-built callers no longer link or load.
    Binary,
    /// The behavior or meaning changed while the shape did not.
    Semantic,
    /// Anything the other categories do not cover.
    Other,
}

impl CompatibilityType {
    /// All compatibility types, in declaration order.
    pub const ALL: [CompatibilityType; 4] = [Self::Source, Self::Binary, Self::Semantic, Self::Other];
}

impl fmt::Display for CompatibilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => write!(f, "SOURCE"),
            Self::Binary => write!(f, "BINARY"),
            Self::Semantic => write!(f, "SEMANTIC"),
            Self::Other => write!(f, "OTHER"),
        }
    }
}

/// How severe a difference is for one compatibility type.
///
/// Variants are ordered from harmless to breaking so `max()` over a
/// classification yields the worst impact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DifferenceSeverity {
    Equivalent,
    NonBreaking,
    PotentiallyBreaking,
    Breaking,
}

impl fmt::Display for DifferenceSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equivalent => write!(f, "EQUIVALENT"),
            Self::NonBreaking => write!(f, "NON_BREAKING"),
            Self::PotentiallyBreaking => write!(f, "POTENTIALLY_BREAKING"),
            Self::Breaking => write!(f, "BREAKING"),
        }
    }
}

/// How much a project cares about a difference.
///
/// Unlike [`DifferenceSeverity`], which is assigned by analyzers, criticality
/// is policy: transforms and the severity mapping assign it, and reporters
/// compare it against a minimum threshold.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Criticality {
    name: String,
    level: u32,
}

impl Criticality {
    pub const ALLOWED_LEVEL: u32 = 1000;
    pub const DOCUMENTED_LEVEL: u32 = 2000;
    pub const HIGHLIGHT_LEVEL: u32 = 3000;
    pub const ERROR_LEVEL: u32 = u32::MAX;

    /// Create a custom criticality.
    pub fn new(name: impl Into<String>, level: u32) -> Self {
        Self {
            name: name.into(),
            level,
        }
    }

    /// The difference is allowed and considered OK.
    pub fn allowed() -> Self {
        Self::new("allowed", Self::ALLOWED_LEVEL)
    }

    /// The difference is necessary and documented.
    pub fn documented() -> Self {
        Self::new("documented", Self::DOCUMENTED_LEVEL)
    }

    /// The difference is documented but should stand out in reports.
    pub fn highlight() -> Self {
        Self::new("highlight", Self::HIGHLIGHT_LEVEL)
    }

    /// The difference is not allowed. Nothing is more critical.
    pub fn error() -> Self {
        Self::new("error", Self::ERROR_LEVEL)
    }

    /// The built-in criticalities, least critical first.
    pub fn defaults() -> Vec<Criticality> {
        vec![
            Self::allowed(),
            Self::documented(),
            Self::highlight(),
            Self::error(),
        ]
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// Look up a criticality by name among `known`.
    pub fn by_name<'a>(known: &'a [Criticality], name: &str) -> Result<&'a Criticality, TypeError> {
        known
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| TypeError::UnknownCriticality(name.to_string()))
    }
}

impl PartialOrd for Criticality {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Criticality {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.level
            .cmp(&other.level)
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl fmt::Display for Criticality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Maps the worst severity of a difference to the criticality it receives
/// when no transform assigned one explicitly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityMapping {
    mapping: BTreeMap<DifferenceSeverity, Criticality>,
}

impl SeverityMapping {
    pub fn new(mapping: BTreeMap<DifferenceSeverity, Criticality>) -> Self {
        Self { mapping }
    }

    /// The criticality for `severity`, falling back to `error` for severities
    /// the mapping does not mention.
    pub fn criticality_for(&self, severity: DifferenceSeverity) -> Criticality {
        self.mapping
            .get(&severity)
            .cloned()
            .unwrap_or_else(Criticality::error)
    }
}

impl Default for SeverityMapping {
    fn default() -> Self {
        let mut mapping = BTreeMap::new();
        mapping.insert(DifferenceSeverity::Equivalent, Criticality::allowed());
        mapping.insert(DifferenceSeverity::NonBreaking, Criticality::documented());
        mapping.insert(DifferenceSeverity::PotentiallyBreaking, Criticality::error());
        mapping.insert(DifferenceSeverity::Breaking, Criticality::error());
        Self { mapping }
    }
}
