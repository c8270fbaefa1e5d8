use std::fmt;

use serde::{Deserialize, Serialize};

use crate::difference::Difference;
use crate::element::ElementInfo;
use crate::error::TypeError;

/// The differences found for one old/new element pairing.
///
/// At least one side is always present.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    old: Option<ElementInfo>,
    new: Option<ElementInfo>,
    differences: Vec<Difference>,
}

impl Report {
    /// Create a report, rejecting a pairing where both sides are absent.
    pub fn new(
        old: Option<ElementInfo>,
        new: Option<ElementInfo>,
        differences: Vec<Difference>,
    ) -> Result<Self, TypeError> {
        if old.is_none() && new.is_none() {
            return Err(TypeError::EmptyPairing);
        }
        Ok(Self {
            old,
            new,
            differences,
        })
    }

    pub fn old(&self) -> Option<&ElementInfo> {
        self.old.as_ref()
    }

    pub fn new_element(&self) -> Option<&ElementInfo> {
        self.new.as_ref()
    }

    pub fn differences(&self) -> &[Difference] {
        &self.differences
    }

    pub fn is_empty(&self) -> bool {
        self.differences.is_empty()
    }

    /// A report for the same pairing with a different set of differences.
    pub fn with_differences(&self, differences: Vec<Difference>) -> Self {
        Self {
            old: self.old.clone(),
            new: self.new.clone(),
            differences,
        }
    }

    pub fn into_differences(self) -> Vec<Difference> {
        self.differences
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.old, &self.new) {
            (Some(old), Some(new)) => write!(f, "{old} -> {new}")?,
            (Some(old), None) => write!(f, "{old} -> (none)")?,
            (None, Some(new)) => write!(f, "(none) -> {new}")?,
            (None, None) => write!(f, "(none) -> (none)")?,
        }
        write!(f, ": {} difference(s)", self.differences.len())
    }
}
