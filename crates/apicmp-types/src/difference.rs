//! A single classified discrepancy between an old and a new element.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::severity::{CompatibilityType, Criticality, DifferenceSeverity};

/// One difference found between a paired old and new element.
///
/// Differences are immutable values. Transforms "change" a difference by
/// producing a new one, usually via [`Difference::to_builder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Difference {
    code: String,
    name: String,
    description: Option<String>,
    classification: BTreeMap<CompatibilityType, DifferenceSeverity>,
    attachments: BTreeMap<String, String>,
    identifying_attachments: BTreeSet<String>,
    justification: Option<String>,
    criticality: Option<Criticality>,
}

impl Difference {
    /// Start building a difference with the given stable code.
    pub fn builder(code: impl Into<String>) -> DifferenceBuilder {
        DifferenceBuilder {
            code: code.into(),
            ..DifferenceBuilder::default()
        }
    }

    /// A builder pre-populated with every field of this difference.
    pub fn to_builder(&self) -> DifferenceBuilder {
        DifferenceBuilder {
            code: self.code.clone(),
            name: Some(self.name.clone()),
            description: self.description.clone(),
            classification: self.classification.clone(),
            attachments: self.attachments.clone(),
            identifying_attachments: self.identifying_attachments.clone(),
            justification: self.justification.clone(),
            criticality: self.criticality.clone(),
        }
    }

    /// The analyzer-specific stable code, e.g. `"value-changed"`.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Human-readable name of the difference.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn classification(&self) -> &BTreeMap<CompatibilityType, DifferenceSeverity> {
        &self.classification
    }

    /// Severity for one compatibility type, if classified.
    pub fn severity(&self, compatibility: CompatibilityType) -> Option<DifferenceSeverity> {
        self.classification.get(&compatibility).copied()
    }

    /// The worst severity across all compatibility types.
    pub fn max_severity(&self) -> Option<DifferenceSeverity> {
        self.classification.values().copied().max()
    }

    pub fn attachments(&self) -> &BTreeMap<String, String> {
        &self.attachments
    }

    pub fn attachment(&self, key: &str) -> Option<&str> {
        self.attachments.get(key).map(String::as_str)
    }

    /// Whether the named attachment identifies the difference (as opposed to
    /// merely describing it), e.g. the path of the changed element.
    pub fn is_identifying_attachment(&self, key: &str) -> bool {
        self.identifying_attachments.contains(key)
    }

    /// The identifying attachments and their values.
    pub fn identifying_attachments(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attachments
            .iter()
            .filter(|(k, _)| self.identifying_attachments.contains(*k))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn justification(&self) -> Option<&str> {
        self.justification.as_deref()
    }

    pub fn criticality(&self) -> Option<&Criticality> {
        self.criticality.as_ref()
    }

    /// A copy of this difference with the criticality replaced.
    pub fn with_criticality(&self, criticality: Criticality) -> Self {
        Self {
            criticality: Some(criticality),
            ..self.clone()
        }
    }
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code, self.name)?;
        if let Some(criticality) = &self.criticality {
            write!(f, " [{criticality}]")?;
        }
        Ok(())
    }
}

/// Builder for [`Difference`].
#[derive(Clone, Debug, Default)]
pub struct DifferenceBuilder {
    code: String,
    name: Option<String>,
    description: Option<String>,
    classification: BTreeMap<CompatibilityType, DifferenceSeverity>,
    attachments: BTreeMap<String, String>,
    identifying_attachments: BTreeSet<String>,
    justification: Option<String>,
    criticality: Option<Criticality>,
}

impl DifferenceBuilder {
    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn classify(mut self, compatibility: CompatibilityType, severity: DifferenceSeverity) -> Self {
        self.classification.insert(compatibility, severity);
        self
    }

    pub fn classifications(
        mut self,
        classification: impl IntoIterator<Item = (CompatibilityType, DifferenceSeverity)>,
    ) -> Self {
        self.classification.extend(classification);
        self
    }

    pub fn attachment(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attachments.insert(key.into(), value.into());
        self
    }

    pub fn attachments(
        mut self,
        attachments: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        self.attachments.extend(attachments);
        self
    }

    /// Add an attachment that identifies the difference.
    pub fn identifying_attachment(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        self.identifying_attachments.insert(key.clone());
        self.attachments.insert(key, value.into());
        self
    }

    pub fn justification(mut self, justification: impl Into<String>) -> Self {
        self.justification = Some(justification.into());
        self
    }

    pub fn criticality(mut self, criticality: Criticality) -> Self {
        self.criticality = Some(criticality);
        self
    }

    /// Finish the difference. The name defaults to the code.
    pub fn build(self) -> Result<Difference, TypeError> {
        if self.code.trim().is_empty() {
            return Err(TypeError::MissingCode);
        }
        let name = self.name.unwrap_or_else(|| self.code.clone());
        Ok(Difference {
            code: self.code,
            name,
            description: self.description,
            classification: self.classification,
            attachments: self.attachments,
            identifying_attachments: self.identifying_attachments,
            justification: self.justification,
            criticality: self.criticality,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changed() -> Difference {
        Difference::builder("value-changed")
            .name("value changed")
            .classify(CompatibilityType::Semantic, DifferenceSeverity::PotentiallyBreaking)
            .attachment("oldValue", "b")
            .attachment("newValue", "c")
            .build()
            .unwrap()
    }

    #[test]
    fn builder_populates_fields() {
        let diff = changed();
        assert_eq!(diff.code(), "value-changed");
        assert_eq!(diff.name(), "value changed");
        assert_eq!(diff.attachment("oldValue"), Some("b"));
        assert_eq!(
            diff.severity(CompatibilityType::Semantic),
            Some(DifferenceSeverity::PotentiallyBreaking)
        );
        assert_eq!(diff.severity(CompatibilityType::Binary), None);
        assert!(diff.criticality().is_none());
    }

    #[test]
    fn missing_code_is_rejected() {
        let err = Difference::builder("  ").build().unwrap_err();
        assert_eq!(err, TypeError::MissingCode);
    }

    #[test]
    fn name_defaults_to_code() {
        let diff = Difference::builder("removed").build().unwrap();
        assert_eq!(diff.name(), "removed");
    }

    #[test]
    fn max_severity_picks_the_worst() {
        let diff = Difference::builder("x")
            .classify(CompatibilityType::Source, DifferenceSeverity::NonBreaking)
            .classify(CompatibilityType::Binary, DifferenceSeverity::Breaking)
            .build()
            .unwrap();
        assert_eq!(diff.max_severity(), Some(DifferenceSeverity::Breaking));
    }

    #[test]
    fn with_criticality_leaves_original_untouched() {
        let diff = changed();
        let replaced = diff.with_criticality(Criticality::allowed());
        assert!(diff.criticality().is_none());
        assert_eq!(replaced.criticality(), Some(&Criticality::allowed()));
        assert_ne!(diff, replaced);
    }

    #[test]
    fn to_builder_copies_everything() {
        let diff = Difference::builder("removed")
            .identifying_attachment("path", "/a")
            .justification("planned")
            .criticality(Criticality::documented())
            .build()
            .unwrap();
        let copy = diff.to_builder().build().unwrap();
        assert_eq!(diff, copy);
        assert!(copy.is_identifying_attachment("path"));
        assert_eq!(copy.identifying_attachments().collect::<Vec<_>>(), vec![("path", "/a")]);
    }

    #[test]
    fn display_includes_criticality_when_set() {
        let diff = changed().with_criticality(Criticality::error());
        assert_eq!(diff.to_string(), "value-changed (value changed) [error]");
    }
}
