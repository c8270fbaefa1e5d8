//! Key/value documents as element forests.
//!
//! A JSON-like document becomes a forest of [`KeyValueElement`]s: object
//! members are keyed by name, array items by index. [`KeyValueAnalyzer`]
//! reports added and removed members and changed scalar values.

use std::cmp::Ordering;
use std::fmt;

use serde_json::Value;
use tracing::debug;

use apicmp_forest::{ElementId, ElementRef, Forest, ForestResult};
use apicmp_types::{CompatibilityType, Difference, DifferenceSeverity, Element, Report};

use crate::error::DiffResult;
use crate::traversal::DifferenceAnalyzer;

/// Code of a member present only in the new document.
pub const ADDED: &str = "added";
/// Code of a member present only in the old document.
pub const REMOVED: &str = "removed";
/// Code of a member whose value changed.
pub const VALUE_CHANGED: &str = "value-changed";

/// Position of an element within its parent.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KvKey {
    /// Object member. Sorts before array items.
    Key(String),
    /// Array item.
    Index(usize),
}

impl fmt::Display for KvKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// The value held by an element. Containers hold their members as children.
#[derive(Clone, Debug, PartialEq)]
pub enum KvValue {
    Object,
    Array,
    Scalar(Value),
}

impl KvValue {
    /// The shape of a JSON value: a container marker or the scalar itself.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Object(_) => Self::Object,
            Value::Array(_) => Self::Array,
            scalar => Self::Scalar(scalar.clone()),
        }
    }
}

impl fmt::Display for KvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Object => f.write_str("{...}"),
            Self::Array => f.write_str("[...]"),
            Self::Scalar(Value::String(s)) => f.write_str(s),
            Self::Scalar(other) => write!(f, "{other}"),
        }
    }
}

/// One member of a key/value document.
///
/// Ordered and compared by key only, so that the same key in two versions
/// of a document pairs up regardless of its value.
#[derive(Clone, Debug)]
pub struct KeyValueElement {
    key: KvKey,
    value: KvValue,
}

impl KeyValueElement {
    pub fn new(key: KvKey, value: KvValue) -> Self {
        Self { key, value }
    }

    /// An object member holding a string.
    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(KvKey::Key(key.into()), KvValue::Scalar(Value::String(value.into())))
    }

    pub fn key(&self) -> &KvKey {
        &self.key
    }

    pub fn value(&self) -> &KvValue {
        &self.value
    }
}

impl PartialEq for KeyValueElement {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for KeyValueElement {}

impl PartialOrd for KeyValueElement {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for KeyValueElement {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl Element for KeyValueElement {
    fn kind(&self) -> &str {
        match self.key {
            KvKey::Key(_) => "key",
            KvKey::Index(_) => "item",
        }
    }

    fn name(&self) -> String {
        self.key.to_string()
    }
}

/// Insert `value` under `key`, below `parent` or as a root, with all of its
/// members.
///
/// Returns `None` if an element with the same key already exists there.
pub fn insert_value(
    forest: &mut Forest<KeyValueElement>,
    parent: Option<ElementId>,
    key: KvKey,
    value: &Value,
) -> ForestResult<Option<ElementId>> {
    let element = KeyValueElement::new(key, KvValue::of(value));
    let id = match parent {
        Some(parent) => forest.insert_child(parent, element)?,
        None => forest.insert_root(element),
    };
    let Some(id) = id else {
        return Ok(None);
    };

    match value {
        Value::Object(members) => {
            for (name, member) in members {
                insert_value(forest, Some(id), KvKey::Key(name.clone()), member)?;
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                insert_value(forest, Some(id), KvKey::Index(index), item)?;
            }
        }
        _ => {}
    }

    Ok(Some(id))
}

/// Build a forest whose roots are the members of a top-level object.
///
/// Any other top-level value becomes a single root keyed by `name`.
pub fn forest_from_json(name: &str, document: &Value) -> ForestResult<Forest<KeyValueElement>> {
    let mut forest = Forest::new();
    match document {
        Value::Object(members) => {
            for (key, member) in members {
                insert_value(&mut forest, None, KvKey::Key(key.clone()), member)?;
            }
        }
        other => {
            insert_value(&mut forest, None, KvKey::Key(name.to_string()), other)?;
        }
    }
    Ok(forest)
}

/// Compares key/value forests.
///
/// Members present on one side only are reported as [`ADDED`] or
/// [`REMOVED`] with an identifying `path` attachment. Paired members whose
/// scalar values differ, or whose value changed between container and
/// scalar, are reported as [`VALUE_CHANGED`] with `oldValue` and `newValue`
/// attachments. Containers whose members differ are not reported themselves.
#[derive(Debug, Default)]
pub struct KeyValueAnalyzer {
    depth: usize,
}

impl KeyValueAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairings begun but not yet ended.
    pub fn open_pairings(&self) -> usize {
        self.depth
    }

    fn difference(
        old: Option<ElementRef<'_, KeyValueElement>>,
        new: Option<ElementRef<'_, KeyValueElement>>,
    ) -> DiffResult<Option<Difference>> {
        let difference = match (old, new) {
            (None, Some(new)) => Difference::builder(ADDED)
                .name("value added")
                .classify(CompatibilityType::Semantic, DifferenceSeverity::PotentiallyBreaking)
                .identifying_attachment("path", new.path())
                .build()?,
            (Some(old), None) => Difference::builder(REMOVED)
                .name("value removed")
                .classify(CompatibilityType::Semantic, DifferenceSeverity::Breaking)
                .identifying_attachment("path", old.path())
                .build()?,
            (Some(old), Some(new)) => {
                let (was, is) = (old.element().value(), new.element().value());
                let unchanged = match (was, is) {
                    (KvValue::Scalar(a), KvValue::Scalar(b)) => a == b,
                    _ => std::mem::discriminant(was) == std::mem::discriminant(is),
                };
                if unchanged {
                    return Ok(None);
                }
                Difference::builder(VALUE_CHANGED)
                    .name("value changed")
                    .classify(CompatibilityType::Semantic, DifferenceSeverity::PotentiallyBreaking)
                    .attachment("oldValue", was.to_string())
                    .attachment("newValue", is.to_string())
                    .build()?
            }
            (None, None) => return Ok(None),
        };
        Ok(Some(difference))
    }
}

impl DifferenceAnalyzer<KeyValueElement> for KeyValueAnalyzer {
    fn begin(
        &mut self,
        _old: Option<ElementRef<'_, KeyValueElement>>,
        _new: Option<ElementRef<'_, KeyValueElement>>,
    ) -> DiffResult<()> {
        self.depth += 1;
        Ok(())
    }

    fn is_descend_required(
        &self,
        old: ElementRef<'_, KeyValueElement>,
        new: ElementRef<'_, KeyValueElement>,
    ) -> bool {
        old.has_children() || new.has_children()
    }

    fn end(
        &mut self,
        old: Option<ElementRef<'_, KeyValueElement>>,
        new: Option<ElementRef<'_, KeyValueElement>>,
    ) -> DiffResult<Option<Report>> {
        self.depth = self.depth.saturating_sub(1);
        let differences: Vec<Difference> = Self::difference(old, new)?.into_iter().collect();
        Ok(Some(Report::new(
            old.map(|e| e.info()),
            new.map(|e| e.info()),
            differences,
        )?))
    }

    fn close(&mut self) -> DiffResult<()> {
        // a failed walk closes with its ancestors still open
        if self.depth > 0 {
            debug!(open = self.depth, "closing with pairings left open");
        }
        self.depth = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiffError;
    use crate::traversal::{walk, PairingSink};
    use serde_json::json;

    #[derive(Default)]
    struct Reports(Vec<Report>);

    impl PairingSink<KeyValueElement> for Reports {
        type Error = DiffError;

        fn accept(&mut self, report: Report) -> DiffResult<()> {
            self.0.push(report);
            Ok(())
        }
    }

    fn compare(old: Value, new: Value) -> Vec<Report> {
        let old = forest_from_json("old", &old).unwrap();
        let new = forest_from_json("new", &new).unwrap();
        let mut reports = Reports::default();
        walk(&old, &new, &mut KeyValueAnalyzer::new(), &mut reports).unwrap();
        reports.0
    }

    fn codes(reports: &[Report]) -> Vec<(String, &str)> {
        reports
            .iter()
            .flat_map(|r| {
                let path = r
                    .new_element()
                    .or(r.old())
                    .map(|e| e.path.clone())
                    .unwrap_or_default();
                r.differences().iter().map(move |d| (path.clone(), d.code()))
            })
            .collect()
    }

    #[test]
    fn identical_documents_no_diff() {
        let doc = json!({"a": 1, "b": "hello", "c": {"d": [1, 2]}});
        assert!(compare(doc.clone(), doc).is_empty());
    }

    #[test]
    fn changed_string_value() {
        let old = forest_from_json("old", &json!({"a": "b"})).unwrap();
        let new = forest_from_json("new", &json!({"a": "c"})).unwrap();
        let mut reports = Reports::default();
        walk(&old, &new, &mut KeyValueAnalyzer::new(), &mut reports).unwrap();

        assert_eq!(reports.0.len(), 1);
        let diffs = reports.0[0].differences();
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].code(), VALUE_CHANGED);
        assert_eq!(diffs[0].attachments().len(), 2);
        assert_eq!(diffs[0].attachment("oldValue"), Some("b"));
        assert_eq!(diffs[0].attachment("newValue"), Some("c"));
        assert_eq!(
            diffs[0].severity(CompatibilityType::Semantic),
            Some(DifferenceSeverity::PotentiallyBreaking)
        );
    }

    #[test]
    fn removed_member_is_breaking() {
        let reports = compare(json!({"a": 1, "b": 2}), json!({"b": 2}));
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].old().map(|e| e.name.as_str()), Some("a"));
        assert!(reports[0].new_element().is_none());

        let diff = &reports[0].differences()[0];
        assert_eq!(diff.code(), REMOVED);
        assert_eq!(diff.max_severity(), Some(DifferenceSeverity::Breaking));
        assert!(diff.is_identifying_attachment("path"));
        assert_eq!(diff.attachment("path"), Some("a"));
    }

    #[test]
    fn nested_changes_are_reported_at_the_leaf() {
        let reports = compare(
            json!({"config": {"debug": false, "port": 8080}}),
            json!({"config": {"debug": true, "port": 8080, "host": "x"}}),
        );
        assert_eq!(
            codes(&reports),
            vec![
                ("config/debug".to_string(), VALUE_CHANGED),
                ("config/host".to_string(), ADDED),
            ]
        );
    }

    #[test]
    fn array_items_pair_by_index() {
        let reports = compare(json!({"xs": [1, 2, 3]}), json!({"xs": [1, 5]}));
        assert_eq!(
            codes(&reports),
            vec![
                ("xs/1".to_string(), VALUE_CHANGED),
                ("xs/2".to_string(), REMOVED),
            ]
        );
    }

    #[test]
    fn type_changes_are_detected() {
        let reports = compare(json!({"v": 42, "w": "1"}), json!({"v": "forty-two", "w": 1}));
        assert_eq!(reports.len(), 2);

        let reports = compare(json!({"v": {"x": 1}}), json!({"v": 1}));
        let diff = &reports[0].differences()[0];
        assert_eq!(diff.code(), VALUE_CHANGED);
        assert_eq!(diff.attachment("oldValue"), Some("{...}"));
        assert_eq!(diff.attachment("newValue"), Some("1"));
    }

    #[test]
    fn null_values() {
        let reports = compare(json!({"n": null}), json!({"n": "not null"}));
        assert_eq!(reports[0].differences()[0].attachment("oldValue"), Some("null"));
    }

    /// Fails on the first report it is handed.
    struct Failing;

    impl PairingSink<KeyValueElement> for Failing {
        type Error = DiffError;

        fn accept(&mut self, _report: Report) -> DiffResult<()> {
            Err(DiffError::Analyzer("sink refused".into()))
        }
    }

    #[test]
    fn sink_failure_below_the_root_closes_cleanly() {
        let old = forest_from_json("old", &json!({"x": {"a": 1}})).unwrap();
        let new = forest_from_json("new", &json!({"x": {"a": 2}})).unwrap();
        let mut analyzer = KeyValueAnalyzer::new();

        let err = walk(&old, &new, &mut analyzer, &mut Failing).unwrap_err();
        assert_eq!(err, DiffError::Analyzer("sink refused".into()));
        assert_eq!(analyzer.open_pairings(), 0);

        // the analyzer is usable again after the failed walk
        let mut reports = Reports::default();
        walk(&old, &new, &mut analyzer, &mut reports).unwrap();
        assert_eq!(codes(&reports.0), vec![("x/a".to_string(), VALUE_CHANGED)]);
    }

    #[test]
    fn members_sort_before_items() {
        assert!(KvKey::Key("z".into()) < KvKey::Index(0));
        assert!(KeyValueElement::string("a", "1") == KeyValueElement::string("a", "2"));
    }

    #[test]
    fn non_object_documents_become_one_root() {
        let forest = forest_from_json("doc.json", &json!([true, false])).unwrap();
        assert_eq!(forest.roots().len(), 1);
        assert_eq!(forest.len(), 3);
        let root = forest.root_refs().next().unwrap();
        assert_eq!(root.element().name(), "doc.json");
        assert_eq!(root.element().kind(), "key");
    }
}
