//! A format extension comparing JSON documents key by key.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use apicmp_diff::{DifferenceAnalyzer, KeyValueAnalyzer, KeyValueElement, KvKey, KvValue};
use apicmp_forest::ElementRef;
use apicmp_types::{Api, Archive};

use crate::analyzer::{ApiAnalyzer, ArchiveAnalyzer, Discovered};
use crate::build::BuildOptions;
use crate::error::{EngineError, EngineResult};

/// Treats every archive of an API as one JSON document.
///
/// The members of a top-level object become roots. Any other top-level
/// value becomes a single root named after its archive.
#[derive(Debug, Default)]
pub struct JsonApiAnalyzer;

impl JsonApiAnalyzer {
    pub const ID: &'static str = "json";

    pub fn new() -> Self {
        Self
    }
}

impl ApiAnalyzer<KeyValueElement> for JsonApiAnalyzer {
    fn id(&self) -> &str {
        Self::ID
    }

    fn archive_analyzer(&mut self, api: &Api) -> EngineResult<Box<dyn ArchiveAnalyzer<KeyValueElement>>> {
        Ok(Box::new(JsonArchiveAnalyzer {
            api: api.to_string(),
            documents: BTreeMap::new(),
        }))
    }

    fn difference_analyzer(&mut self) -> EngineResult<Box<dyn DifferenceAnalyzer<KeyValueElement>>> {
        Ok(Box::new(KeyValueAnalyzer::new()))
    }
}

/// Parsed documents of one API, by archive name.
#[derive(Debug)]
pub struct JsonArchiveAnalyzer {
    api: String,
    documents: BTreeMap<String, Value>,
}

impl JsonArchiveAnalyzer {
    fn parse(&self, archive: &dyn Archive) -> EngineResult<Value> {
        archive
            .with_stream(|stream| Ok(serde_json::from_reader(stream)?))
            .map_err(|e| EngineError::extraction(&self.api, archive.name(), e))
    }

    /// The value an element stands for, found by following the keys from
    /// its root down.
    fn locate(&self, element: ElementRef<'_, KeyValueElement>) -> EngineResult<&Value> {
        let missing = || {
            let archive = element.archive().unwrap_or_default();
            EngineError::extraction(&self.api, archive, format!("no value at {}", element.path()))
        };

        let archive = element.archive().ok_or_else(missing)?;
        let document = self.documents.get(archive).ok_or_else(missing)?;

        let mut keys = Vec::new();
        let mut current = Some(element);
        while let Some(e) = current {
            keys.push(e.element().key());
            current = e.parent();
        }
        keys.reverse();

        let mut value = document;
        for (depth, key) in keys.into_iter().enumerate() {
            // a non-object document is the root itself
            if depth == 0 && !document.is_object() {
                continue;
            }
            value = match key {
                KvKey::Key(name) => value.get(name.as_str()),
                KvKey::Index(index) => value.get(*index),
            }
            .ok_or_else(missing)?;
        }
        Ok(value)
    }
}

fn discovered(key: KvKey, value: &Value) -> Discovered<KeyValueElement> {
    Discovered::new(KeyValueElement::new(key, KvValue::of(value)))
}

impl ArchiveAnalyzer<KeyValueElement> for JsonArchiveAnalyzer {
    fn discover_roots(
        &mut self,
        api: &Api,
        options: BuildOptions,
    ) -> EngineResult<Vec<Discovered<KeyValueElement>>> {
        let supplementary: &[Arc<dyn Archive>] = if options.include_supplementary {
            api.supplementary_archives()
        } else {
            &[]
        };
        let mut roots = Vec::new();
        for archive in api.archives().iter().chain(supplementary) {
            let document = self.parse(archive.as_ref())?;
            let name = archive.name().to_string();
            match &document {
                Value::Object(members) => {
                    for (key, member) in members {
                        roots.push(discovered(KvKey::Key(key.clone()), member).in_archive(name.as_str()));
                    }
                }
                other => roots.push(discovered(KvKey::Key(name.clone()), other).in_archive(name.as_str())),
            }
            debug!(api = %self.api, archive = %name, "parsed document");
            self.documents.insert(name, document);
        }
        Ok(roots)
    }

    fn discover_children(
        &mut self,
        parent: ElementRef<'_, KeyValueElement>,
    ) -> EngineResult<Vec<Discovered<KeyValueElement>>> {
        let children = match self.locate(parent)? {
            Value::Object(members) => members
                .iter()
                .map(|(key, member)| discovered(KvKey::Key(key.clone()), member))
                .collect(),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| discovered(KvKey::Index(index), item))
                .collect(),
            _ => Vec::new(),
        };
        Ok(children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::build_forest;
    use apicmp_forest::{Forest, MatchAll};
    use apicmp_types::InMemoryArchive;

    fn api(documents: &[(&str, &str)]) -> Arc<Api> {
        documents
            .iter()
            .fold(Api::builder(), |b, (name, text)| {
                b.archive(InMemoryArchive::new(*name, text.as_bytes().to_vec()))
            })
            .build()
    }

    fn forest_with(api: &Api, options: BuildOptions) -> EngineResult<Forest<KeyValueElement>> {
        let mut archives = JsonApiAnalyzer::new().archive_analyzer(api)?;
        build_forest(api, archives.as_mut(), &mut MatchAll, options)
    }

    fn forest(api: &Api) -> EngineResult<Forest<KeyValueElement>> {
        forest_with(api, BuildOptions::default())
    }

    fn paths(forest: &Forest<KeyValueElement>) -> Vec<String> {
        forest.ids().into_iter().filter_map(|id| forest.path(id)).collect()
    }

    #[test]
    fn nested_members_and_items_become_elements() {
        let api = api(&[("doc.json", r#"{"a": {"b": 1, "c": [true, null]}, "d": "x"}"#)]);
        let forest = forest(&api).unwrap();
        assert_eq!(paths(&forest), vec!["a", "a/b", "a/c", "a/c/0", "a/c/1", "d"]);

        let d = forest.roots()[1];
        assert_eq!(forest.archive_of(d), Some("doc.json"));
        assert_eq!(
            forest.get(d).map(|e| e.value().clone()),
            Some(KvValue::Scalar(Value::String("x".into())))
        );
    }

    #[test]
    fn matches_the_forest_built_from_the_value() {
        let text = r#"{"k": [1, {"n": 2}], "z": {}}"#;
        let from_archive = forest(&api(&[("doc.json", text)])).unwrap();
        let value: Value = serde_json::from_str(text).unwrap();
        let direct = apicmp_diff::forest_from_json("doc.json", &value).unwrap();
        assert_eq!(paths(&from_archive), paths(&direct));
    }

    #[test]
    fn non_object_documents_become_one_root() {
        let forest = forest(&api(&[("list.json", "[1, 2]")])).unwrap();
        assert_eq!(paths(&forest), vec!["list.json", "list.json/0", "list.json/1"]);
    }

    #[test]
    fn first_archive_wins_for_duplicate_keys() {
        let api = api(&[("one.json", r#"{"a": 1}"#), ("two.json", r#"{"a": 2, "b": 3}"#)]);
        let forest = forest(&api).unwrap();
        assert_eq!(paths(&forest), vec!["a", "b"]);
        assert_eq!(forest.archive_of(forest.roots()[0]), Some("one.json"));
    }

    #[test]
    fn malformed_documents_fail_extraction() {
        let api = api(&[("bad.json", "{not json")]);
        match forest(&api) {
            Err(EngineError::Extraction { archive, .. }) => assert_eq!(archive, "bad.json"),
            other => panic!("expected extraction error, got {other:?}"),
        }
    }

    #[test]
    fn skipped_supplementary_archives_are_not_read() {
        let api = Api::builder()
            .archive(InMemoryArchive::new("lib.json", r#"{"a": 1}"#.as_bytes().to_vec()))
            .supplementary(InMemoryArchive::new("dep.json", "{not json".as_bytes().to_vec()))
            .build();
        let skip = BuildOptions {
            include_supplementary: false,
        };

        let forest = forest_with(&api, skip).unwrap();
        assert_eq!(paths(&forest), vec!["a"]);

        match forest_with(&api, BuildOptions::default()) {
            Err(EngineError::Extraction { archive, .. }) => assert_eq!(archive, "dep.json"),
            other => panic!("expected extraction error, got {other:?}"),
        }
    }
}
