use std::fmt;

use serde::{Deserialize, Serialize};

/// A node of the observable structure extracted from an archive.
///
/// The `Ord` implementation of a concrete element type is the co-iteration
/// order: two elements that compare equal are paired with each other when an
/// old and a new forest are walked together, and siblings are kept sorted by
/// it. Implementations must keep `Ord` consistent with `Eq`.
pub trait Element: Ord + fmt::Debug {
    /// A short name for the kind of element, e.g. `"class"` or `"key"`.
    fn kind(&self) -> &str;

    /// The element's name as it appears in paths and reports.
    fn name(&self) -> String;
}

/// A type-erased snapshot of an element, as carried by a [`Report`].
///
/// Reports outlive the forests they were produced from, so they keep a
/// description of the elements rather than references into the forest.
///
/// [`Report`]: crate::Report
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementInfo {
    pub kind: String,
    pub name: String,
    /// Names of the element and its ancestors from the root, joined by `/`.
    pub path: String,
    /// The archive the element was extracted from, if it has one.
    pub archive: Option<String>,
}

impl ElementInfo {
    pub fn new(kind: impl Into<String>, name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            path: path.into(),
            archive: None,
        }
    }

    pub fn with_archive(mut self, archive: impl Into<String>) -> Self {
        self.archive = Some(archive.into());
        self
    }
}

impl fmt::Display for ElementInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_shows_kind_and_path() {
        let info = ElementInfo::new("key", "b", "a/b").with_archive("v1.json");
        assert_eq!(info.to_string(), "key a/b");
        assert_eq!(info.archive.as_deref(), Some("v1.json"));
    }
}
