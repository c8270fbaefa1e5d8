//! The set of extensions one analysis runs with.

use tracing::debug;

use apicmp_forest::{MatchAll, TreeFilter, UnionFilter};
use apicmp_transform::DifferenceTransform;
use apicmp_types::{Api, Element};

use crate::analyzer::ApiAnalyzer;
use crate::error::{EngineError, EngineResult};
use crate::reporter::Reporter;

/// Creates a fresh tree filter for each forest that is built.
pub type FilterFactory<E> = Box<dyn Fn(&Api) -> Box<dyn TreeFilter<E>> + Send>;

/// Analyzers, tree filters, transforms and reporters, in registration order.
///
/// Built explicitly by the driver. Ids must be unique per extension kind.
pub struct ExtensionRegistry<E: Element> {
    analyzers: Vec<Box<dyn ApiAnalyzer<E>>>,
    filters: Vec<FilterFactory<E>>,
    transforms: Vec<Box<dyn DifferenceTransform>>,
    reporters: Vec<Box<dyn Reporter>>,
}

impl<E: Element + 'static> ExtensionRegistry<E> {
    pub fn new() -> Self {
        Self {
            analyzers: Vec::new(),
            filters: Vec::new(),
            transforms: Vec::new(),
            reporters: Vec::new(),
        }
    }

    pub fn with_analyzer(mut self, analyzer: impl ApiAnalyzer<E> + 'static) -> EngineResult<Self> {
        self.register_analyzer(Box::new(analyzer))?;
        Ok(self)
    }

    pub fn with_filter(
        mut self,
        factory: impl Fn(&Api) -> Box<dyn TreeFilter<E>> + Send + 'static,
    ) -> Self {
        self.register_filter(Box::new(factory));
        self
    }

    pub fn with_transform(mut self, transform: impl DifferenceTransform + 'static) -> EngineResult<Self> {
        self.register_transform(Box::new(transform))?;
        Ok(self)
    }

    pub fn with_reporter(mut self, reporter: impl Reporter + 'static) -> EngineResult<Self> {
        self.register_reporter(Box::new(reporter))?;
        Ok(self)
    }

    pub fn register_analyzer(&mut self, analyzer: Box<dyn ApiAnalyzer<E>>) -> EngineResult<()> {
        check_unique(self.analyzers.iter().map(|a| a.id()), analyzer.id())?;
        debug!(id = analyzer.id(), "registered analyzer");
        self.analyzers.push(analyzer);
        Ok(())
    }

    pub fn register_filter(&mut self, factory: FilterFactory<E>) {
        self.filters.push(factory);
    }

    pub fn register_transform(&mut self, transform: Box<dyn DifferenceTransform>) -> EngineResult<()> {
        check_unique(self.transforms.iter().map(|t| t.id()), transform.id())?;
        debug!(id = transform.id(), "registered transform");
        self.transforms.push(transform);
        Ok(())
    }

    pub fn register_reporter(&mut self, reporter: Box<dyn Reporter>) -> EngineResult<()> {
        check_unique(self.reporters.iter().map(|r| r.id()), reporter.id())?;
        debug!(id = reporter.id(), "registered reporter");
        self.reporters.push(reporter);
        Ok(())
    }

    pub fn analyzer_ids(&self) -> Vec<&str> {
        self.analyzers.iter().map(|a| a.id()).collect()
    }

    pub fn transform_ids(&self) -> Vec<&str> {
        self.transforms.iter().map(|t| t.id()).collect()
    }

    pub fn reporter_ids(&self) -> Vec<&str> {
        self.reporters.iter().map(|r| r.id()).collect()
    }

    /// The filter for one forest: everything without registered filters,
    /// otherwise only what all of them keep.
    pub fn filter_for(&self, api: &Api) -> Box<dyn TreeFilter<E>> {
        combined_filter(&self.filters, api)
    }

    pub(crate) fn into_parts(self) -> Parts<E> {
        Parts {
            analyzers: self.analyzers,
            filters: self.filters,
            transforms: self.transforms,
            reporters: self.reporters,
        }
    }
}

impl<E: Element + 'static> Default for ExtensionRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// A registry taken apart for one analysis.
pub(crate) struct Parts<E: Element> {
    pub analyzers: Vec<Box<dyn ApiAnalyzer<E>>>,
    pub filters: Vec<FilterFactory<E>>,
    pub transforms: Vec<Box<dyn DifferenceTransform>>,
    pub reporters: Vec<Box<dyn Reporter>>,
}

pub(crate) fn combined_filter<E: Element + 'static>(
    filters: &[FilterFactory<E>],
    api: &Api,
) -> Box<dyn TreeFilter<E>> {
    match filters {
        [] => Box::new(MatchAll),
        [only] => only(api),
        many => Box::new(UnionFilter::new(many.iter().map(|f| f(api)).collect())),
    }
}

fn check_unique<'a>(mut existing: impl Iterator<Item = &'a str>, id: &str) -> EngineResult<()> {
    if existing.any(|e| e == id) {
        return Err(EngineError::DuplicateExtension(id.to_string()));
    }
    Ok(())
}
