//! Collaborator traits implemented by format-specific extensions.

use apicmp_diff::DifferenceAnalyzer;
use apicmp_forest::{ElementRef, Forest, PruneReport};
use apicmp_types::{Api, Element};

use crate::build::BuildOptions;
use crate::error::EngineResult;

/// An element found by an [`ArchiveAnalyzer`], not yet in the forest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Discovered<E> {
    pub element: E,
    /// Archive the element comes from. `None` inherits the parent's archive.
    pub archive: Option<String>,
}

impl<E> Discovered<E> {
    pub fn new(element: E) -> Self {
        Self {
            element,
            archive: None,
        }
    }

    pub fn in_archive(mut self, archive: impl Into<String>) -> Self {
        self.archive = Some(archive.into());
        self
    }
}

/// Extracts the elements of one API.
///
/// The engine calls [`discover_roots`](Self::discover_roots) once, then
/// [`discover_children`](Self::discover_children) for every element the
/// tree filter wants to descend into. Errors abort the analysis of the API.
pub trait ArchiveAnalyzer<E: Element>: Send {
    /// Roots of every archive of `api`. Supplementary archives need not be
    /// read when `options` leaves them out; their roots are dropped anyway.
    fn discover_roots(&mut self, api: &Api, options: BuildOptions) -> EngineResult<Vec<Discovered<E>>>;

    fn discover_children(&mut self, parent: ElementRef<'_, E>) -> EngineResult<Vec<Discovered<E>>>;

    /// Record use-site edges once the forest is complete.
    fn record_use_sites(&mut self, _forest: &mut Forest<E>) -> EngineResult<()> {
        Ok(())
    }

    /// Remove what is not part of the observable surface.
    fn prune(&mut self, forest: &mut Forest<E>) -> EngineResult<PruneReport> {
        Ok(forest.prune()?)
    }
}

/// Entry point of a format extension: provides an archive analyzer per API
/// and the difference analyzer comparing their forests.
pub trait ApiAnalyzer<E: Element>: Send {
    /// Extension id, unique within a registry.
    fn id(&self) -> &str;

    fn archive_analyzer(&mut self, api: &Api) -> EngineResult<Box<dyn ArchiveAnalyzer<E>>>;

    fn difference_analyzer(&mut self) -> EngineResult<Box<dyn DifferenceAnalyzer<E>>>;
}
