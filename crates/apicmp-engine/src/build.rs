//! Building a forest from an archive analyzer, guided by a tree filter.

use tracing::debug;

use apicmp_forest::{ElementId, Forest, ForestError, TreeFilter};
use apicmp_types::{Api, Element};

use crate::analyzer::{ArchiveAnalyzer, Discovered};
use crate::error::EngineResult;

/// Options for [`build_forest`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuildOptions {
    /// Whether roots from supplementary archives enter the forest.
    pub include_supplementary: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            include_supplementary: true,
        }
    }
}

/// Discover the elements of `api` and keep those the filter accepts.
///
/// An element is inserted before the filter sees it, so the filter can
/// inspect its parent and path. Children are discovered only when the
/// filter asks to descend. An element is removed again when neither the
/// start nor the finish verdict accepts it, and once the whole forest has
/// been walked the filter's deferred verdicts are applied.
pub fn build_forest<E: Element>(
    api: &Api,
    analyzer: &mut dyn ArchiveAnalyzer<E>,
    filter: &mut dyn TreeFilter<E>,
    options: BuildOptions,
) -> EngineResult<Forest<E>> {
    let mut forest = Forest::new();
    let mut builder = Builder {
        api,
        analyzer,
        filter,
        forest: &mut forest,
    };

    for root in builder.analyzer.discover_roots(api, options)? {
        let supplementary = root
            .archive
            .as_deref()
            .is_some_and(|archive| api.is_supplementary(archive));
        if supplementary && !options.include_supplementary {
            continue;
        }
        builder.add(None, root)?;
    }

    let mut rejected = 0;
    for (id, verdict) in builder.filter.finish_all() {
        if !verdict.matched.to_bool(true) && builder.forest.contains(id) {
            builder.forest.remove(id)?;
            rejected += 1;
        }
    }

    builder.analyzer.record_use_sites(builder.forest)?;

    debug!(
        api = %api,
        elements = forest.len(),
        deferred_rejections = rejected,
        "forest built"
    );
    Ok(forest)
}

struct Builder<'a, E: Element> {
    api: &'a Api,
    analyzer: &'a mut dyn ArchiveAnalyzer<E>,
    filter: &'a mut dyn TreeFilter<E>,
    forest: &'a mut Forest<E>,
}

impl<E: Element> Builder<'_, E> {
    fn add(&mut self, parent: Option<ElementId>, discovered: Discovered<E>) -> EngineResult<()> {
        let Discovered { element, archive } = discovered;
        let id = match parent {
            Some(parent) => self.forest.insert_child(parent, element)?,
            None => self.forest.insert_root(element),
        };
        let Some(id) = id else {
            debug!(parent = ?parent, "duplicate element ignored");
            return Ok(());
        };

        if let Some(archive) = archive {
            self.forest.set_in_surface(id, !self.api.is_supplementary(&archive))?;
            self.forest.set_archive(id, Some(archive))?;
        }

        let element = self.forest.element_ref(id).ok_or(ForestError::NotFound(id))?;
        let start = self.filter.start(element);
        if start.descend {
            let children = self.analyzer.discover_children(element)?;
            for child in children {
                self.add(Some(id), child)?;
            }
        }

        let element = self.forest.element_ref(id).ok_or(ForestError::NotFound(id))?;
        let finish = self.filter.finish(element);
        if !start.matched.to_bool(true) && !finish.matched.to_bool(true) {
            self.forest.remove(id)?;
        }
        Ok(())
    }
}
