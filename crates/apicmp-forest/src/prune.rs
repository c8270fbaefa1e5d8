//! Mark-and-sweep pruning of elements that are neither part of the observable
//! surface nor reachable from it through use sites.

use serde::{Deserialize, Serialize};
use tracing::debug;

use apicmp_types::Element;

use crate::error::ForestResult;
use crate::forest::{ElementId, Forest};

/// Outcome of [`Forest::prune`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruneReport {
    /// Every removed element, including descendants of removed elements.
    pub removed: Vec<ElementId>,
    /// Number of mark-and-sweep passes, including the final pass that
    /// removed nothing.
    pub passes: usize,
}

impl PruneReport {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
    }
}

impl<E: Element> Forest<E> {
    /// Remove every element that the surface does not reach.
    ///
    /// Marking starts from every live in-surface element. A marked element
    /// marks its parent, and marks each element it uses together with that
    /// element's whole subtree. Unmarked elements are removed, which drops
    /// their use-site edges, and passes repeat until one removes nothing.
    pub fn prune(&mut self) -> ForestResult<PruneReport> {
        let mut report = PruneReport::default();

        loop {
            report.passes += 1;
            let marked = self.mark();

            for (id, node) in self.nodes_mut() {
                node.reachable = marked.get(id.index()).copied().unwrap_or(false);
            }

            let unmarked: Vec<ElementId> = self
                .ids()
                .into_iter()
                .filter(|id| !marked.get(id.index()).copied().unwrap_or(false))
                .collect();

            let mut removed_in_pass = 0;
            for id in unmarked {
                // already gone with an unmarked ancestor
                if !self.contains(id) {
                    continue;
                }
                let removed = self.remove(id)?;
                removed_in_pass += removed.len();
                report.removed.extend(removed);
            }

            debug!(pass = report.passes, removed = removed_in_pass, "prune pass finished");
            if removed_in_pass == 0 {
                break;
            }
        }

        Ok(report)
    }

    /// Reachability from the surface, indexed by slot.
    fn mark(&self) -> Vec<bool> {
        let slots = self.slot_count();
        let mut marked = vec![false; slots];
        let mut expanded = vec![false; slots];

        // (element, whether its whole subtree is reached)
        let mut stack: Vec<(ElementId, bool)> = self
            .ids()
            .into_iter()
            .filter(|id| self.is_in_surface(*id))
            .map(|id| (id, false))
            .collect();

        while let Some((id, whole_subtree)) = stack.pop() {
            let i = id.index();
            if i >= slots || !self.contains(id) {
                continue;
            }

            if whole_subtree && !expanded[i] {
                expanded[i] = true;
                stack.extend(self.children(id).iter().map(|c| (*c, true)));
            }

            if marked[i] {
                continue;
            }
            marked[i] = true;

            if let Some(parent) = self.parent(id) {
                stack.push((parent, false));
            }
            stack.extend(self.uses.uses(id).map(|(_, used)| (used, true)));
        }

        marked
    }
}
