//! The arena-backed element forest.
//!
//! [`Forest`] stores every element of one API in a `Vec` of slots addressed
//! by [`ElementId`]. Parent links, sorted child lists and the root list are
//! all expressed in ids, so the tree can be mutated without shared
//! ownership. Use-site edges live next to the tree in a [`UseGraph`].
//!
//! # Invariants
//!
//! - Children of an element, and the roots, are sorted by the element's
//!   `Ord` and contain no two equal elements.
//! - Every id in a child list or the root list refers to a live slot.
//! - Ids are never reused: a removed slot stays empty.
//! - The use-site graph only mentions live elements.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use apicmp_types::{Element, ElementInfo};

use crate::error::{ForestError, ForestResult};
use crate::use_graph::{UseGraph, UseKind, UseSite};

/// Handle to an element inside one [`Forest`].
///
/// Ids are only meaningful for the forest that issued them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(usize);

impl ElementId {
    /// Build an id from a raw slot index.
    pub fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Node<E> {
    pub(crate) element: E,
    pub(crate) parent: Option<ElementId>,
    pub(crate) children: Vec<ElementId>,
    pub(crate) archive: Option<String>,
    pub(crate) in_surface: bool,
    pub(crate) reachable: bool,
}

/// The root-level ordered set of elements, plus descendants, for one API.
#[derive(Clone, Debug)]
pub struct Forest<E> {
    nodes: Vec<Option<Node<E>>>,
    roots: Vec<ElementId>,
    pub(crate) uses: UseGraph,
    live: usize,
}

impl<E> Default for Forest<E> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            roots: Vec::new(),
            uses: UseGraph::new(),
            live: 0,
        }
    }
}

impl<E: Element> Forest<E> {
    /// Create an empty forest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live elements.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    // ---------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------

    /// Insert a root element.
    ///
    /// Returns `None` without changing the forest if an equal root already
    /// exists. New roots belong to no archive and are part of the surface.
    #[must_use]
    pub fn insert_root(&mut self, element: E) -> Option<ElementId> {
        let pos = match self.position(&self.roots, &element) {
            Ok(_) => {
                debug!(name = %element.name(), "duplicate root ignored");
                return None;
            }
            Err(pos) => pos,
        };

        let id = self.alloc(Node {
            element,
            parent: None,
            children: Vec::new(),
            archive: None,
            in_surface: true,
            reachable: false,
        });
        self.roots.insert(pos, id);
        debug!(element = %id, "inserted root");
        Some(id)
    }

    /// Insert `element` as a child of `parent`.
    ///
    /// The child inherits the parent's archive and surface membership.
    /// Returns `Ok(None)` without changing the forest if an equal sibling
    /// already exists.
    #[must_use = "a duplicate insertion returns Ok(None)"]
    pub fn insert_child(&mut self, parent: ElementId, element: E) -> ForestResult<Option<ElementId>> {
        let parent_node = self.live_node(parent)?;
        let pos = match self.position(&parent_node.children, &element) {
            Ok(_) => {
                debug!(parent = %parent, name = %element.name(), "duplicate child ignored");
                return Ok(None);
            }
            Err(pos) => pos,
        };
        let archive = parent_node.archive.clone();
        let in_surface = parent_node.in_surface;

        let id = self.alloc(Node {
            element,
            parent: Some(parent),
            children: Vec::new(),
            archive,
            in_surface,
            reachable: false,
        });
        if let Some(parent_node) = self.node_mut(parent) {
            parent_node.children.insert(pos, id);
        }
        debug!(element = %id, parent = %parent, "inserted child");
        Ok(Some(id))
    }

    /// Remove an element and its whole subtree.
    ///
    /// Every use-site edge where a removed element is either the user or the
    /// used element is dropped as well. Returns the removed ids in pre-order.
    pub fn remove(&mut self, id: ElementId) -> ForestResult<Vec<ElementId>> {
        let parent = match self.nodes.get(id.0) {
            None => return Err(ForestError::NotFound(id)),
            Some(None) => return Err(ForestError::AlreadyRemoved(id)),
            Some(Some(node)) => node.parent,
        };

        let removed = self.subtree(id);
        match parent {
            Some(parent) => {
                if let Some(parent_node) = self.node_mut(parent) {
                    parent_node.children.retain(|c| *c != id);
                }
            }
            None => self.roots.retain(|r| *r != id),
        }

        let mut edges = 0;
        for removed_id in &removed {
            edges += self.uses.detach(*removed_id);
            if let Some(slot) = self.nodes.get_mut(removed_id.0) {
                *slot = None;
            }
        }
        self.live -= removed.len();

        debug!(element = %id, removed = removed.len(), edges, "removed subtree");
        Ok(removed)
    }

    /// Set the archive the element was extracted from.
    pub fn set_archive(&mut self, id: ElementId, archive: Option<String>) -> ForestResult<()> {
        self.live_node_mut(id)?.archive = archive;
        Ok(())
    }

    /// Declare whether the element is part of the observable surface.
    pub fn set_in_surface(&mut self, id: ElementId, in_surface: bool) -> ForestResult<()> {
        self.live_node_mut(id)?.in_surface = in_surface;
        Ok(())
    }

    /// Record that `site` uses `used` as `kind`.
    ///
    /// Both elements must be live. Returns `false` if the edge already
    /// existed.
    pub fn add_use(&mut self, used: ElementId, kind: UseKind, site: ElementId) -> ForestResult<bool> {
        self.live_node(used)?;
        self.live_node(site)?;
        Ok(self.uses.add(used, UseSite::new(kind, site)))
    }

    /// Remove one use-site edge. Returns `false` if it was not present.
    pub fn remove_use(&mut self, used: ElementId, kind: UseKind, site: ElementId) -> bool {
        self.uses.remove(used, &UseSite::new(kind, site))
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    pub fn contains(&self, id: ElementId) -> bool {
        self.node(id).is_some()
    }

    pub fn get(&self, id: ElementId) -> Option<&E> {
        self.node(id).map(|n| &n.element)
    }

    /// A borrowed view of a live element.
    pub fn element_ref(&self, id: ElementId) -> Option<ElementRef<'_, E>> {
        self.node(id).map(|node| ElementRef {
            forest: self,
            id,
            node,
        })
    }

    /// Root ids in element order.
    pub fn roots(&self) -> &[ElementId] {
        &self.roots
    }

    pub fn root_refs(&self) -> impl Iterator<Item = ElementRef<'_, E>> + '_ {
        self.roots.iter().filter_map(|id| self.element_ref(*id))
    }

    /// Child ids in element order. Empty for unknown or removed ids.
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// Ancestors of an element, nearest first. The element itself is not
    /// included.
    pub fn ancestors(&self, id: ElementId) -> Vec<ElementId> {
        let mut result = Vec::new();
        let mut current = self.parent(id);
        while let Some(ancestor) = current {
            result.push(ancestor);
            current = self.parent(ancestor);
        }
        result
    }

    /// Descendants of an element in pre-order. The element itself is not
    /// included.
    pub fn descendants(&self, id: ElementId) -> Vec<ElementId> {
        let mut all = self.subtree(id);
        if !all.is_empty() {
            all.remove(0);
        }
        all
    }

    /// Every live element in pre-order, roots first.
    pub fn ids(&self) -> Vec<ElementId> {
        let mut result = Vec::with_capacity(self.live);
        for root in &self.roots {
            result.extend(self.subtree(*root));
        }
        result
    }

    /// Names of the element and its ancestors from the root, joined by `/`.
    pub fn path(&self, id: ElementId) -> Option<String> {
        let node = self.node(id)?;
        let mut names = vec![node.element.name()];
        for ancestor in self.ancestors(id) {
            if let Some(e) = self.get(ancestor) {
                names.push(e.name());
            }
        }
        names.reverse();
        Some(names.join("/"))
    }

    /// Find the root equal to `element`.
    pub fn find_root(&self, element: &E) -> Option<ElementId> {
        self.position(&self.roots, element)
            .ok()
            .map(|pos| self.roots[pos])
    }

    /// Find the child of `parent` equal to `element`.
    pub fn find_child(&self, parent: ElementId, element: &E) -> Option<ElementId> {
        let children = self.children(parent);
        self.position(children, element).ok().map(|pos| children[pos])
    }

    pub fn archive_of(&self, id: ElementId) -> Option<&str> {
        self.node(id).and_then(|n| n.archive.as_deref())
    }

    pub fn is_in_surface(&self, id: ElementId) -> bool {
        self.node(id).is_some_and(|n| n.in_surface)
    }

    /// Whether the last prune pass reached the element from the surface.
    pub fn is_reachable(&self, id: ElementId) -> bool {
        self.node(id).is_some_and(|n| n.reachable)
    }

    pub fn use_graph(&self) -> &UseGraph {
        &self.uses
    }

    /// The sites using `id`.
    pub fn use_sites(&self, id: ElementId) -> impl Iterator<Item = &UseSite> + '_ {
        self.uses.use_sites(id)
    }

    /// A report snapshot of the element.
    pub fn info(&self, id: ElementId) -> Option<ElementInfo> {
        self.element_ref(id).map(|e| e.info())
    }

    // ---------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------

    pub(crate) fn node(&self, id: ElementId) -> Option<&Node<E>> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: ElementId) -> Option<&mut Node<E>> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = (ElementId, &mut Node<E>)> {
        self.nodes
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_mut().map(|n| (ElementId(i), n)))
    }

    pub(crate) fn slot_count(&self) -> usize {
        self.nodes.len()
    }

    fn live_node(&self, id: ElementId) -> ForestResult<&Node<E>> {
        match self.nodes.get(id.0) {
            None => Err(ForestError::NotFound(id)),
            Some(None) => Err(ForestError::Detached(id)),
            Some(Some(node)) => Ok(node),
        }
    }

    fn live_node_mut(&mut self, id: ElementId) -> ForestResult<&mut Node<E>> {
        match self.nodes.get_mut(id.0) {
            None => Err(ForestError::NotFound(id)),
            Some(None) => Err(ForestError::Detached(id)),
            Some(Some(node)) => Ok(node),
        }
    }

    fn alloc(&mut self, node: Node<E>) -> ElementId {
        let id = ElementId(self.nodes.len());
        self.nodes.push(Some(node));
        self.live += 1;
        id
    }

    /// Binary search for `element` among sorted sibling ids.
    fn position(&self, siblings: &[ElementId], element: &E) -> Result<usize, usize> {
        // siblings are always live
        siblings.binary_search_by(|candidate| {
            self.get(*candidate)
                .map_or(Ordering::Less, |sibling| sibling.cmp(element))
        })
    }

    /// The element and its descendants in pre-order.
    fn subtree(&self, id: ElementId) -> Vec<ElementId> {
        let mut result = Vec::new();
        if !self.contains(id) {
            return result;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            result.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        result
    }
}

/// A borrowed view of one live element and its position in the forest.
pub struct ElementRef<'f, E> {
    forest: &'f Forest<E>,
    id: ElementId,
    node: &'f Node<E>,
}

impl<E> Clone for ElementRef<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for ElementRef<'_, E> {}

impl<E: fmt::Debug> fmt::Debug for ElementRef<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementRef")
            .field("id", &self.id)
            .field("element", &self.node.element)
            .finish()
    }
}

impl<'f, E> ElementRef<'f, E> {
    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn element(&self) -> &'f E {
        &self.node.element
    }

    pub fn forest(&self) -> &'f Forest<E> {
        self.forest
    }

    pub fn parent_id(&self) -> Option<ElementId> {
        self.node.parent
    }
}

impl<'f, E: Element> ElementRef<'f, E> {

    pub fn parent(&self) -> Option<ElementRef<'f, E>> {
        self.node.parent.and_then(|p| self.forest.element_ref(p))
    }

    /// Children in element order.
    pub fn children(&self) -> impl Iterator<Item = ElementRef<'f, E>> + 'f {
        let forest = self.forest;
        let node: &'f Node<E> = self.node;
        node.children
            .iter()
            .filter_map(move |c| forest.element_ref(*c))
    }

    pub fn has_children(&self) -> bool {
        !self.node.children.is_empty()
    }

    pub fn path(&self) -> String {
        self.forest.path(self.id).unwrap_or_default()
    }

    pub fn archive(&self) -> Option<&'f str> {
        self.node.archive.as_deref()
    }

    pub fn is_in_surface(&self) -> bool {
        self.node.in_surface
    }

    pub fn info(&self) -> ElementInfo {
        let info = ElementInfo::new(self.node.element.kind(), self.node.element.name(), self.path());
        match &self.node.archive {
            Some(archive) => info.with_archive(archive.clone()),
            None => info,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal element ordered by name.
    #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
    pub(crate) struct Named(pub(crate) &'static str);

    impl Element for Named {
        fn kind(&self) -> &str {
            "named"
        }

        fn name(&self) -> String {
            self.0.to_string()
        }
    }

    fn names(forest: &Forest<Named>, ids: &[ElementId]) -> Vec<&'static str> {
        ids.iter().map(|id| forest.get(*id).unwrap().0).collect()
    }

    // ---------------------------------------------------------------
    // Insertion and ordering
    // ---------------------------------------------------------------

    #[test]
    fn roots_are_kept_sorted() {
        let mut forest = Forest::new();
        let _ = forest.insert_root(Named("c"));
        let _ = forest.insert_root(Named("a"));
        let _ = forest.insert_root(Named("b"));
        assert_eq!(names(&forest, forest.roots()), vec!["a", "b", "c"]);
        assert_eq!(forest.len(), 3);
    }

    #[test]
    fn duplicate_root_is_a_no_op() {
        let mut forest = Forest::new();
        let first = forest.insert_root(Named("a"));
        assert!(first.is_some());
        assert!(forest.insert_root(Named("a")).is_none());
        assert_eq!(forest.len(), 1);
    }

    #[test]
    fn children_are_sorted_and_deduplicated() {
        let mut forest = Forest::new();
        let root = forest.insert_root(Named("r")).unwrap();
        let _ = forest.insert_child(root, Named("z")).unwrap();
        let _ = forest.insert_child(root, Named("m")).unwrap();
        assert!(forest.insert_child(root, Named("z")).unwrap().is_none());

        assert_eq!(names(&forest, forest.children(root)), vec!["m", "z"]);
        for child in forest.children(root) {
            assert_eq!(forest.parent(*child), Some(root));
        }
    }

    #[test]
    fn child_inherits_archive_and_surface() {
        let mut forest = Forest::new();
        let root = forest.insert_root(Named("r")).unwrap();
        forest.set_archive(root, Some("dep.jar".into())).unwrap();
        forest.set_in_surface(root, false).unwrap();
        let child = forest.insert_child(root, Named("c")).unwrap().unwrap();

        assert_eq!(forest.archive_of(child), Some("dep.jar"));
        assert!(!forest.is_in_surface(child));
    }

    #[test]
    fn insert_under_removed_parent_fails() {
        let mut forest = Forest::new();
        let root = forest.insert_root(Named("r")).unwrap();
        forest.remove(root).unwrap();
        assert_eq!(
            forest.insert_child(root, Named("c")).unwrap_err(),
            ForestError::Detached(root)
        );
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    #[test]
    fn path_ancestors_and_descendants() {
        let mut forest = Forest::new();
        let a = forest.insert_root(Named("a")).unwrap();
        let b = forest.insert_child(a, Named("b")).unwrap().unwrap();
        let c = forest.insert_child(b, Named("c")).unwrap().unwrap();
        let d = forest.insert_child(a, Named("d")).unwrap().unwrap();

        assert_eq!(forest.path(c).as_deref(), Some("a/b/c"));
        assert_eq!(forest.ancestors(c), vec![b, a]);
        assert_eq!(forest.descendants(a), vec![b, c, d]);
        assert_eq!(forest.ids(), vec![a, b, c, d]);
    }

    #[test]
    fn find_by_value() {
        let mut forest = Forest::new();
        let a = forest.insert_root(Named("a")).unwrap();
        let b = forest.insert_child(a, Named("b")).unwrap().unwrap();

        assert_eq!(forest.find_root(&Named("a")), Some(a));
        assert_eq!(forest.find_root(&Named("b")), None);
        assert_eq!(forest.find_child(a, &Named("b")), Some(b));
    }

    #[test]
    fn element_ref_describes_element() {
        let mut forest = Forest::new();
        let a = forest.insert_root(Named("a")).unwrap();
        forest.set_archive(a, Some("v1.json".into())).unwrap();
        let b = forest.insert_child(a, Named("b")).unwrap().unwrap();

        let r = forest.element_ref(b).unwrap();
        assert_eq!(r.parent().map(|p| p.id()), Some(a));
        let info = r.info();
        assert_eq!(info.path, "a/b");
        assert_eq!(info.kind, "named");
        assert_eq!(info.archive.as_deref(), Some("v1.json"));
    }

    // ---------------------------------------------------------------
    // Removal
    // ---------------------------------------------------------------

    #[test]
    fn remove_detaches_subtree_and_edges() {
        let mut forest = Forest::new();
        let a = forest.insert_root(Named("a")).unwrap();
        let b = forest.insert_child(a, Named("b")).unwrap().unwrap();
        let x = forest.insert_root(Named("x")).unwrap();
        forest.add_use(x, UseKind::HasType, b).unwrap();
        forest.add_use(b, UseKind::ReturnType, x).unwrap();

        let removed = forest.remove(a).unwrap();
        assert_eq!(removed, vec![a, b]);
        assert!(!forest.contains(b));
        assert_eq!(forest.roots(), &[x]);
        assert!(forest.use_graph().is_empty());
        assert_eq!(forest.len(), 1);
    }

    #[test]
    fn removing_child_updates_parent() {
        let mut forest = Forest::new();
        let a = forest.insert_root(Named("a")).unwrap();
        let b = forest.insert_child(a, Named("b")).unwrap().unwrap();
        forest.remove(b).unwrap();
        assert!(forest.children(a).is_empty());
        assert_eq!(forest.parent(b), None);
    }

    #[test]
    fn double_removal_is_an_error() {
        let mut forest = Forest::new();
        let a = forest.insert_root(Named("a")).unwrap();
        forest.remove(a).unwrap();
        assert_eq!(forest.remove(a).unwrap_err(), ForestError::AlreadyRemoved(a));
        assert_eq!(
            forest.remove(ElementId::from_index(99)).unwrap_err(),
            ForestError::NotFound(ElementId::from_index(99))
        );
    }

    #[test]
    fn ids_are_not_reused() {
        let mut forest = Forest::new();
        let a = forest.insert_root(Named("a")).unwrap();
        forest.remove(a).unwrap();
        let again = forest.insert_root(Named("a")).unwrap();
        assert_ne!(a, again);
    }

    #[test]
    fn edges_to_detached_elements_are_rejected() {
        let mut forest = Forest::new();
        let a = forest.insert_root(Named("a")).unwrap();
        let b = forest.insert_root(Named("b")).unwrap();
        forest.remove(b).unwrap();
        assert_eq!(
            forest.add_use(a, UseKind::Annotates, b).unwrap_err(),
            ForestError::Detached(b)
        );
    }
}
