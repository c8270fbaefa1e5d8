//! Directed, typed "is used by" edges between forest elements.
//!
//! A [`UseSite`] is recorded on the *used* element and names the element that
//! uses it. The graph also keeps the reverse direction (what each element
//! uses) so pruning can walk reachability from the surface outward.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::forest::ElementId;

/// How a site uses an element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UseKind {
    /// The used element annotates the site.
    Annotates,
    /// The site inherits from the used element.
    IsInherited,
    /// The site implements the used element.
    IsImplemented,
    /// The site has the used element as its type.
    HasType,
    /// The site returns the used element.
    ReturnType,
    /// The site has a parameter of the used element's type.
    ParameterType,
    /// The site may throw the used element.
    IsThrown,
    /// The used element contains the site.
    Contains,
    /// The used element is a type parameter or bound of the site.
    TypeParameterOrBound,
}

impl fmt::Display for UseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Annotates => "annotates",
            Self::IsInherited => "is_inherited",
            Self::IsImplemented => "is_implemented",
            Self::HasType => "has_type",
            Self::ReturnType => "return_type",
            Self::ParameterType => "parameter_type",
            Self::IsThrown => "is_thrown",
            Self::Contains => "contains",
            Self::TypeParameterOrBound => "type_parameter_or_bound",
        };
        f.write_str(s)
    }
}

/// "`site` uses the owning element as `kind`".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UseSite {
    pub kind: UseKind,
    pub site: ElementId,
}

impl UseSite {
    pub fn new(kind: UseKind, site: ElementId) -> Self {
        Self { kind, site }
    }
}

/// Adjacency maps of use-site edges, keyed by element id.
///
/// The graph knows nothing about the tree; [`Forest`](crate::Forest)
/// validates ids before edges are added.
#[derive(Clone, Debug, Default)]
pub struct UseGraph {
    /// used element -> sites using it
    used_by: BTreeMap<ElementId, BTreeSet<UseSite>>,
    /// using element -> (kind, used element)
    uses: BTreeMap<ElementId, BTreeSet<(UseKind, ElementId)>>,
}

impl UseGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `site.site` uses `used` as `site.kind`.
    ///
    /// Returns `false` if the edge was already present.
    pub fn add(&mut self, used: ElementId, site: UseSite) -> bool {
        let added = self.used_by.entry(used).or_default().insert(site);
        if added {
            self.uses
                .entry(site.site)
                .or_default()
                .insert((site.kind, used));
        }
        added
    }

    /// Remove one edge. Returns `false` if it was not present.
    pub fn remove(&mut self, used: ElementId, site: &UseSite) -> bool {
        let removed = remove_from(&mut self.used_by, used, site);
        if removed {
            remove_from(&mut self.uses, site.site, &(site.kind, used));
        }
        removed
    }

    /// Drop every edge where `id` is either the user or the used element.
    ///
    /// Returns the number of edges removed.
    pub fn detach(&mut self, id: ElementId) -> usize {
        let mut removed = 0;

        if let Some(sites) = self.used_by.remove(&id) {
            for site in &sites {
                remove_from(&mut self.uses, site.site, &(site.kind, id));
            }
            removed += sites.len();
        }

        if let Some(used) = self.uses.remove(&id) {
            for (kind, target) in &used {
                if remove_from(&mut self.used_by, *target, &UseSite::new(*kind, id)) {
                    removed += 1;
                }
            }
        }

        removed
    }

    /// The sites using `id`, in a stable order.
    pub fn use_sites(&self, id: ElementId) -> impl Iterator<Item = &UseSite> + '_ {
        self.used_by.get(&id).into_iter().flatten()
    }

    /// The elements `id` uses, with the kind of use.
    pub fn uses(&self, id: ElementId) -> impl Iterator<Item = (UseKind, ElementId)> + '_ {
        self.uses.get(&id).into_iter().flatten().copied()
    }

    pub fn contains(&self, used: ElementId, site: &UseSite) -> bool {
        self.used_by
            .get(&used)
            .is_some_and(|sites| sites.contains(site))
    }

    /// Whether anything uses `id`.
    pub fn is_used(&self, id: ElementId) -> bool {
        self.used_by.contains_key(&id)
    }

    /// Total number of edges.
    pub fn edge_count(&self) -> usize {
        self.used_by.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.used_by.is_empty()
    }
}

/// Remove `value` from the set under `key`, dropping the set once empty so
/// that `is_used` stays accurate.
fn remove_from<T: Ord>(
    map: &mut BTreeMap<ElementId, BTreeSet<T>>,
    key: ElementId,
    value: &T,
) -> bool {
    let Some(set) = map.get_mut(&key) else {
        return false;
    };
    let removed = set.remove(value);
    if set.is_empty() {
        map.remove(&key);
    }
    removed
}
