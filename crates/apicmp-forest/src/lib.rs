//! Element forests for apicmp.
//!
//! An API is modelled as a forest of elements stored in an arena
//! ([`Forest`]), with typed use-site edges between elements ([`UseGraph`]).
//! Elements that are neither part of the observable surface nor reachable
//! from it are removed by mark-and-sweep pruning ([`Forest::prune`]).
//! [`TreeFilter`]s decide which discovered elements enter a forest at all.

pub mod error;
pub mod filter;
pub mod forest;
pub mod prune;
pub mod use_graph;

pub use error::{ForestError, ForestResult};
pub use filter::{
    FilterFinishResult, FilterMatch, FilterStartResult, GlobPathFilter, IncludeExcludeFilter,
    MatchAll, RegexPathFilter, TreeFilter, UnionFilter,
};
pub use forest::{ElementId, ElementRef, Forest};
pub use prune::PruneReport;
pub use use_graph::{UseGraph, UseKind, UseSite};
