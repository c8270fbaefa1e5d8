//! Paired comparison of two element forests.
//!
//! [`CoIter`] merge-joins two sorted sequences into [`Pair`]s, and [`walk`]
//! uses it at every level to drive a [`DifferenceAnalyzer`] over an old and
//! a new forest.
//!
//! # Key Types
//!
//! - [`CoIter`] / [`Pair`] -- Merge-join of two sorted inputs
//! - [`DifferenceAnalyzer`] / [`PairingSink`] -- Both ends of a paired walk
//! - [`KeyValueElement`] / [`KeyValueAnalyzer`] -- Key/value documents

pub mod co_iter;
pub mod error;
pub mod keyed;
pub mod traversal;

pub use co_iter::{CoIter, OrdComparator, Pair};
pub use error::{DiffError, DiffResult, Side};
pub use keyed::{forest_from_json, insert_value, KeyValueAnalyzer, KeyValueElement, KvKey, KvValue};
pub use traversal::{walk, DifferenceAnalyzer, PairingSink, WalkStats};
