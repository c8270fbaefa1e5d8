//! Foundation types for apicmp.
//!
//! This crate holds the value types every other apicmp crate shares: the
//! difference and report model, compatibility classification, the element
//! contract, and the archives an API is made of.
//!
//! # Key Types
//!
//! - [`Difference`] -- One classified discrepancy between an old and a new element
//! - [`Report`] -- All differences found for one old/new pairing
//! - [`CompatibilityType`] / [`DifferenceSeverity`] -- What a difference breaks and how badly
//! - [`Criticality`] / [`SeverityMapping`] -- How much the project cares
//! - [`Element`] / [`ElementInfo`] -- The element contract and its report snapshot
//! - [`Archive`] / [`Api`] -- The artifacts being compared
//! - [`CodePattern`] -- Code matching for transforms

pub mod archive;
pub mod difference;
pub mod element;
pub mod error;
pub mod pattern;
pub mod report;
pub mod severity;

pub use archive::{Api, ApiBuilder, Archive, InMemoryArchive};
pub use difference::{Difference, DifferenceBuilder};
pub use element::{Element, ElementInfo};
pub use error::{TypeError, TypeResult};
pub use pattern::{full_match_regex, glob_match, CodePattern};
pub use report::Report;
pub use severity::{CompatibilityType, Criticality, DifferenceSeverity, SeverityMapping};
