//! # ontoposet
//!
//! Order-theoretic diagnostics for small ontologies.
//!
//! ## Overview
//!
//! An ontology here is a set of labelled nodes joined by typed, weighted relations, plus
//! meta-relations between relations. One relation type, `envelops`, is read as a containment
//! order: "A envelops B" means B sits inside A. ontoposet treats the envelops edges as a
//! candidate partial order and tells you how far the data is from actually being one.
//!
//! ### Key Features
//!
//! - **Closure and reduction**: implied containment pairs, and the minimal envelops edge set with
//!   the same reachability
//! - **Poset rule checks**: no self-loops, acyclic, antisymmetric, single parent
//! - **Modes**: `strict_poset` refuses edits that break the rules, `soft_poset` reports them,
//!   `free_graph` ignores them
//! - **Repairs**: ranked, deterministic edge removals and retypings that clear rule failures
//! - **Envelope tightness**: how self-contained each envelope's subtree is
//! - **Snapshots and diffs**: structural and diagnostic deltas between two datasets
//! - **Layouts**: layered by envelops depth, or a deterministic force layout
//!
//! ## Architecture
//!
//! - **[`properties`]**: dataset types (`OntologyNode`, `Relation`, `MetaRelation`)
//! - **[`dataset`]**: JSON import and export, and the pure edit functions
//! - **[`poset`]**: envelops graph, cycle search, closure, reduction, rule checks, tightness
//! - **[`repair`]**: repair suggestions and their application
//! - **[`diff`]**: snapshot comparison
//! - **[`query`]**: edge visibility filters
//! - **[`layout`]**: node placement
//! - **[`presets`]**: the embedded preset library
//! - **[`session`]**: the mutable current dataset, mode gate and snapshot list
//!
//! ## Quick Start
//!
//! ```rust
//! use ontoposet::{poset::OntologyMode, session::OntologySession};
//!
//! let mut session = OntologySession::from_preset("mutual-containment").unwrap();
//! let check = session.rule_check();
//! assert!(!check.is_valid);
//!
//! // Strict mode refuses further edits until the dataset is repaired.
//! let warning = session.set_mode(OntologyMode::StrictPoset).unwrap();
//! assert!(warning.is_some());
//! assert!(session.add_node("Extra", None).is_err());
//! ```
//!
//! Every analysis is also available as a pure function of an `OntologyDataset`, e.g.
//! [`poset::compute_rule_checks`] or [`repair::suggest_repairs`].

pub mod config;
pub mod dataset;
pub mod diff;
pub mod error;
pub mod event;
pub mod layout;
pub mod poset;
pub mod presets;
pub mod properties;
pub mod query;
pub mod repair;
pub mod session;
#[cfg(test)]
mod tests;

pub use error::*;
