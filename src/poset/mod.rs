//! Order-theoretic analysis of the `envelops` relation.
//!
//! A dataset's `envelops` relations are read as a containment order ("A envelops B" puts B
//! inside A). This module checks that reading against the partial-order axioms and reports what
//! breaks.
//!
//! # Module Organization
//!
//! - [`graph`]: the [`EnvelopGraph`] petgraph view every analysis starts from, and
//!   [`EnvelopMaps`] parent/child adjacency
//! - [`cycle`]: explicit-stack cycle detection with a witness path
//! - [`closure`]: Floyd–Warshall reachability, implied pairs, transitive reduction
//! - [`diagnostics`]: the aggregated report, the four named rule checks and mode gating
//! - [`tightness`]: how well each envelope contains the relations touching it
//!
//! Every function takes a dataset by reference and returns a fresh value. Relations whose
//! endpoints are not both present in the dataset take no part in any of these analyses.

pub mod closure;
pub mod cycle;
pub mod diagnostics;
pub mod graph;
pub mod tightness;

pub use closure::{
    compute_transitive_closure_pairs, compute_transitive_reduction_edges, transitive_closure,
    ImpliedPair, ReachMatrix,
};
pub use cycle::{detect_envelop_cycle, find_envelop_cycle};
pub use diagnostics::{
    compute_poset_diagnostics, compute_rule_checks, describe_cycle, validate_dataset_for_mode,
    AntisymmetryViolation, ModeValidation, OntologyMode, PosetDiagnostics, RuleCheck,
    RuleCheckResult, RuleId,
};
pub use graph::{compute_envelop_maps, EnvelopGraph, EnvelopMaps};
pub use tightness::{compute_envelope_tightness, EnvelopeTightness};
