//! Poset diagnostics, the four named rule checks, and mode gating.
//!
//! Structural violations are findings, not errors: every function in here always returns a
//! report. Only [validate_dataset_for_mode] under [OntologyMode::StrictPoset] turns a failing
//! report into a refusal, and even then the full [RuleCheckResult] travels with it.

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use super::{
    closure::transitive_closure,
    graph::{compute_envelop_maps, EnvelopGraph},
};
use crate::{
    error::OntologyError,
    properties::{NodeId, OntologyDataset},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AntisymmetryViolation {
    pub a_id: NodeId,
    pub b_id: NodeId,
    pub a_label: String,
    pub b_label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PosetDiagnostics {
    /// Number of `envelops` relations, dangling ones included.
    pub env_count: usize,
    pub multi_parent_count: usize,
    pub has_cycle: bool,
    pub antisym_violations: Vec<AntisymmetryViolation>,
}

pub fn compute_poset_diagnostics(dataset: &OntologyDataset) -> PosetDiagnostics {
    let maps = compute_envelop_maps(&dataset.nodes, &dataset.edges);
    let closure = transitive_closure(&dataset.nodes, &dataset.edges);

    let mut antisym_violations = Vec::new();
    for (i, a) in dataset.nodes.iter().enumerate() {
        for (j, b) in dataset.nodes.iter().enumerate().skip(i + 1) {
            if closure.mutually_reachable(i, j) {
                antisym_violations.push(AntisymmetryViolation {
                    a_id: a.id.clone(),
                    b_id: b.id.clone(),
                    a_label: a.label.clone(),
                    b_label: b.label.clone(),
                });
            }
        }
    }

    PosetDiagnostics {
        env_count: dataset.envelops_edges().count(),
        multi_parent_count: maps.multi_parent_ids.len(),
        has_cycle: EnvelopGraph::from_dataset(dataset).find_cycle().is_some(),
        antisym_violations,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    NoSelfLoop,
    Acyclic,
    Antisymmetry,
    SingleParent,
}

impl RuleId {
    pub fn all() -> &'static [RuleId] {
        &[
            RuleId::NoSelfLoop,
            RuleId::Acyclic,
            RuleId::Antisymmetry,
            RuleId::SingleParent,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::NoSelfLoop => "no_self_loop",
            RuleId::Acyclic => "acyclic",
            RuleId::Antisymmetry => "antisymmetry",
            RuleId::SingleParent => "single_parent",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RuleId::NoSelfLoop => "No envelops self-loops",
            RuleId::Acyclic => "Envelops graph is acyclic",
            RuleId::Antisymmetry => "Antisymmetry holds",
            RuleId::SingleParent => "Single envelops parent per node",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleCheck {
    pub id: RuleId,
    pub label: String,
    pub ok: bool,
    pub detail: String,
}

impl RuleCheck {
    fn new(id: RuleId, ok: bool, detail: String) -> Self {
        RuleCheck {
            id,
            label: id.label().to_string(),
            ok,
            detail,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleCheckResult {
    /// One entry per [RuleId], in [RuleId::all] order.
    pub checks: Vec<RuleCheck>,
    pub is_valid: bool,
    /// Details of the failing checks, in rule order.
    pub blocking_issues: Vec<String>,
    pub diagnostics: PosetDiagnostics,
}

impl RuleCheckResult {
    pub fn check(&self, id: RuleId) -> Option<&RuleCheck> {
        self.checks.iter().find(|check| check.id == id)
    }

    pub fn failing(&self) -> impl Iterator<Item = &RuleCheck> {
        self.checks.iter().filter(|check| !check.ok)
    }
}

fn label_list<'a>(dataset: &'a OntologyDataset, ids: impl IntoIterator<Item = &'a str>) -> String {
    ids.into_iter()
        .map(|id| dataset.node_label(id))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn compute_rule_checks(dataset: &OntologyDataset) -> RuleCheckResult {
    let diagnostics = compute_poset_diagnostics(dataset);
    let graph = EnvelopGraph::from_dataset(dataset);

    let self_loops = graph.self_loops();
    let no_self_loop = if self_loops.is_empty() {
        RuleCheck::new(
            RuleId::NoSelfLoop,
            true,
            "No node envelops itself.".to_string(),
        )
    } else {
        RuleCheck::new(
            RuleId::NoSelfLoop,
            false,
            format!(
                "Self-enveloping node(s): {}.",
                label_list(dataset, self_loops.iter().map(|edge| edge.from.as_str()))
            ),
        )
    };

    let acyclic = match graph.find_cycle() {
        None => RuleCheck::new(
            RuleId::Acyclic,
            true,
            "No envelops cycle found.".to_string(),
        ),
        Some(path) => RuleCheck::new(
            RuleId::Acyclic,
            false,
            format!("Envelops cycle: {}.", render_path(dataset, &path)),
        ),
    };

    let antisymmetry = if diagnostics.antisym_violations.is_empty() {
        RuleCheck::new(
            RuleId::Antisymmetry,
            true,
            "No two distinct nodes envelop each other.".to_string(),
        )
    } else {
        let pairs = diagnostics
            .antisym_violations
            .iter()
            .map(|pair| format!("{} <-> {}", pair.a_label, pair.b_label))
            .collect::<Vec<_>>()
            .join(", ");
        RuleCheck::new(
            RuleId::Antisymmetry,
            false,
            format!(
                "{} antisymmetry violation(s): {}.",
                diagnostics.antisym_violations.len(),
                pairs
            ),
        )
    };

    let maps = compute_envelop_maps(&dataset.nodes, &dataset.edges);
    let single_parent = if maps.multi_parent_ids.is_empty() {
        RuleCheck::new(
            RuleId::SingleParent,
            true,
            "Every node has at most one envelops parent.".to_string(),
        )
    } else {
        RuleCheck::new(
            RuleId::SingleParent,
            false,
            format!(
                "{} node(s) with multiple envelops parents: {}.",
                maps.multi_parent_ids.len(),
                label_list(dataset, maps.multi_parent_ids.iter().map(String::as_str))
            ),
        )
    };

    let checks = vec![no_self_loop, acyclic, antisymmetry, single_parent];
    let blocking_issues: Vec<String> = checks
        .iter()
        .filter(|check| !check.ok)
        .map(|check| check.detail.clone())
        .collect();

    RuleCheckResult {
        is_valid: blocking_issues.is_empty(),
        checks,
        blocking_issues,
        diagnostics,
    }
}

/// How strictly edits are held to the poset rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OntologyMode {
    /// Edits that would leave any rule failing are refused.
    StrictPoset,
    /// Every edit is accepted; failing rules come back as notices.
    #[default]
    SoftPoset,
    /// Every edit is accepted; the rules are informational only.
    FreeGraph,
}

impl OntologyMode {
    pub fn all() -> &'static [OntologyMode] {
        &[
            OntologyMode::StrictPoset,
            OntologyMode::SoftPoset,
            OntologyMode::FreeGraph,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OntologyMode::StrictPoset => "strict_poset",
            OntologyMode::SoftPoset => "soft_poset",
            OntologyMode::FreeGraph => "free_graph",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OntologyMode::StrictPoset => "Strict poset",
            OntologyMode::SoftPoset => "Soft poset",
            OntologyMode::FreeGraph => "Free graph",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            OntologyMode::StrictPoset => {
                "Blocks edits that break acyclicity, antisymmetry, single-parent nesting or add self-loops."
            }
            OntologyMode::SoftPoset => {
                "Allows every edit and reports poset rule violations as warnings."
            }
            OntologyMode::FreeGraph => {
                "Treats envelops as an ordinary relation; rule checks are informational."
            }
        }
    }
}

impl Display for OntologyMode {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OntologyMode {
    type Err = OntologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('-', "_");
        OntologyMode::all()
            .iter()
            .find(|mode| mode.as_str() == normalized)
            .copied()
            .ok_or_else(|| OntologyError::Command(format!("Unknown ontology mode '{s}'")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeValidation {
    pub mode: OntologyMode,
    pub allowed: bool,
    pub rule_check: RuleCheckResult,
    pub notices: Vec<String>,
}

impl ModeValidation {
    /// The refusal for a blocked candidate, `None` when it was allowed.
    pub fn into_blocked_error(self, context: &str) -> Option<OntologyError> {
        if self.allowed {
            return None;
        }
        Some(OntologyError::ModeBlocked {
            context: context.to_string(),
            issues: self.rule_check.blocking_issues,
        })
    }
}

pub fn validate_dataset_for_mode(dataset: &OntologyDataset, mode: OntologyMode) -> ModeValidation {
    let rule_check = compute_rule_checks(dataset);
    let (allowed, notices) = match mode {
        OntologyMode::StrictPoset => (rule_check.is_valid, Vec::new()),
        OntologyMode::SoftPoset => (true, rule_check.blocking_issues.clone()),
        OntologyMode::FreeGraph => (true, Vec::new()),
    };
    ModeValidation {
        mode,
        allowed,
        rule_check,
        notices,
    }
}

fn render_path(dataset: &OntologyDataset, path: &[&str]) -> String {
    path.iter()
        .map(|id| dataset.node_label(id))
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Node path of the first `envelops` cycle, rendered with labels ("A -> B -> A").
pub fn describe_cycle(dataset: &OntologyDataset) -> Option<String> {
    EnvelopGraph::from_dataset(dataset)
        .find_cycle()
        .map(|path| render_path(dataset, &path))
}
