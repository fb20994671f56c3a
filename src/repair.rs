//! Repair suggestions for datasets that break the poset rules.
//!
//! [suggest_repairs] proposes small edits, cheapest first; [apply_repair_suggestion] applies one
//! and returns a new dataset. Every proposal only ever removes a relation from the `envelops`
//! order (by deleting it or downgrading its type), so applying one can never add a rule failure.
//!
//! Generated in this order, then de-duplicated and stably sorted by cost:
//!
//! 1. For each strongly connected component of the `envelops` graph with more than one node (or
//!    a single node with a self-loop): remove its weakest internal relation, or downgrade that
//!    relation to `grounds`.
//! 2. For each antisymmetry violation: remove the weaker of the direct relations between the
//!    pair.
//! 3. For each multi-parent node: remove its weakest incoming `envelops` relation.
//! 4. For each `envelops` self-loop: remove it.

use petgraph::{algo::tarjan_scc, graph::EdgeIndex, visit::EdgeRef, Direction};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{
    cmp::Ordering,
    collections::{BTreeSet, HashSet},
};

use crate::{
    dataset::without_edges,
    poset::{compute_envelop_maps, compute_poset_diagnostics, compute_rule_checks, EnvelopGraph},
    properties::{clamp01, format_percent, OntologyDataset, Relation, RelationId, RelationType},
};

pub const DEFAULT_MAX_REPAIRS: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RepairAction {
    #[serde(rename_all = "camelCase")]
    RemoveEdge { edge_id: RelationId },
    #[serde(rename_all = "camelCase")]
    SetEdgeType {
        edge_id: RelationId,
        edge_type: RelationType,
    },
    #[serde(rename_all = "camelCase")]
    SetEdgeStrength { edge_id: RelationId, strength: f64 },
}

impl RepairAction {
    pub fn edge_id(&self) -> &str {
        match self {
            RepairAction::RemoveEdge { edge_id }
            | RepairAction::SetEdgeType { edge_id, .. }
            | RepairAction::SetEdgeStrength { edge_id, .. } => edge_id,
        }
    }

    fn canonical(&self) -> String {
        match self {
            RepairAction::RemoveEdge { edge_id } => format!("remove_edge:{edge_id}"),
            RepairAction::SetEdgeType { edge_id, edge_type } => {
                format!("set_edge_type:{edge_id}:{edge_type}")
            }
            RepairAction::SetEdgeStrength { edge_id, strength } => {
                format!("set_edge_strength:{edge_id}:{strength:.6}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairSuggestion {
    /// Stable across runs: derived from the suggestion's actions.
    pub id: String,
    pub title: String,
    pub reason: String,
    /// Blocking issue count before and after applying the suggestion.
    pub estimated_impact: String,
    pub actions: Vec<RepairAction>,
    /// Sum of the strengths of the relations the actions touch. Lower is cheaper.
    pub cost: f64,
}

/// Sorted action keys joined with `|`. Two suggestions with the same key are the same repair.
pub fn canonical_key(actions: &[RepairAction]) -> String {
    let mut keys: Vec<String> = actions.iter().map(RepairAction::canonical).collect();
    keys.sort();
    keys.join("|")
}

fn suggestion_id(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    format!("repair_{}", &hex::encode(digest)[..12])
}

struct Candidate {
    title: String,
    reason: String,
    actions: Vec<RepairAction>,
}

fn arrow(dataset: &OntologyDataset, edge: &Relation) -> String {
    format!(
        "{} → {}",
        dataset.node_label(&edge.from),
        dataset.node_label(&edge.to)
    )
}

/// First relation with the lowest strength, in the order given.
fn weakest<'a>(edges: impl IntoIterator<Item = &'a Relation>) -> Option<&'a Relation> {
    edges.into_iter().min_by(|a, b| {
        a.strength
            .partial_cmp(&b.strength)
            .unwrap_or(Ordering::Equal)
    })
}

fn cycle_candidates(dataset: &OntologyDataset, graph: &EnvelopGraph, out: &mut Vec<Candidate>) {
    let mut components = tarjan_scc(graph.as_graph());
    for component in components.iter_mut() {
        component.sort();
    }
    components.sort();

    for component in components {
        let members: BTreeSet<_> = component.iter().copied().collect();
        let mut internal: Vec<EdgeIndex> = graph
            .as_graph()
            .edge_indices()
            .filter(|idx| {
                graph
                    .as_graph()
                    .edge_endpoints(*idx)
                    .is_some_and(|(s, t)| members.contains(&s) && members.contains(&t))
            })
            .collect();
        internal.sort();
        if internal.is_empty() {
            // single node without a self-loop
            continue;
        }

        let Some(edge) = weakest(internal.iter().map(|idx| graph.relation(*idx))) else {
            continue;
        };
        let member_labels = component
            .iter()
            .map(|idx| dataset.node_label(graph.id_of(*idx)))
            .collect::<Vec<_>>()
            .join(", ");

        out.push(Candidate {
            title: format!("Break cycle: remove {}", arrow(dataset, edge)),
            reason: format!(
                "Cycle through {member_labels}. This is its weakest envelops relation ({}).",
                format_percent(edge.strength)
            ),
            actions: vec![RepairAction::RemoveEdge {
                edge_id: edge.id.clone(),
            }],
        });
        out.push(Candidate {
            title: format!("Break cycle: downgrade {} to grounds", arrow(dataset, edge)),
            reason: format!(
                "Cycle through {member_labels}. Keeps the link but takes it out of the containment order."
            ),
            actions: vec![RepairAction::SetEdgeType {
                edge_id: edge.id.clone(),
                edge_type: RelationType::Grounds,
            }],
        });
    }
}

fn antisymmetry_candidates(
    dataset: &OntologyDataset,
    graph: &EnvelopGraph,
    out: &mut Vec<Candidate>,
) {
    let diagnostics = compute_poset_diagnostics(dataset);
    for pair in &diagnostics.antisym_violations {
        let (Some(a), Some(b)) = (graph.index_of(&pair.a_id), graph.index_of(&pair.b_id)) else {
            continue;
        };
        let mut direct: Vec<EdgeIndex> = graph
            .as_graph()
            .edges_connecting(a, b)
            .chain(graph.as_graph().edges_connecting(b, a))
            .map(|edge| edge.id())
            .collect();
        direct.sort();
        // Mutual reachability through longer paths only; the cycle repair covers it.
        let Some(edge) = weakest(direct.iter().map(|idx| graph.relation(*idx))) else {
            continue;
        };
        out.push(Candidate {
            title: format!("Restore antisymmetry: remove {}", arrow(dataset, edge)),
            reason: format!(
                "{} and {} envelop each other. This is the weaker direct relation ({}).",
                pair.a_label,
                pair.b_label,
                format_percent(edge.strength)
            ),
            actions: vec![RepairAction::RemoveEdge {
                edge_id: edge.id.clone(),
            }],
        });
    }
}

fn multi_parent_candidates(
    dataset: &OntologyDataset,
    graph: &EnvelopGraph,
    out: &mut Vec<Candidate>,
) {
    let maps = compute_envelop_maps(&dataset.nodes, &dataset.edges);
    for node_id in &maps.multi_parent_ids {
        let Some(idx) = graph.index_of(node_id) else {
            continue;
        };
        let mut incoming: Vec<EdgeIndex> = graph
            .as_graph()
            .edges_directed(idx, Direction::Incoming)
            .map(|edge| edge.id())
            .collect();
        incoming.sort();
        let Some(edge) = weakest(incoming.iter().map(|idx| graph.relation(*idx))) else {
            continue;
        };
        out.push(Candidate {
            title: format!("Single parent: remove {}", arrow(dataset, edge)),
            reason: format!(
                "{} has {} envelops parents. This is the weakest incoming relation ({}).",
                dataset.node_label(node_id),
                incoming.len(),
                format_percent(edge.strength)
            ),
            actions: vec![RepairAction::RemoveEdge {
                edge_id: edge.id.clone(),
            }],
        });
    }
}

fn self_loop_candidates(dataset: &OntologyDataset, graph: &EnvelopGraph, out: &mut Vec<Candidate>) {
    for edge in graph.self_loops() {
        out.push(Candidate {
            title: format!("Remove self-loop on {}", dataset.node_label(&edge.from)),
            reason: "A node cannot envelop itself.".to_string(),
            actions: vec![RepairAction::RemoveEdge {
                edge_id: edge.id.clone(),
            }],
        });
    }
}

fn action_cost(dataset: &OntologyDataset, actions: &[RepairAction]) -> f64 {
    actions
        .iter()
        .filter_map(|action| dataset.edge(action.edge_id()))
        .map(|edge| edge.strength)
        .sum()
}

/// Up to `max` repairs for the dataset's rule failures, cheapest first. Empty for a valid
/// dataset.
pub fn suggest_repairs(dataset: &OntologyDataset, max: usize) -> Vec<RepairSuggestion> {
    let graph = EnvelopGraph::from_dataset(dataset);
    let mut candidates = Vec::new();
    cycle_candidates(dataset, &graph, &mut candidates);
    antisymmetry_candidates(dataset, &graph, &mut candidates);
    multi_parent_candidates(dataset, &graph, &mut candidates);
    self_loop_candidates(dataset, &graph, &mut candidates);

    let mut seen = HashSet::new();
    let mut suggestions: Vec<RepairSuggestion> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let key = canonical_key(&candidate.actions);
            if !seen.insert(key.clone()) {
                return None;
            }
            Some(RepairSuggestion {
                id: suggestion_id(&key),
                title: candidate.title,
                reason: candidate.reason,
                estimated_impact: String::new(),
                cost: action_cost(dataset, &candidate.actions),
                actions: candidate.actions,
            })
        })
        .collect();

    suggestions.sort_by(|a, b| a.cost.partial_cmp(&b.cost).unwrap_or(Ordering::Equal));
    suggestions.truncate(max);

    let before = compute_rule_checks(dataset).blocking_issues.len();
    for suggestion in suggestions.iter_mut() {
        let after = compute_rule_checks(&apply_repair_actions(dataset, &suggestion.actions))
            .blocking_issues
            .len();
        suggestion.estimated_impact = format!("Blocking issues: {before} → {after}");
    }
    suggestions
}

/// Applies a suggestion's actions. Removals cascade to meta-relations; actions naming a relation
/// the dataset no longer has are skipped.
pub fn apply_repair_suggestion(
    dataset: &OntologyDataset,
    suggestion: &RepairSuggestion,
) -> OntologyDataset {
    tracing::debug!(
        "[apply_repair_suggestion] {} ({})",
        suggestion.id,
        suggestion.title
    );
    apply_repair_actions(dataset, &suggestion.actions)
}

pub fn apply_repair_actions(dataset: &OntologyDataset, actions: &[RepairAction]) -> OntologyDataset {
    let removed: BTreeSet<&str> = actions
        .iter()
        .filter_map(|action| match action {
            RepairAction::RemoveEdge { edge_id } => Some(edge_id.as_str()),
            _ => None,
        })
        .collect();
    let mut next = without_edges(dataset, &removed);

    for action in actions {
        let Some(edge) = next.edges.iter_mut().find(|edge| edge.id == action.edge_id()) else {
            if !removed.contains(action.edge_id()) {
                tracing::debug!(
                    "[apply_repair_actions] skipping action on missing relation {}",
                    action.edge_id()
                );
            }
            continue;
        };
        match action {
            RepairAction::RemoveEdge { .. } => {}
            RepairAction::SetEdgeType { edge_type, .. } => edge.kind = *edge_type,
            RepairAction::SetEdgeStrength { strength, .. } => edge.strength = clamp01(*strength),
        }
    }
    next
}
