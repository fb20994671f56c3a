//! Structural diff between two datasets ("left" before, "right" after).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{
    poset::{compute_poset_diagnostics, PosetDiagnostics},
    properties::{MetaRelation, OntologyDataset, OntologyNode, Relation},
};

/// Strength differences at or below this are not reported as changes.
pub const DEFAULT_STRENGTH_EPSILON: f64 = 1e-6;

/// An entity that can be matched by id across two datasets and compared field by field.
pub trait Diffable: Clone {
    fn diff_id(&self) -> &str;

    /// Wire names of the fields that differ between `self` and `other`.
    fn changed_fields(&self, other: &Self, epsilon: f64) -> Vec<&'static str>;
}

fn strength_changed(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() > epsilon
}

impl Diffable for OntologyNode {
    fn diff_id(&self) -> &str {
        &self.id
    }

    fn changed_fields(&self, other: &Self, _epsilon: f64) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.label != other.label {
            fields.push("label");
        }
        if self.notes != other.notes {
            fields.push("notes");
        }
        fields
    }
}

impl Diffable for Relation {
    fn diff_id(&self) -> &str {
        &self.id
    }

    fn changed_fields(&self, other: &Self, epsilon: f64) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.from != other.from {
            fields.push("from");
        }
        if self.to != other.to {
            fields.push("to");
        }
        if self.kind != other.kind {
            fields.push("type");
        }
        if strength_changed(self.strength, other.strength, epsilon) {
            fields.push("strength");
        }
        if self.notes != other.notes {
            fields.push("notes");
        }
        fields
    }
}

impl Diffable for MetaRelation {
    fn diff_id(&self) -> &str {
        &self.id
    }

    fn changed_fields(&self, other: &Self, epsilon: f64) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.from_edge_id != other.from_edge_id {
            fields.push("fromEdgeId");
        }
        if self.to_edge_id != other.to_edge_id {
            fields.push("toEdgeId");
        }
        if self.kind != other.kind {
            fields.push("type");
        }
        if strength_changed(self.strength, other.strength, epsilon) {
            fields.push("strength");
        }
        if self.notes != other.notes {
            fields.push("notes");
        }
        fields
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangedEntry<T> {
    pub id: String,
    pub before: T,
    pub after: T,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsDelta {
    /// Right minus left.
    pub env_count_delta: i64,
    pub multi_parent_delta: i64,
    pub antisymmetry_delta: i64,
    pub left_has_cycle: bool,
    pub right_has_cycle: bool,
    pub cycle_changed: bool,
}

impl DiagnosticsDelta {
    pub fn between(left: &PosetDiagnostics, right: &PosetDiagnostics) -> Self {
        let delta = |l: usize, r: usize| r as i64 - l as i64;
        DiagnosticsDelta {
            env_count_delta: delta(left.env_count, right.env_count),
            multi_parent_delta: delta(left.multi_parent_count, right.multi_parent_count),
            antisymmetry_delta: delta(
                left.antisym_violations.len(),
                right.antisym_violations.len(),
            ),
            left_has_cycle: left.has_cycle,
            right_has_cycle: right.has_cycle,
            cycle_changed: left.has_cycle != right.has_cycle,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.env_count_delta == 0
            && self.multi_parent_delta == 0
            && self.antisymmetry_delta == 0
            && !self.cycle_changed
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDiff {
    pub added_nodes: Vec<OntologyNode>,
    pub removed_nodes: Vec<OntologyNode>,
    pub changed_nodes: Vec<ChangedEntry<OntologyNode>>,
    pub added_edges: Vec<Relation>,
    pub removed_edges: Vec<Relation>,
    pub changed_edges: Vec<ChangedEntry<Relation>>,
    pub added_meta_edges: Vec<MetaRelation>,
    pub removed_meta_edges: Vec<MetaRelation>,
    pub changed_meta_edges: Vec<ChangedEntry<MetaRelation>>,
    pub diagnostics: DiagnosticsDelta,
}

impl SnapshotDiff {
    /// No structural change and no diagnostics movement.
    pub fn is_empty(&self) -> bool {
        self.added_nodes.is_empty()
            && self.removed_nodes.is_empty()
            && self.changed_nodes.is_empty()
            && self.added_edges.is_empty()
            && self.removed_edges.is_empty()
            && self.changed_edges.is_empty()
            && self.added_meta_edges.is_empty()
            && self.removed_meta_edges.is_empty()
            && self.changed_meta_edges.is_empty()
            && self.diagnostics.is_zero()
    }

    pub fn change_count(&self) -> usize {
        self.added_nodes.len()
            + self.removed_nodes.len()
            + self.changed_nodes.len()
            + self.added_edges.len()
            + self.removed_edges.len()
            + self.changed_edges.len()
            + self.added_meta_edges.len()
            + self.removed_meta_edges.len()
            + self.changed_meta_edges.len()
    }
}

struct Partition<T> {
    added: Vec<T>,
    removed: Vec<T>,
    changed: Vec<ChangedEntry<T>>,
}

/// Keys each item by its id and how many earlier items share that id. Repeated ids pair up in
/// order.
fn occurrence_keys<T: Diffable>(items: &[T]) -> Vec<(&str, usize)> {
    let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
    items
        .iter()
        .map(|item| {
            let count = seen.entry(item.diff_id()).or_insert(0);
            let key = (item.diff_id(), *count);
            *count += 1;
            key
        })
        .collect()
}

/// Added entries follow right order, removed entries follow left order, changed entries follow
/// right order.
fn partition<T: Diffable>(left: &[T], right: &[T], epsilon: f64) -> Partition<T> {
    let left_keys = occurrence_keys(left);
    let right_keys = occurrence_keys(right);
    let left_index: BTreeMap<(&str, usize), &T> =
        left_keys.iter().copied().zip(left.iter()).collect();
    let right_index: BTreeMap<(&str, usize), &T> =
        right_keys.iter().copied().zip(right.iter()).collect();

    let mut added = Vec::new();
    let mut changed = Vec::new();
    for (key, after) in right_keys.iter().zip(right) {
        match left_index.get(key) {
            None => added.push(after.clone()),
            Some(before) => {
                let fields = before.changed_fields(after, epsilon);
                if !fields.is_empty() {
                    changed.push(ChangedEntry {
                        id: after.diff_id().to_string(),
                        before: (*before).clone(),
                        after: after.clone(),
                        fields: fields.into_iter().map(str::to_string).collect(),
                    });
                }
            }
        }
    }

    let removed = left_keys
        .iter()
        .zip(left)
        .filter(|(key, _)| !right_index.contains_key(*key))
        .map(|(_, before)| before.clone())
        .collect();

    Partition {
        added,
        removed,
        changed,
    }
}

pub fn compute_snapshot_diff(left: &OntologyDataset, right: &OntologyDataset) -> SnapshotDiff {
    compute_snapshot_diff_with_epsilon(left, right, DEFAULT_STRENGTH_EPSILON)
}

pub fn compute_snapshot_diff_with_epsilon(
    left: &OntologyDataset,
    right: &OntologyDataset,
    epsilon: f64,
) -> SnapshotDiff {
    let nodes = partition(&left.nodes, &right.nodes, epsilon);
    let edges = partition(&left.edges, &right.edges, epsilon);
    let metas = partition(&left.meta_edges, &right.meta_edges, epsilon);

    SnapshotDiff {
        added_nodes: nodes.added,
        removed_nodes: nodes.removed,
        changed_nodes: nodes.changed,
        added_edges: edges.added,
        removed_edges: edges.removed,
        changed_edges: edges.changed,
        added_meta_edges: metas.added,
        removed_meta_edges: metas.removed,
        changed_meta_edges: metas.changed,
        diagnostics: DiagnosticsDelta::between(
            &compute_poset_diagnostics(left),
            &compute_poset_diagnostics(right),
        ),
    }
}
