//! Pure edit operations.
//!
//! Each function takes the current dataset by reference and returns the edited copy. Deletions
//! cascade: removing a node removes its incident relations, and removing a relation removes every
//! meta-relation that references it.

use std::collections::BTreeSet;

use crate::{
    error::OntologyError,
    properties::{
        clamp01, clean_notes, next_node_id, uid, MetaRelation, MetaRelationType, NodeId,
        OntologyDataset, OntologyNode, Relation, RelationId, RelationType,
    },
};

/// Field updates for a node. `None` leaves the field untouched; `Some("")` clears notes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    pub label: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationPatch {
    pub kind: Option<RelationType>,
    pub strength: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaRelationPatch {
    pub kind: Option<MetaRelationType>,
    pub strength: Option<f64>,
    pub notes: Option<String>,
}

pub fn add_node(
    dataset: &OntologyDataset,
    label: &str,
    notes: Option<&str>,
) -> Result<(OntologyDataset, NodeId), OntologyError> {
    let label = label.trim();
    if label.is_empty() {
        return Err(OntologyError::Command(
            "Node label cannot be empty".to_string(),
        ));
    }

    let id = next_node_id(&dataset.nodes);
    let mut next = dataset.clone();
    next.nodes.push(OntologyNode {
        id: id.clone(),
        label: label.to_string(),
        notes: clean_notes(notes),
    });
    Ok((next, id))
}

pub fn add_relation(
    dataset: &OntologyDataset,
    from: &str,
    to: &str,
    kind: RelationType,
    strength: f64,
    notes: Option<&str>,
) -> Result<(OntologyDataset, RelationId), OntologyError> {
    if from.is_empty() || to.is_empty() {
        return Err(OntologyError::Command(
            "Relation endpoints cannot be empty".to_string(),
        ));
    }
    if from == to {
        return Err(OntologyError::Command(format!(
            "Relation endpoints must differ (got '{from}' twice)"
        )));
    }
    for endpoint in [from, to] {
        if dataset.node(endpoint).is_none() {
            return Err(OntologyError::NotFound(format!("node '{endpoint}'")));
        }
    }

    let id = uid("e");
    let mut next = dataset.clone();
    next.edges.push(Relation {
        id: id.clone(),
        from: from.to_string(),
        to: to.to_string(),
        kind,
        strength: clamp01(strength),
        notes: clean_notes(notes),
    });
    Ok((next, id))
}

pub fn add_meta_relation(
    dataset: &OntologyDataset,
    from_edge_id: &str,
    to_edge_id: &str,
    kind: MetaRelationType,
    strength: f64,
    notes: Option<&str>,
) -> Result<(OntologyDataset, RelationId), OntologyError> {
    if from_edge_id.is_empty() || to_edge_id.is_empty() {
        return Err(OntologyError::Command(
            "Meta-relation endpoints cannot be empty".to_string(),
        ));
    }
    if from_edge_id == to_edge_id {
        return Err(OntologyError::Command(format!(
            "Meta-relation endpoints must differ (got '{from_edge_id}' twice)"
        )));
    }
    for endpoint in [from_edge_id, to_edge_id] {
        if dataset.edge(endpoint).is_none() {
            return Err(OntologyError::NotFound(format!("relation '{endpoint}'")));
        }
    }

    let id = uid("m");
    let mut next = dataset.clone();
    next.meta_edges.push(MetaRelation {
        id: id.clone(),
        from_edge_id: from_edge_id.to_string(),
        to_edge_id: to_edge_id.to_string(),
        kind,
        strength: clamp01(strength),
        notes: clean_notes(notes),
    });
    Ok((next, id))
}

pub fn patch_node(
    dataset: &OntologyDataset,
    id: &str,
    patch: &NodePatch,
) -> Result<OntologyDataset, OntologyError> {
    let mut next = dataset.clone();
    let node = next
        .nodes
        .iter_mut()
        .find(|node| node.id == id)
        .ok_or_else(|| OntologyError::NotFound(format!("node '{id}'")))?;

    if let Some(label) = patch.label.as_ref() {
        let label = label.trim();
        if label.is_empty() {
            return Err(OntologyError::Command(
                "Node label cannot be empty".to_string(),
            ));
        }
        node.label = label.to_string();
    }
    if let Some(notes) = patch.notes.as_ref() {
        node.notes = clean_notes(Some(notes));
    }
    Ok(next)
}

pub fn patch_relation(
    dataset: &OntologyDataset,
    id: &str,
    patch: &RelationPatch,
) -> Result<OntologyDataset, OntologyError> {
    let mut next = dataset.clone();
    let edge = next
        .edges
        .iter_mut()
        .find(|edge| edge.id == id)
        .ok_or_else(|| OntologyError::NotFound(format!("relation '{id}'")))?;

    if let Some(kind) = patch.kind {
        edge.kind = kind;
    }
    if let Some(strength) = patch.strength {
        edge.strength = clamp01(strength);
    }
    if let Some(notes) = patch.notes.as_ref() {
        edge.notes = clean_notes(Some(notes));
    }
    Ok(next)
}

pub fn patch_meta_relation(
    dataset: &OntologyDataset,
    id: &str,
    patch: &MetaRelationPatch,
) -> Result<OntologyDataset, OntologyError> {
    let mut next = dataset.clone();
    let meta = next
        .meta_edges
        .iter_mut()
        .find(|meta| meta.id == id)
        .ok_or_else(|| OntologyError::NotFound(format!("meta-relation '{id}'")))?;

    if let Some(kind) = patch.kind {
        meta.kind = kind;
    }
    if let Some(strength) = patch.strength {
        meta.strength = clamp01(strength);
    }
    if let Some(notes) = patch.notes.as_ref() {
        meta.notes = clean_notes(Some(notes));
    }
    Ok(next)
}

pub fn remove_node(dataset: &OntologyDataset, id: &str) -> Result<OntologyDataset, OntologyError> {
    if dataset.node(id).is_none() {
        return Err(OntologyError::NotFound(format!("node '{id}'")));
    }

    let nodes = dataset
        .nodes
        .iter()
        .filter(|node| node.id != id)
        .cloned()
        .collect();
    let edges: Vec<Relation> = dataset
        .edges
        .iter()
        .filter(|edge| edge.from != id && edge.to != id)
        .cloned()
        .collect();
    let remaining: BTreeSet<&str> = edges.iter().map(|edge| edge.id.as_str()).collect();
    let meta_edges = dataset
        .meta_edges
        .iter()
        .filter(|meta| {
            remaining.contains(meta.from_edge_id.as_str())
                && remaining.contains(meta.to_edge_id.as_str())
        })
        .cloned()
        .collect();

    Ok(OntologyDataset {
        nodes,
        edges,
        meta_edges,
    })
}

pub fn remove_relation(
    dataset: &OntologyDataset,
    id: &str,
) -> Result<OntologyDataset, OntologyError> {
    if dataset.edge(id).is_none() {
        return Err(OntologyError::NotFound(format!("relation '{id}'")));
    }
    Ok(without_edges(dataset, &BTreeSet::from([id])))
}

pub fn remove_meta_relation(
    dataset: &OntologyDataset,
    id: &str,
) -> Result<OntologyDataset, OntologyError> {
    if dataset.meta_edge(id).is_none() {
        return Err(OntologyError::NotFound(format!("meta-relation '{id}'")));
    }
    let mut next = dataset.clone();
    next.meta_edges.retain(|meta| meta.id != id);
    Ok(next)
}

/// Drops the given relations and every meta-relation touching them.
pub(crate) fn without_edges(dataset: &OntologyDataset, removed: &BTreeSet<&str>) -> OntologyDataset {
    OntologyDataset {
        nodes: dataset.nodes.clone(),
        edges: dataset
            .edges
            .iter()
            .filter(|edge| !removed.contains(edge.id.as_str()))
            .cloned()
            .collect(),
        meta_edges: dataset
            .meta_edges
            .iter()
            .filter(|meta| {
                !removed.contains(meta.from_edge_id.as_str())
                    && !removed.contains(meta.to_edge_id.as_str())
            })
            .cloned()
            .collect(),
    }
}
