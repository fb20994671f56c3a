//! JSON import with explicit, field-by-field validation.
//!
//! Imports are all-or-nothing: the first violation aborts with
//! [`OntologyError::InvalidDataset`] carrying a message that names the offending index, field or
//! id. Strengths outside `[0, 1]` are clamped rather than rejected.

use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::{
    error::OntologyError,
    properties::{
        clamp01, MetaRelation, MetaRelationType, OntologyDataset, OntologyNode, Relation,
        RelationType,
    },
};

type JsonObject = Map<String, Value>;

pub fn parse_dataset_from_json(json_text: &str) -> Result<OntologyDataset, OntologyError> {
    let value: Value = serde_json::from_str(json_text).map_err(|e| {
        tracing::debug!("Dataset import rejected, JSON syntax error: {e}");
        OntologyError::invalid("Invalid JSON.")
    })?;
    parse_dataset_value(&value)
}

pub fn parse_dataset_value(value: &Value) -> Result<OntologyDataset, OntologyError> {
    let result = validate_root(value);
    match &result {
        Ok(dataset) => tracing::debug!("Dataset import accepted: {}", dataset.display_counts()),
        Err(e) => tracing::debug!("Dataset import rejected: {e}"),
    }
    result
}

pub fn to_json_pretty(dataset: &OntologyDataset) -> Result<String, OntologyError> {
    Ok(serde_json::to_string_pretty(dataset)?)
}

fn validate_root(value: &Value) -> Result<OntologyDataset, OntologyError> {
    let root = value
        .as_object()
        .ok_or_else(|| OntologyError::invalid("JSON root must be an object."))?;

    let (raw_nodes, raw_edges, raw_meta) = match (
        root.get("nodes").and_then(Value::as_array),
        root.get("edges").and_then(Value::as_array),
        root.get("metaEdges").and_then(Value::as_array),
    ) {
        (Some(nodes), Some(edges), Some(meta)) => (nodes, edges, meta),
        _ => {
            return Err(OntologyError::invalid(
                "JSON must include arrays: nodes, edges, and metaEdges.",
            ))
        }
    };

    let nodes = raw_nodes
        .iter()
        .enumerate()
        .map(|(index, entry)| parse_node(index, entry))
        .collect::<Result<Vec<_>, _>>()?;

    let mut node_ids = BTreeSet::new();
    for node in nodes.iter() {
        if !node_ids.insert(node.id.as_str()) {
            return Err(OntologyError::invalid(format!(
                "Duplicate node id: {}",
                node.id
            )));
        }
    }

    let edges = raw_edges
        .iter()
        .enumerate()
        .map(|(index, entry)| parse_edge(index, entry))
        .collect::<Result<Vec<_>, _>>()?;

    let mut edge_ids = BTreeSet::new();
    for edge in edges.iter() {
        if !edge_ids.insert(edge.id.as_str()) {
            return Err(OntologyError::invalid(format!(
                "Duplicate edge id: {}",
                edge.id
            )));
        }
        if !node_ids.contains(edge.from.as_str()) || !node_ids.contains(edge.to.as_str()) {
            return Err(OntologyError::invalid(format!(
                "Edge {} references missing node ids.",
                edge.id
            )));
        }
    }

    let meta_edges = raw_meta
        .iter()
        .enumerate()
        .map(|(index, entry)| parse_meta_edge(index, entry))
        .collect::<Result<Vec<_>, _>>()?;

    let mut meta_ids = BTreeSet::new();
    for meta in meta_edges.iter() {
        if !meta_ids.insert(meta.id.as_str()) {
            return Err(OntologyError::invalid(format!(
                "Duplicate meta-edge id: {}",
                meta.id
            )));
        }
        if !edge_ids.contains(meta.from_edge_id.as_str())
            || !edge_ids.contains(meta.to_edge_id.as_str())
        {
            return Err(OntologyError::invalid(format!(
                "Meta-edge {} references missing edge ids.",
                meta.id
            )));
        }
    }

    Ok(OntologyDataset {
        nodes,
        edges,
        meta_edges,
    })
}

fn as_record<'a>(entry: &'a Value, what: &str, index: usize) -> Result<&'a JsonObject, OntologyError> {
    entry
        .as_object()
        .ok_or_else(|| OntologyError::invalid(format!("{what} at index {index} must be an object.")))
}

/// Non-empty (after trimming) string field. The untrimmed value is returned.
fn non_empty_string<'a>(record: &'a JsonObject, field: &str) -> Option<&'a str> {
    record
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// Non-string or blank notes are dropped instead of rejected.
fn optional_notes(record: &JsonObject) -> Option<String> {
    record
        .get("notes")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_strength(record: &JsonObject, what: &str, index: usize) -> Result<f64, OntologyError> {
    record
        .get("strength")
        .and_then(Value::as_f64)
        .filter(|s| !s.is_nan())
        .map(clamp01)
        .ok_or_else(|| {
            OntologyError::invalid(format!("{what} at index {index} has an invalid strength."))
        })
}

fn parse_node(index: usize, entry: &Value) -> Result<OntologyNode, OntologyError> {
    let record = as_record(entry, "Node", index)?;
    let id = non_empty_string(record, "id")
        .ok_or_else(|| OntologyError::invalid(format!("Node at index {index} has an invalid id.")))?;
    let label = non_empty_string(record, "label").ok_or_else(|| {
        OntologyError::invalid(format!("Node at index {index} has an invalid label."))
    })?;

    Ok(OntologyNode {
        id: id.to_string(),
        label: label.trim().to_string(),
        notes: optional_notes(record),
    })
}

fn parse_edge(index: usize, entry: &Value) -> Result<Relation, OntologyError> {
    let record = as_record(entry, "Edge", index)?;
    let id = non_empty_string(record, "id")
        .ok_or_else(|| OntologyError::invalid(format!("Edge at index {index} has an invalid id.")))?;

    let (from, to) = match (
        record.get("from").and_then(Value::as_str),
        record.get("to").and_then(Value::as_str),
    ) {
        (Some(from), Some(to)) => (from, to),
        _ => {
            return Err(OntologyError::invalid(format!(
                "Edge at index {index} must have string endpoints."
            )))
        }
    };

    let kind = record
        .get("type")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<RelationType>().ok())
        .ok_or_else(|| {
            OntologyError::invalid(format!("Edge at index {index} has an invalid type."))
        })?;

    let strength = parse_strength(record, "Edge", index)?;

    Ok(Relation {
        id: id.to_string(),
        from: from.to_string(),
        to: to.to_string(),
        kind,
        strength,
        notes: optional_notes(record),
    })
}

fn parse_meta_edge(index: usize, entry: &Value) -> Result<MetaRelation, OntologyError> {
    let record = as_record(entry, "Meta-edge", index)?;
    let id = non_empty_string(record, "id").ok_or_else(|| {
        OntologyError::invalid(format!("Meta-edge at index {index} has an invalid id."))
    })?;

    let (from_edge_id, to_edge_id) = match (
        record.get("fromEdgeId").and_then(Value::as_str),
        record.get("toEdgeId").and_then(Value::as_str),
    ) {
        (Some(from), Some(to)) => (from, to),
        _ => {
            return Err(OntologyError::invalid(format!(
                "Meta-edge at index {index} must have string edge references."
            )))
        }
    };

    let kind = record
        .get("type")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<MetaRelationType>().ok())
        .ok_or_else(|| {
            OntologyError::invalid(format!("Meta-edge at index {index} has an invalid type."))
        })?;

    let strength = parse_strength(record, "Meta-edge", index)?;

    Ok(MetaRelation {
        id: id.to_string(),
        from_edge_id: from_edge_id.to_string(),
        to_edge_id: to_edge_id.to_string(),
        kind,
        strength,
        notes: optional_notes(record),
    })
}
