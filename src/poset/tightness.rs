use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, collections::BTreeSet};

use super::graph::EnvelopGraph;
use crate::properties::{NodeId, OntologyDataset, RelationId};

/// How well one `envelops` relation's child subtree holds its relations in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeTightness {
    pub env_id: RelationId,
    pub parent_id: NodeId,
    pub child_id: NodeId,
    pub parent_label: String,
    pub child_label: String,
    /// Relations (any type) with both endpoints inside the envelope.
    pub internal: usize,
    /// Relations with exactly one endpoint inside.
    pub boundary: usize,
    /// `internal / (internal + boundary)`, 1 for an envelope no relation touches.
    pub tightness: f64,
}

/// Tightness of every `envelops` relation, leakiest first. Ties keep dataset order.
pub fn compute_envelope_tightness(dataset: &OntologyDataset) -> Vec<EnvelopeTightness> {
    let graph = EnvelopGraph::from_dataset(dataset);

    let mut result: Vec<EnvelopeTightness> = graph
        .as_graph()
        .edge_indices()
        .map(|idx| {
            let edge = graph.relation(idx);
            let mut inside: BTreeSet<&str> = graph.descendants(&edge.to);
            inside.insert(edge.to.as_str());

            let (mut internal, mut boundary) = (0, 0);
            for relation in &dataset.edges {
                match (
                    inside.contains(relation.from.as_str()),
                    inside.contains(relation.to.as_str()),
                ) {
                    (true, true) => internal += 1,
                    (true, false) | (false, true) => boundary += 1,
                    (false, false) => {}
                }
            }

            let total = internal + boundary;
            EnvelopeTightness {
                env_id: edge.id.clone(),
                parent_id: edge.from.clone(),
                child_id: edge.to.clone(),
                parent_label: dataset.node_label(&edge.from).to_string(),
                child_label: dataset.node_label(&edge.to).to_string(),
                internal,
                boundary,
                tightness: if total == 0 {
                    1.0
                } else {
                    internal as f64 / total as f64
                },
            }
        })
        .collect();

    result.sort_by(|a, b| {
        a.tightness
            .partial_cmp(&b.tightness)
            .unwrap_or(Ordering::Equal)
    });
    result
}
