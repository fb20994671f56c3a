//! Dataset module: indexing, JSON exchange and pure edit operations.
//!
//! # Module Organization
//!
//! - [`import`]: validating JSON import and pretty export
//! - [`edit`]: "old dataset in, new dataset out" edit operations with cascading deletes
//!
//! Nothing in here mutates its input. Every edit clones the dataset it is given and returns the
//! new value, leaving ownership of "the current dataset" to the caller (see
//! [`crate::session::OntologySession`]).

mod edit;
mod import;

use std::collections::BTreeMap;

use crate::properties::{MetaRelation, OntologyDataset, OntologyNode, Relation};

pub use edit::{
    add_meta_relation, add_node, add_relation, patch_meta_relation, patch_node, patch_relation,
    remove_meta_relation, remove_node, remove_relation, MetaRelationPatch, NodePatch,
    RelationPatch,
};
pub(crate) use edit::without_edges;
pub use import::{parse_dataset_from_json, parse_dataset_value, to_json_pretty};

pub fn index_nodes(nodes: &[OntologyNode]) -> BTreeMap<&str, &OntologyNode> {
    nodes.iter().map(|node| (node.id.as_str(), node)).collect()
}

pub fn index_edges(edges: &[Relation]) -> BTreeMap<&str, &Relation> {
    edges.iter().map(|edge| (edge.id.as_str(), edge)).collect()
}

pub fn index_meta_edges(meta_edges: &[MetaRelation]) -> BTreeMap<&str, &MetaRelation> {
    meta_edges.iter().map(|meta| (meta.id.as_str(), meta)).collect()
}

impl OntologyDataset {
    pub fn node(&self, id: &str) -> Option<&OntologyNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&Relation> {
        self.edges.iter().find(|edge| edge.id == id)
    }

    pub fn meta_edge(&self, id: &str) -> Option<&MetaRelation> {
        self.meta_edges.iter().find(|meta| meta.id == id)
    }

    /// Label of the node with `id`, falling back to the id itself for unknown nodes.
    pub fn node_label<'a>(&'a self, id: &'a str) -> &'a str {
        self.node(id).map(|node| node.label.as_str()).unwrap_or(id)
    }

    pub fn envelops_edges(&self) -> impl Iterator<Item = &Relation> {
        self.edges.iter().filter(|edge| edge.is_envelops())
    }

    /// Summary line used in logs and CLI output.
    pub fn display_counts(&self) -> String {
        format!(
            "{} nodes, {} relations ({} envelops), {} meta-relations",
            self.nodes.len(),
            self.edges.len(),
            self.envelops_edges().count(),
            self.meta_edges.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::RelationType;
    use test_log::test;

    #[test]
    fn test_index_and_label_fallback() {
        let dataset = OntologyDataset::new(
            vec![OntologyNode::new("a", "Alpha")],
            vec![
                Relation::new("e1", "a", "ghost", RelationType::Envelops, 0.4),
                Relation::new("e2", "a", "a", RelationType::Causes, 0.4),
            ],
            vec![],
        );
        assert_eq!(index_nodes(&dataset.nodes)["a"].label, "Alpha");
        assert_eq!(index_edges(&dataset.edges).len(), 2);
        assert_eq!(dataset.node_label("a"), "Alpha");
        assert_eq!(dataset.node_label("ghost"), "ghost");
        assert_eq!(dataset.envelops_edges().count(), 1);
        assert_eq!(
            dataset.display_counts(),
            "1 nodes, 2 relations (1 envelops), 0 meta-relations"
        );
    }
}
