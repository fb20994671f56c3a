//! Reachability over `envelops` relations: the closure matrix, implied pairs and the transitive
//! reduction.

use petgraph::graph::EdgeIndex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::graph::EnvelopGraph;
use crate::properties::{NodeId, OntologyDataset, OntologyNode, Relation};

/// Dense reachability matrix indexed by dataset node order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReachMatrix {
    pub ids: Vec<NodeId>,
    reach: Vec<Vec<bool>>,
}

impl ReachMatrix {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Whether node `j` is reachable from node `i` through one or more `envelops` relations.
    pub fn reaches(&self, i: usize, j: usize) -> bool {
        self.reach
            .get(i)
            .and_then(|row| row.get(j))
            .copied()
            .unwrap_or(false)
    }

    pub fn mutually_reachable(&self, i: usize, j: usize) -> bool {
        self.reaches(i, j) && self.reaches(j, i)
    }
}

/// Floyd–Warshall closure of the `envelops` relation, O(V³).
pub fn transitive_closure(nodes: &[OntologyNode], edges: &[Relation]) -> ReachMatrix {
    let graph = EnvelopGraph::new(nodes, edges);
    let size = nodes.len();
    let mut reach = vec![vec![false; size]; size];

    for edge in graph.as_graph().raw_edges() {
        reach[edge.source().index()][edge.target().index()] = true;
    }

    for k in 0..size {
        for i in 0..size {
            if !reach[i][k] {
                continue;
            }
            for j in 0..size {
                if reach[k][j] {
                    reach[i][j] = true;
                }
            }
        }
    }

    ReachMatrix {
        ids: nodes.iter().map(|node| node.id.clone()).collect(),
        reach,
    }
}

/// A containment implied by transitivity but not stated by any relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpliedPair {
    pub from: NodeId,
    pub to: NodeId,
    pub from_label: String,
    pub to_label: String,
}

/// Pairs `(from, to)` of distinct nodes where `to` is reachable from `from` but no explicit
/// `envelops` relation `from -> to` exists. Ordered by source, then target, in dataset order.
pub fn compute_transitive_closure_pairs(dataset: &OntologyDataset) -> Vec<ImpliedPair> {
    let closure = transitive_closure(&dataset.nodes, &dataset.edges);
    let direct: BTreeSet<(&str, &str)> = dataset
        .envelops_edges()
        .map(|edge| (edge.from.as_str(), edge.to.as_str()))
        .collect();

    let mut out = Vec::new();
    for (i, from) in dataset.nodes.iter().enumerate() {
        for (j, to) in dataset.nodes.iter().enumerate() {
            if i == j || !closure.reaches(i, j) {
                continue;
            }
            if direct.contains(&(from.id.as_str(), to.id.as_str())) {
                continue;
            }
            out.push(ImpliedPair {
                from: from.id.clone(),
                to: to.id.clone(),
                from_label: from.label.clone(),
                to_label: to.label.clone(),
            });
        }
    }
    out
}

/// The essential `envelops` relations.
///
/// Relations are visited in dataset order. One is dropped when its target stays reachable from
/// its source without it and without anything dropped before it, so the survivors keep the
/// original closure. Self-loops always survive.
pub fn compute_transitive_reduction_edges(dataset: &OntologyDataset) -> Vec<Relation> {
    let graph = EnvelopGraph::from_dataset(dataset);
    let mut removed: BTreeSet<EdgeIndex> = BTreeSet::new();

    for edge_idx in graph.as_graph().edge_indices() {
        let Some((source, sink)) = graph.as_graph().edge_endpoints(edge_idx) else {
            continue;
        };
        if source == sink {
            continue;
        }
        removed.insert(edge_idx);
        if !graph.has_path_excluding(source, sink, &removed) {
            removed.remove(&edge_idx);
        }
    }

    let out: Vec<Relation> = graph
        .as_graph()
        .edge_indices()
        .filter(|idx| !removed.contains(idx))
        .map(|idx| graph.relation(idx).clone())
        .collect();
    tracing::debug!(
        "[compute_transitive_reduction_edges] kept {} of {} envelops relations",
        out.len(),
        graph.edge_count()
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::RelationType;
    use test_log::test;

    fn chain(with_shortcut: bool) -> OntologyDataset {
        let mut edges = vec![
            Relation::new("e1", "a", "b", RelationType::Envelops, 0.9),
            Relation::new("e2", "b", "c", RelationType::Envelops, 0.9),
            Relation::new("e3", "c", "a", RelationType::Causes, 0.9),
        ];
        if with_shortcut {
            edges.push(Relation::new("e4", "a", "c", RelationType::Envelops, 0.2));
        }
        OntologyDataset::new(
            vec![
                OntologyNode::new("a", "A"),
                OntologyNode::new("b", "B"),
                OntologyNode::new("c", "C"),
            ],
            edges,
            vec![],
        )
    }

    #[test]
    fn test_chain_implies_one_pair() {
        let pairs = compute_transitive_closure_pairs(&chain(false));
        assert_eq!(
            pairs,
            vec![ImpliedPair {
                from: "a".into(),
                to: "c".into(),
                from_label: "A".into(),
                to_label: "C".into(),
            }]
        );
        assert!(compute_transitive_closure_pairs(&chain(true)).is_empty());
    }

    #[test]
    fn test_reduction_drops_shortcut() {
        let kept: Vec<String> = compute_transitive_reduction_edges(&chain(true))
            .into_iter()
            .map(|edge| edge.id)
            .collect();
        assert_eq!(kept, vec!["e1", "e2"]);
    }

    #[test]
    fn test_reduction_keeps_self_loop_and_one_of_parallel_pair() {
        let dataset = OntologyDataset::new(
            vec![OntologyNode::new("a", "A"), OntologyNode::new("b", "B")],
            vec![
                Relation::new("e1", "a", "b", RelationType::Envelops, 0.5),
                Relation::new("e2", "a", "b", RelationType::Envelops, 0.5),
                Relation::new("e3", "b", "b", RelationType::Envelops, 0.5),
            ],
            vec![],
        );
        let kept: Vec<String> = compute_transitive_reduction_edges(&dataset)
            .into_iter()
            .map(|edge| edge.id)
            .collect();
        assert_eq!(kept, vec!["e2", "e3"]);
    }

    #[test]
    fn test_reduction_on_cycle_keeps_reachability() {
        let dataset = OntologyDataset::new(
            vec![OntologyNode::new("a", "A"), OntologyNode::new("b", "B")],
            vec![
                Relation::new("e1", "a", "b", RelationType::Envelops, 0.5),
                Relation::new("e2", "b", "a", RelationType::Envelops, 0.5),
            ],
            vec![],
        );
        let kept = compute_transitive_reduction_edges(&dataset);
        assert_eq!(kept.len(), 2);
        let closure = transitive_closure(&dataset.nodes, &kept);
        assert!(closure.mutually_reachable(0, 1));
        assert!(closure.reaches(0, 0));
    }

    #[test]
    fn test_closure_ignores_dangling_and_other_types() {
        let mut dataset = chain(false);
        dataset
            .edges
            .push(Relation::new("e9", "a", "ghost", RelationType::Envelops, 0.5));
        let closure = transitive_closure(&dataset.nodes, &dataset.edges);
        assert_eq!(closure.len(), 3);
        assert!(closure.reaches(0, 2));
        assert!(!closure.reaches(2, 0));
        assert!(!closure.reaches(0, 9));
    }
}
