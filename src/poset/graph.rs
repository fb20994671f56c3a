//! The `envelops` sub-graph of a dataset.
//!
//! - [`EnvelopGraph`]: petgraph view over the dataset's nodes (in dataset order) and its
//!   `envelops` relations. Relations whose endpoints are not both known nodes are left out.
//! - [`EnvelopMaps`]: parent/child adjacency lists plus the multi-parent node set.

use petgraph::{
    graph::{EdgeIndex, NodeIndex},
    visit::EdgeRef,
    Direction, Graph,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::properties::{NodeId, OntologyDataset, OntologyNode, Relation};

#[derive(Debug, Clone)]
pub struct EnvelopGraph<'a> {
    graph: Graph<&'a str, &'a Relation>,
    index: BTreeMap<&'a str, NodeIndex>,
}

impl<'a> EnvelopGraph<'a> {
    pub fn new(nodes: &'a [OntologyNode], edges: &'a [Relation]) -> Self {
        let mut graph = Graph::with_capacity(nodes.len(), edges.len());
        let mut index = BTreeMap::new();

        for node in nodes {
            let idx = graph.add_node(node.id.as_str());
            // Duplicate ids stay in the graph as isolated nodes; the first occurrence owns the id.
            index.entry(node.id.as_str()).or_insert(idx);
        }

        for edge in edges.iter().filter(|edge| edge.is_envelops()) {
            match (index.get(edge.from.as_str()), index.get(edge.to.as_str())) {
                (Some(&source), Some(&sink)) => {
                    graph.add_edge(source, sink, edge);
                }
                _ => {
                    tracing::trace!(
                        "[EnvelopGraph::new] skipping relation {} with unknown endpoint(s)",
                        edge.id
                    );
                }
            }
        }

        EnvelopGraph { graph, index }
    }

    pub fn from_dataset(dataset: &'a OntologyDataset) -> Self {
        Self::new(&dataset.nodes, &dataset.edges)
    }

    pub fn as_graph(&self) -> &Graph<&'a str, &'a Relation> {
        &self.graph
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub fn id_of(&self, idx: NodeIndex) -> &'a str {
        self.graph[idx]
    }

    pub fn relation(&self, edge: EdgeIndex) -> &'a Relation {
        self.graph[edge]
    }

    /// Successors in relation insertion order.
    pub fn successors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        // petgraph walks its adjacency lists newest-first
        let mut out: Vec<NodeIndex> = self.graph.neighbors_directed(idx, Direction::Outgoing).collect();
        out.reverse();
        out
    }

    /// Every node reachable from `id` through one or more `envelops` relations. `id` itself is only
    /// included when it sits on a cycle.
    pub fn descendants(&self, id: &str) -> BTreeSet<&'a str> {
        let mut out = BTreeSet::new();
        let Some(start) = self.index_of(id) else {
            return out;
        };
        let mut seen = BTreeSet::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            for next in self.graph.neighbors_directed(current, Direction::Outgoing) {
                if seen.insert(next) {
                    out.insert(self.graph[next]);
                    stack.push(next);
                }
            }
        }
        out
    }

    /// Breadth-first reachability from `from` to `to` ignoring the `excluded` relations.
    pub fn has_path_excluding(
        &self,
        from: NodeIndex,
        to: NodeIndex,
        excluded: &BTreeSet<EdgeIndex>,
    ) -> bool {
        let mut seen = BTreeSet::from([from]);
        let mut queue = VecDeque::from([from]);
        while let Some(current) = queue.pop_front() {
            for edge in self.graph.edges_directed(current, Direction::Outgoing) {
                if excluded.contains(&edge.id()) {
                    continue;
                }
                let next = edge.target();
                if next == to {
                    return true;
                }
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        false
    }

    /// `envelops` relations pointing back at their own source.
    pub fn self_loops(&self) -> Vec<&'a Relation> {
        self.graph
            .edge_indices()
            .filter_map(|edge| {
                let (source, sink) = self.graph.edge_endpoints(edge)?;
                (source == sink).then(|| self.graph[edge])
            })
            .collect()
    }
}

/// Parent and child lists restricted to `envelops` relations.
///
/// A node appears in `parents` once per incoming relation, so parallel relations from the same
/// parent count twice toward the multi-parent check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopMaps {
    pub parents: BTreeMap<NodeId, Vec<NodeId>>,
    pub children: BTreeMap<NodeId, Vec<NodeId>>,
    /// Nodes with more than one `envelops` parent, in dataset order.
    pub multi_parent_ids: Vec<NodeId>,
}

pub fn compute_envelop_maps(nodes: &[OntologyNode], edges: &[Relation]) -> EnvelopMaps {
    let mut parents: BTreeMap<NodeId, Vec<NodeId>> = nodes
        .iter()
        .map(|node| (node.id.clone(), Vec::new()))
        .collect();
    let mut children: BTreeMap<NodeId, Vec<NodeId>> = parents.clone();

    for edge in edges.iter().filter(|edge| edge.is_envelops()) {
        if !parents.contains_key(&edge.to) || !children.contains_key(&edge.from) {
            continue;
        }
        if let Some(list) = parents.get_mut(&edge.to) {
            list.push(edge.from.clone());
        }
        if let Some(list) = children.get_mut(&edge.from) {
            list.push(edge.to.clone());
        }
    }

    let multi_parent_ids = nodes
        .iter()
        .filter(|node| parents.get(&node.id).map(Vec::len).unwrap_or(0) > 1)
        .map(|node| node.id.clone())
        .collect();

    EnvelopMaps {
        parents,
        children,
        multi_parent_ids,
    }
}
