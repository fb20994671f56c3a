//! Cycle detection over `envelops` relations.
//!
//! Depth-first search with an explicit stack, so adversarially deep chains cannot exhaust the
//! call stack. A self-loop and a longer cycle are reported the same way.

use petgraph::graph::NodeIndex;

use super::graph::EnvelopGraph;
use crate::properties::{NodeId, OntologyNode, Relation};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

impl<'a> EnvelopGraph<'a> {
    /// Node ids of the first cycle found, closed (first id repeated at the end), or `None` when the
    /// `envelops` graph is acyclic. Roots are tried in dataset order.
    pub fn find_cycle(&self) -> Option<Vec<&'a str>> {
        let graph = self.as_graph();
        let mut marks = vec![Mark::Unvisited; graph.node_count()];

        for root in graph.node_indices() {
            if marks[root.index()] != Mark::Unvisited {
                continue;
            }

            // (node, successors, next successor position)
            let mut stack: Vec<(NodeIndex, Vec<NodeIndex>, usize)> = Vec::new();
            marks[root.index()] = Mark::OnStack;
            stack.push((root, self.successors(root), 0));

            while let Some((node, successors, pos)) = stack.last_mut() {
                let Some(&next) = successors.get(*pos) else {
                    marks[node.index()] = Mark::Done;
                    stack.pop();
                    continue;
                };
                *pos += 1;

                match marks[next.index()] {
                    Mark::OnStack => {
                        let start = stack
                            .iter()
                            .position(|(idx, _, _)| *idx == next)
                            .unwrap_or(0);
                        let mut path: Vec<&'a str> = stack[start..]
                            .iter()
                            .map(|(idx, _, _)| self.id_of(*idx))
                            .collect();
                        path.push(self.id_of(next));
                        return Some(path);
                    }
                    Mark::Unvisited => {
                        marks[next.index()] = Mark::OnStack;
                        let successors = self.successors(next);
                        stack.push((next, successors, 0));
                    }
                    Mark::Done => {}
                }
            }
        }

        None
    }
}

pub fn find_envelop_cycle(nodes: &[OntologyNode], edges: &[Relation]) -> Option<Vec<NodeId>> {
    EnvelopGraph::new(nodes, edges)
        .find_cycle()
        .map(|path| path.into_iter().map(str::to_string).collect())
}

pub fn detect_envelop_cycle(nodes: &[OntologyNode], edges: &[Relation]) -> bool {
    EnvelopGraph::new(nodes, edges).find_cycle().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::RelationType;
    use test_log::test;

    fn nodes(ids: &[&str]) -> Vec<OntologyNode> {
        ids.iter().map(|id| OntologyNode::new(*id, id.to_uppercase())).collect()
    }

    fn env(id: &str, from: &str, to: &str) -> Relation {
        Relation::new(id, from, to, RelationType::Envelops, 0.5)
    }

    #[test]
    fn test_acyclic_chain() {
        let nodes = nodes(&["a", "b", "c"]);
        let edges = vec![env("e1", "a", "b"), env("e2", "b", "c"), env("e3", "a", "c")];
        assert!(!detect_envelop_cycle(&nodes, &edges));
        assert_eq!(find_envelop_cycle(&nodes, &edges), None);
    }

    #[test]
    fn test_self_loop_is_a_cycle() {
        let nodes = nodes(&["a"]);
        let edges = vec![env("e1", "a", "a")];
        assert!(detect_envelop_cycle(&nodes, &edges));
        assert_eq!(
            find_envelop_cycle(&nodes, &edges),
            Some(vec!["a".to_string(), "a".to_string()])
        );
    }

    #[test]
    fn test_cycle_witness_path() {
        let nodes = nodes(&["x", "a", "b", "c"]);
        let edges = vec![
            env("e0", "x", "a"),
            env("e1", "a", "b"),
            env("e2", "b", "c"),
            env("e3", "c", "a"),
        ];
        let path = find_envelop_cycle(&nodes, &edges).unwrap();
        assert_eq!(path, vec!["a", "b", "c", "a"]);
    }

    #[test]
    fn test_non_envelops_cycles_are_ignored() {
        let nodes = nodes(&["a", "b"]);
        let edges = vec![
            env("e1", "a", "b"),
            Relation::new("e2", "b", "a", RelationType::Causes, 0.5),
        ];
        assert!(!detect_envelop_cycle(&nodes, &edges));
    }

    #[test]
    fn test_deep_chain_does_not_overflow() {
        let ids: Vec<String> = (0..20_000).map(|i| format!("n{i}")).collect();
        let nodes: Vec<OntologyNode> = ids.iter().map(|id| OntologyNode::new(id.clone(), id.clone())).collect();
        let mut edges: Vec<Relation> = ids
            .windows(2)
            .enumerate()
            .map(|(i, pair)| env(&format!("e{i}"), &pair[0], &pair[1]))
            .collect();
        assert!(!detect_envelop_cycle(&nodes, &edges));
        edges.push(env("back", "n19999", "n0"));
        assert!(detect_envelop_cycle(&nodes, &edges));
    }
}
