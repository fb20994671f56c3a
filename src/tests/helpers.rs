//! Shared fixtures for the crate-level tests

use crate::properties::{
    MetaRelation, MetaRelationType, OntologyDataset, OntologyNode, Relation, RelationType,
};

/// Initialize logging for tests
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

pub fn node(id: &str) -> OntologyNode {
    OntologyNode::new(id, id.to_uppercase())
}

pub fn envelops(id: &str, from: &str, to: &str, strength: f64) -> Relation {
    Relation::new(id, from, to, RelationType::Envelops, strength)
}

/// `a → b → c`, all `envelops`.
pub fn create_chain() -> OntologyDataset {
    init_logging();
    OntologyDataset::new(
        vec![node("a"), node("b"), node("c")],
        vec![envelops("e_ab", "a", "b", 0.9), envelops("e_bc", "b", "c", 0.8)],
        vec![],
    )
}

/// `a ⇄ b`, both `envelops`.
pub fn create_two_cycle() -> OntologyDataset {
    init_logging();
    OntologyDataset::new(
        vec![node("a"), node("b")],
        vec![envelops("e_ab", "a", "b", 0.9), envelops("e_ba", "b", "a", 0.3)],
        vec![],
    )
}

/// Deterministic xorshift generator so property sweeps are reproducible.
pub struct Rng(u64);

impl Rng {
    pub fn new(seed: u64) -> Self {
        Rng(seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1)
    }

    pub fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }

    pub fn below(&mut self, bound: usize) -> usize {
        (self.next() % bound as u64) as usize
    }

    pub fn unit(&mut self) -> f64 {
        (self.next() % 1000) as f64 / 1000.0
    }
}

/// A random dataset of up to `max_nodes` nodes. Roughly two thirds of the relations are
/// `envelops`; self-loops, parallel relations and cycles all occur. Some relations point at a
/// missing node, some ids repeat, and meta-relations may reference missing relations.
pub fn random_dataset(rng: &mut Rng, max_nodes: usize) -> OntologyDataset {
    let node_count = 1 + rng.below(max_nodes);
    let mut nodes: Vec<OntologyNode> = (0..node_count).map(|i| node(&format!("n{i}"))).collect();
    if rng.below(6) == 0 {
        let id = format!("n{}", rng.below(node_count));
        nodes.push(OntologyNode::new(id, "Twin"));
    }

    let endpoint = |rng: &mut Rng| -> String {
        if rng.below(12) == 0 {
            "ghost".to_string()
        } else {
            format!("n{}", rng.below(node_count))
        }
    };
    let edge_count = rng.below(node_count * 2 + 1);
    let kinds = RelationType::all();
    let mut edges: Vec<Relation> = Vec::with_capacity(edge_count);
    for i in 0..edge_count {
        let id = if !edges.is_empty() && rng.below(8) == 0 {
            edges[rng.below(edges.len())].id.clone()
        } else {
            format!("e{i}")
        };
        let from = endpoint(rng);
        let to = endpoint(rng);
        let kind = if rng.below(3) < 2 {
            RelationType::Envelops
        } else {
            kinds[rng.below(kinds.len())]
        };
        edges.push(Relation::new(id, from, to, kind, rng.unit()));
    }

    let meta_kinds = MetaRelationType::all();
    let meta_count = if edges.is_empty() { 0 } else { rng.below(edges.len() + 1) };
    let meta_edges = (0..meta_count)
        .map(|i| {
            let from = edges[rng.below(edges.len())].id.clone();
            let to = if rng.below(10) == 0 {
                "e_ghost".to_string()
            } else {
                edges[rng.below(edges.len())].id.clone()
            };
            MetaRelation::new(
                format!("m{}", i % 3),
                from,
                to,
                meta_kinds[rng.below(meta_kinds.len())],
                rng.unit(),
            )
        })
        .collect();
    OntologyDataset::new(nodes, edges, meta_edges)
}

/// Calls `check` on a fixed sweep of random datasets.
pub fn for_random_datasets(mut check: impl FnMut(&OntologyDataset)) {
    init_logging();
    for seed in 1..=200 {
        let mut rng = Rng::new(seed);
        let dataset = random_dataset(&mut rng, 9);
        check(&dataset);
    }
}
