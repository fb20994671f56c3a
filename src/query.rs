use enumset::EnumSet;
use serde::{Deserialize, Serialize};

use crate::properties::{clamp01, OntologyDataset, Relation, RelationType};

/// Which relations a view shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewFilters {
    pub show_only_envelops: bool,
    /// Relations weaker than this are hidden.
    pub min_strength: f64,
    pub types: EnumSet<RelationType>,
}

impl Default for ViewFilters {
    fn default() -> Self {
        ViewFilters {
            show_only_envelops: false,
            min_strength: 0.0,
            types: EnumSet::all(),
        }
    }
}

impl ViewFilters {
    pub fn envelops_only() -> Self {
        ViewFilters {
            show_only_envelops: true,
            ..Default::default()
        }
    }

    pub fn with_min_strength(mut self, min_strength: f64) -> Self {
        self.min_strength = clamp01(min_strength);
        self
    }

    pub fn with_types(mut self, types: EnumSet<RelationType>) -> Self {
        self.types = types;
        self
    }

    pub fn matches(&self, edge: &Relation) -> bool {
        if self.show_only_envelops && !edge.is_envelops() {
            return false;
        }
        self.types.contains(edge.kind) && edge.strength >= self.min_strength
    }
}

pub fn filter_visible_edges(edges: &[Relation], filters: &ViewFilters) -> Vec<Relation> {
    edges
        .iter()
        .filter(|edge| filters.matches(edge))
        .cloned()
        .collect()
}

/// The dataset with only the visible relations. Meta-relations are left untouched.
pub fn filter_dataset(dataset: &OntologyDataset, filters: &ViewFilters) -> OntologyDataset {
    OntologyDataset {
        nodes: dataset.nodes.clone(),
        edges: filter_visible_edges(&dataset.edges, filters),
        meta_edges: dataset.meta_edges.clone(),
    }
}
