//! Data model for ontology datasets.
//!
//! An [OntologyDataset] is the unit of mutation, export, import and diffing. It holds three flat
//! lists:
//!
//! - [OntologyNode]s: the entities of the ontology, identified by a string id.
//! - [Relation]s: typed, weighted edges between nodes. [RelationType::Envelops] is the only type
//!   read as a partial-order claim ("A envelops B" means B sits inside A).
//! - [MetaRelation]s: second-order edges between two relations ("this relation contradicts that
//!   relation").
//!
//! Field names serialize to the JSON exchange format (`metaEdges`, `fromEdgeId`, `type`, ...).

pub use enumset::EnumSet;

use enumset::*;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use crate::error::OntologyError;

pub type NodeId = String;
pub type RelationId = String;

/// Relation kinds understood by the diagnostics engine.
#[derive(Debug, Serialize, Deserialize, PartialOrd, Ord, Hash, EnumSetType)]
#[enumset(serialize_repr = "list")]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    /// Partial-order containment. The only kind the poset checks look at.
    Envelops,
    Grounds,
    DependsOn,
    Causes,
    Contrasts,
    IsAbout,
}

impl RelationType {
    pub fn all() -> &'static [RelationType] {
        &[
            RelationType::Envelops,
            RelationType::Grounds,
            RelationType::DependsOn,
            RelationType::Causes,
            RelationType::Contrasts,
            RelationType::IsAbout,
        ]
    }

    /// Wire name, as used in dataset JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::Envelops => "envelops",
            RelationType::Grounds => "grounds",
            RelationType::DependsOn => "depends_on",
            RelationType::Causes => "causes",
            RelationType::Contrasts => "contrasts",
            RelationType::IsAbout => "is_about",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            RelationType::DependsOn => "depends on",
            RelationType::IsAbout => "is about",
            other => other.as_str(),
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            RelationType::Envelops => "#84cc16",
            RelationType::Grounds => "#22d3ee",
            RelationType::DependsOn => "#a78bfa",
            RelationType::Causes => "#f59e0b",
            RelationType::Contrasts => "#f472b6",
            RelationType::IsAbout => "#cbd5e1",
        }
    }

    /// SVG dash pattern for the relation kind, if it is drawn dashed.
    pub fn dash(&self) -> Option<&'static str> {
        match self {
            RelationType::Contrasts => Some("7 5"),
            RelationType::IsAbout => Some("3 5"),
            _ => None,
        }
    }

    pub fn is_envelops(&self) -> bool {
        *self == RelationType::Envelops
    }
}

impl Display for RelationType {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RelationType {
    type Err = OntologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RelationType::all()
            .iter()
            .find(|kind| kind.as_str() == s)
            .copied()
            .ok_or_else(|| OntologyError::Command(format!("Unknown relation type '{s}'")))
    }
}

#[derive(Debug, Serialize, Deserialize, PartialOrd, Ord, Hash, EnumSetType)]
#[enumset(serialize_repr = "list")]
#[serde(rename_all = "snake_case")]
pub enum MetaRelationType {
    Supports,
    Refines,
    Contradicts,
    Explains,
}

impl MetaRelationType {
    pub fn all() -> &'static [MetaRelationType] {
        &[
            MetaRelationType::Supports,
            MetaRelationType::Refines,
            MetaRelationType::Contradicts,
            MetaRelationType::Explains,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MetaRelationType::Supports => "supports",
            MetaRelationType::Refines => "refines",
            MetaRelationType::Contradicts => "contradicts",
            MetaRelationType::Explains => "explains",
        }
    }

    pub fn label(&self) -> &'static str {
        self.as_str()
    }
}

impl Display for MetaRelationType {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MetaRelationType {
    type Err = OntologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetaRelationType::all()
            .iter()
            .find(|kind| kind.as_str() == s)
            .copied()
            .ok_or_else(|| OntologyError::Command(format!("Unknown meta-relation type '{s}'")))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OntologyNode {
    pub id: NodeId,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl OntologyNode {
    pub fn new(id: impl Into<NodeId>, label: impl Into<String>) -> Self {
        OntologyNode {
            id: id.into(),
            label: label.into(),
            notes: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub id: RelationId,
    pub from: NodeId,
    pub to: NodeId,
    #[serde(rename = "type")]
    pub kind: RelationType,
    pub strength: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Relation {
    pub fn new(
        id: impl Into<RelationId>,
        from: impl Into<NodeId>,
        to: impl Into<NodeId>,
        kind: RelationType,
        strength: f64,
    ) -> Self {
        Relation {
            id: id.into(),
            from: from.into(),
            to: to.into(),
            kind,
            strength: clamp01(strength),
            notes: None,
        }
    }

    pub fn is_envelops(&self) -> bool {
        self.kind.is_envelops()
    }

    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaRelation {
    pub id: RelationId,
    pub from_edge_id: RelationId,
    pub to_edge_id: RelationId,
    #[serde(rename = "type")]
    pub kind: MetaRelationType,
    pub strength: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl MetaRelation {
    pub fn new(
        id: impl Into<RelationId>,
        from_edge_id: impl Into<RelationId>,
        to_edge_id: impl Into<RelationId>,
        kind: MetaRelationType,
        strength: f64,
    ) -> Self {
        MetaRelation {
            id: id.into(),
            from_edge_id: from_edge_id.into(),
            to_edge_id: to_edge_id.into(),
            kind,
            strength: clamp01(strength),
            notes: None,
        }
    }

    pub fn references(&self, edge_id: &str) -> bool {
        self.from_edge_id == edge_id || self.to_edge_id == edge_id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OntologyDataset {
    pub nodes: Vec<OntologyNode>,
    pub edges: Vec<Relation>,
    pub meta_edges: Vec<MetaRelation>,
}

impl OntologyDataset {
    pub fn new(
        nodes: Vec<OntologyNode>,
        edges: Vec<Relation>,
        meta_edges: Vec<MetaRelation>,
    ) -> Self {
        OntologyDataset {
            nodes,
            edges,
            meta_edges,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty() && self.meta_edges.is_empty()
    }
}

pub fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Percentage with one decimal place, e.g. `0.4567` -> `"45.7%"`.
pub fn format_percent(value: f64) -> String {
    let pct = (clamp01(value) * 1000.0).round() / 10.0;
    format!("{pct}%")
}

/// Random identifier of the form `{prefix}_{hex}`.
pub fn uid(prefix: &str) -> String {
    format!("{}_{}", prefix, uuid::Uuid::new_v4().simple())
}

static SEQUENTIAL_NODE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^n(\d+)$").unwrap());

/// Next free sequential node id (`n1`, `n2`, ...). Ids that don't follow the `n<digits>` pattern
/// are ignored.
pub fn next_node_id(nodes: &[OntologyNode]) -> NodeId {
    let max_seen = nodes
        .iter()
        .filter_map(|node| SEQUENTIAL_NODE_ID.captures(&node.id))
        .filter_map(|caps| caps.get(1).and_then(|m| m.as_str().parse::<u64>().ok()))
        .max()
        .unwrap_or(0);
    format!("n{}", max_seen + 1)
}

/// Trimmed notes, or `None` when nothing but whitespace is left.
pub fn clean_notes(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
        .map(str::to_string)
}
