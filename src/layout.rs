//! Node placement for drawing a dataset.
//!
//! Two layouts share one output shape ([GraphLayout]):
//!
//! - [build_graph_layout]: columns by `envelops` depth, rows sorted by label.
//! - [build_force_layout]: Fruchterman–Reingold over every relation. Starting positions come from
//!   hashing node ids, so the same dataset always lays out the same way.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{
    cmp::Ordering,
    collections::BTreeMap,
    fmt::{Display, Formatter},
    str::FromStr,
};

use crate::{
    error::OntologyError,
    poset::EnvelopGraph,
    properties::{NodeId, OntologyDataset},
};

pub const NODE_WIDTH: f64 = 180.0;
pub const NODE_HEIGHT: f64 = 50.0;
pub const PAD_X: f64 = 44.0;
pub const PAD_Y: f64 = 34.0;
pub const COL_GAP: f64 = 290.0;
pub const ROW_GAP: f64 = 102.0;
pub const MIN_HEIGHT: f64 = 320.0;

const FORCE_ITERATIONS: usize = 240;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    #[default]
    Layered,
    Force,
}

impl LayoutMode {
    pub fn all() -> &'static [LayoutMode] {
        &[LayoutMode::Layered, LayoutMode::Force]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutMode::Layered => "layered",
            LayoutMode::Force => "force",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            LayoutMode::Layered => "Columns follow envelops depth; rows are sorted by label.",
            LayoutMode::Force => "Force-directed placement over all relations, stable across runs.",
        }
    }
}

impl Display for LayoutMode {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LayoutMode {
    type Err = OntologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LayoutMode::all()
            .iter()
            .find(|mode| mode.as_str() == s.trim())
            .copied()
            .ok_or_else(|| OntologyError::Command(format!("Unknown layout mode '{s}'")))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepthMap {
    pub depth: BTreeMap<NodeId, usize>,
    pub max_depth: usize,
}

/// Longest `envelops` path length reaching each node, from at most `nodes.len()` relaxation
/// rounds. On a cycle the rounds run out instead of diverging.
pub fn compute_depths(dataset: &OntologyDataset) -> DepthMap {
    let graph = EnvelopGraph::from_dataset(dataset);
    let mut depth = vec![0usize; graph.node_count()];

    for _ in 0..dataset.nodes.len() {
        let mut changed = false;
        for edge in graph.as_graph().raw_edges() {
            let next = depth[edge.source().index()] + 1;
            if next > depth[edge.target().index()] {
                depth[edge.target().index()] = next;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    let mut out = BTreeMap::new();
    for node in &dataset.nodes {
        let value = graph
            .index_of(&node.id)
            .map(|idx| depth[idx.index()])
            .unwrap_or(0);
        out.insert(node.id.clone(), value);
    }
    DepthMap {
        max_depth: out.values().copied().max().unwrap_or(0),
        depth: out,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodePosition {
    pub x: f64,
    pub y: f64,
    pub layer: usize,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphLayout {
    pub positions: BTreeMap<NodeId, NodePosition>,
    pub layers: Vec<Vec<NodeId>>,
    pub width: f64,
    pub height: f64,
    pub node_width: f64,
    pub node_height: f64,
}

impl GraphLayout {
    pub fn position(&self, id: &str) -> Option<&NodePosition> {
        self.positions.get(id)
    }
}

fn label_order(dataset: &OntologyDataset, a: &str, b: &str) -> Ordering {
    let (la, lb) = (dataset.node_label(a), dataset.node_label(b));
    la.to_lowercase()
        .cmp(&lb.to_lowercase())
        .then_with(|| la.cmp(lb))
}

fn depth_layers(dataset: &OntologyDataset, depths: &DepthMap) -> Vec<Vec<NodeId>> {
    let mut layers: Vec<Vec<NodeId>> = vec![Vec::new(); depths.max_depth + 1];
    for node in &dataset.nodes {
        let layer = depths.depth.get(&node.id).copied().unwrap_or(0);
        layers[layer.min(depths.max_depth)].push(node.id.clone());
    }
    for layer in layers.iter_mut() {
        layer.sort_by(|a, b| label_order(dataset, a, b));
    }
    layers
}

pub fn build_graph_layout(dataset: &OntologyDataset) -> GraphLayout {
    let depths = compute_depths(dataset);
    let layers = depth_layers(dataset, &depths);

    let mut positions = BTreeMap::new();
    for (layer_index, layer) in layers.iter().enumerate() {
        for (row_index, id) in layer.iter().enumerate() {
            positions.insert(
                id.clone(),
                NodePosition {
                    x: PAD_X + layer_index as f64 * COL_GAP,
                    y: PAD_Y + row_index as f64 * ROW_GAP,
                    layer: layer_index,
                    index: row_index,
                },
            );
        }
    }

    let max_rows = layers.iter().map(Vec::len).max().unwrap_or(0).max(1);
    let width = PAD_X * 2.0 + (layers.len() - 1) as f64 * COL_GAP + NODE_WIDTH;
    let height = (PAD_Y * 2.0 + (max_rows - 1) as f64 * ROW_GAP + NODE_HEIGHT).max(MIN_HEIGHT);

    GraphLayout {
        positions,
        layers,
        width,
        height,
        node_width: NODE_WIDTH,
        node_height: NODE_HEIGHT,
    }
}

/// Two values in `[0, 1)` derived from the id's digest.
fn seed_point(id: &str) -> (f64, f64) {
    let digest = Sha256::digest(id.as_bytes());
    let mut x_bytes = [0u8; 8];
    let mut y_bytes = [0u8; 8];
    x_bytes.copy_from_slice(&digest[0..8]);
    y_bytes.copy_from_slice(&digest[8..16]);
    let unit = |bytes: [u8; 8]| (u64::from_le_bytes(bytes) >> 11) as f64 / (1u64 << 53) as f64;
    (unit(x_bytes), unit(y_bytes))
}

pub fn build_force_layout(dataset: &OntologyDataset) -> GraphLayout {
    let depths = compute_depths(dataset);
    let layers = depth_layers(dataset, &depths);

    // One slot per distinct id, in dataset order.
    let mut ids: Vec<&str> = Vec::new();
    let mut slot: BTreeMap<&str, usize> = BTreeMap::new();
    for node in &dataset.nodes {
        slot.entry(node.id.as_str()).or_insert_with(|| {
            ids.push(node.id.as_str());
            ids.len() - 1
        });
    }
    let count = ids.len();

    let side = (count.max(1) as f64).sqrt().ceil();
    let width = (PAD_X * 2.0 + side * (NODE_WIDTH + 80.0)).max(640.0);
    let height = (PAD_Y * 2.0 + side * (NODE_HEIGHT + 90.0)).max(MIN_HEIGHT);
    let (min_x, max_x) = (PAD_X, width - PAD_X - NODE_WIDTH);
    let (min_y, max_y) = (PAD_Y, height - PAD_Y - NODE_HEIGHT);

    let mut pos: Vec<(f64, f64)> = ids
        .iter()
        .map(|id| {
            let (u, v) = seed_point(id);
            (min_x + u * (max_x - min_x), min_y + v * (max_y - min_y))
        })
        .collect();

    let springs: Vec<(usize, usize, f64)> = dataset
        .edges
        .iter()
        .filter_map(|edge| {
            let a = *slot.get(edge.from.as_str())?;
            let b = *slot.get(edge.to.as_str())?;
            (a != b).then_some((a, b, 0.5 + edge.strength))
        })
        .collect();

    let k = ((width * height) / count.max(1) as f64).sqrt() * 0.6;
    let mut temperature = width / 10.0;
    let cooling = temperature / (FORCE_ITERATIONS as f64 + 1.0);

    for _ in 0..FORCE_ITERATIONS {
        let mut disp = vec![(0.0f64, 0.0f64); count];

        for i in 0..count {
            for j in (i + 1)..count {
                let (mut dx, mut dy) = (pos[i].0 - pos[j].0, pos[i].1 - pos[j].1);
                let mut dist = (dx * dx + dy * dy).sqrt();
                if dist < 0.01 {
                    // Coincident points: push apart along a fixed diagonal.
                    dx = 0.01 * (i as f64 + 1.0);
                    dy = 0.01 * (j as f64 + 1.0);
                    dist = (dx * dx + dy * dy).sqrt();
                }
                let force = k * k / dist;
                let (fx, fy) = (dx / dist * force, dy / dist * force);
                disp[i].0 += fx;
                disp[i].1 += fy;
                disp[j].0 -= fx;
                disp[j].1 -= fy;
            }
        }

        for &(a, b, weight) in &springs {
            let (dx, dy) = (pos[a].0 - pos[b].0, pos[a].1 - pos[b].1);
            let dist = (dx * dx + dy * dy).sqrt().max(0.01);
            let force = dist * dist / k * weight;
            let (fx, fy) = (dx / dist * force, dy / dist * force);
            disp[a].0 -= fx;
            disp[a].1 -= fy;
            disp[b].0 += fx;
            disp[b].1 += fy;
        }

        for (p, d) in pos.iter_mut().zip(&disp) {
            let length = (d.0 * d.0 + d.1 * d.1).sqrt();
            if length > 0.0 {
                let step = length.min(temperature);
                p.0 = (p.0 + d.0 / length * step).clamp(min_x, max_x);
                p.1 = (p.1 + d.1 / length * step).clamp(min_y, max_y);
            }
        }
        temperature -= cooling;
    }

    let positions = ids
        .iter()
        .enumerate()
        .map(|(index, id)| {
            let (x, y) = pos[index];
            (
                id.to_string(),
                NodePosition {
                    x: x.round(),
                    y: y.round(),
                    layer: depths.depth.get(*id).copied().unwrap_or(0),
                    index,
                },
            )
        })
        .collect();

    GraphLayout {
        positions,
        layers,
        width,
        height,
        node_width: NODE_WIDTH,
        node_height: NODE_HEIGHT,
    }
}

pub fn build_layout(dataset: &OntologyDataset, mode: LayoutMode) -> GraphLayout {
    match mode {
        LayoutMode::Layered => build_graph_layout(dataset),
        LayoutMode::Force => build_force_layout(dataset),
    }
}
