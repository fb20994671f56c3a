//! Plain-text rendering for the CLI.

use ontoposet::{
    diff::{ChangedEntry, SnapshotDiff},
    layout::GraphLayout,
    poset::{EnvelopeTightness, ImpliedPair, ModeValidation},
    presets::OntologyPreset,
    properties::{format_percent, OntologyDataset, Relation},
    repair::{RepairAction, RepairSuggestion},
    OntologyError,
};
use serde::Serialize;
use std::sync::Arc;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), OntologyError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_presets(presets: &[Arc<OntologyPreset>]) {
    println!("\n=== Presets ===");
    for preset in presets {
        println!("{:<24} {}", preset.key, preset.name);
        println!("{:<24} {}", "", preset.data.display_counts());
        if !preset.description.is_empty() {
            println!("{:<24} {}", "", preset.description);
        }
    }
}

pub fn print_validation(validation: &ModeValidation) {
    let result = &validation.rule_check;
    println!("\n=== Rule Checks ({}) ===", validation.mode.label());
    for check in &result.checks {
        let mark = if check.ok { "ok  " } else { "FAIL" };
        println!("[{mark}] {:<28} {}", check.label, check.detail);
    }

    let diagnostics = &result.diagnostics;
    println!("\nEnvelops relations: {}", diagnostics.env_count);
    println!("Multi-parent nodes: {}", diagnostics.multi_parent_count);
    println!("Cycle: {}", if diagnostics.has_cycle { "yes" } else { "no" });
    println!(
        "Antisymmetry violations: {}",
        diagnostics.antisym_violations.len()
    );

    if validation.allowed {
        for notice in &validation.notices {
            println!("Notice: {notice}");
        }
        println!("\nAllowed under {}.", validation.mode);
    } else {
        println!("\nBlocked under {}.", validation.mode);
    }
}

pub fn print_implied_pairs(pairs: &[ImpliedPair]) {
    println!("\n=== Implied Containments ({}) ===", pairs.len());
    for pair in pairs {
        println!("{} ⊇ {}", pair.from_label, pair.to_label);
    }
}

fn arrow(dataset: &OntologyDataset, edge: &Relation) -> String {
    format!(
        "{} → {}",
        dataset.node_label(&edge.from),
        dataset.node_label(&edge.to)
    )
}

pub fn print_reduction(dataset: &OntologyDataset, kept: &[Relation], redundant: usize) {
    println!(
        "\n=== Transitive Reduction ({} kept, {} redundant) ===",
        kept.len(),
        redundant
    );
    for edge in kept {
        println!("{:<12} {}", edge.id, arrow(dataset, edge));
    }
}

pub fn print_tightness(rows: &[EnvelopeTightness]) {
    println!("\n=== Envelope Tightness ===");
    println!("{:<8} {:>8} {:>8}  envelope", "tight", "internal", "boundary");
    for row in rows {
        println!(
            "{:<8} {:>8} {:>8}  {} ⊇ {}",
            format_percent(row.tightness),
            row.internal,
            row.boundary,
            row.parent_label,
            row.child_label
        );
    }
}

pub fn print_repairs(suggestions: &[RepairSuggestion]) {
    if suggestions.is_empty() {
        println!("No repairs needed.");
        return;
    }
    println!("\n=== Repair Suggestions ===");
    for (i, suggestion) in suggestions.iter().enumerate() {
        println!("{}. {} [{}]", i + 1, suggestion.title, suggestion.id);
        println!("   {}", suggestion.reason);
        println!("   {}", suggestion.estimated_impact);
        for action in &suggestion.actions {
            match action {
                RepairAction::RemoveEdge { edge_id } => println!("   - remove {edge_id}"),
                RepairAction::SetEdgeType { edge_id, edge_type } => {
                    println!("   - set {edge_id} type to {}", edge_type.as_str())
                }
                RepairAction::SetEdgeStrength { edge_id, strength } => {
                    println!("   - set {edge_id} strength to {}", format_percent(*strength))
                }
            }
        }
    }
}

fn print_changed<T>(heading: &str, entries: &[ChangedEntry<T>]) {
    for entry in entries {
        println!("~ {heading} {} ({})", entry.id, entry.fields.join(", "));
    }
}

pub fn print_diff(diff: &SnapshotDiff) {
    println!("\n=== Snapshot Diff ({} changes) ===", diff.change_count());
    for node in &diff.added_nodes {
        println!("+ node {} ({})", node.id, node.label);
    }
    for node in &diff.removed_nodes {
        println!("- node {} ({})", node.id, node.label);
    }
    print_changed("node", &diff.changed_nodes);
    for edge in &diff.added_edges {
        println!("+ relation {} {} → {} [{}]", edge.id, edge.from, edge.to, edge.kind.as_str());
    }
    for edge in &diff.removed_edges {
        println!("- relation {} {} → {} [{}]", edge.id, edge.from, edge.to, edge.kind.as_str());
    }
    print_changed("relation", &diff.changed_edges);
    for meta in &diff.added_meta_edges {
        println!("+ meta-relation {}", meta.id);
    }
    for meta in &diff.removed_meta_edges {
        println!("- meta-relation {}", meta.id);
    }
    print_changed("meta-relation", &diff.changed_meta_edges);

    let delta = &diff.diagnostics;
    println!(
        "\nEnvelops {:+}, multi-parent {:+}, antisymmetry {:+}, cycle {} → {}",
        delta.env_count_delta,
        delta.multi_parent_delta,
        delta.antisymmetry_delta,
        delta.left_has_cycle,
        delta.right_has_cycle
    );
}

pub fn print_layout(dataset: &OntologyDataset, layout: &GraphLayout) {
    println!(
        "\n=== Layout ({:.0} x {:.0}) ===",
        layout.width, layout.height
    );
    for (id, position) in &layout.positions {
        println!(
            "{:<24} layer {:>2}  ({:>7.1}, {:>7.1})",
            dataset.node_label(id),
            position.layer,
            position.x,
            position.y
        );
    }
}
