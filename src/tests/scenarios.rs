//! Small hand-built datasets with known answers

use super::helpers::*;
use crate::{
    poset::{
        compute_rule_checks, compute_transitive_closure_pairs,
        compute_transitive_reduction_edges, validate_dataset_for_mode, OntologyMode, RuleId,
    },
    presets::PRESETS,
    properties::OntologyDataset,
    repair::{apply_repair_suggestion, suggest_repairs, RepairAction, DEFAULT_MAX_REPAIRS},
    session::{OntologySession, SnapshotRef},
};
use test_log::test;

#[test]
fn test_chain_implies_one_pair() {
    let chain = create_chain();
    let pairs = compute_transitive_closure_pairs(&chain);
    assert_eq!(pairs.len(), 1);
    assert_eq!((pairs[0].from.as_str(), pairs[0].to.as_str()), ("a", "c"));
    assert_eq!((pairs[0].from_label.as_str(), pairs[0].to_label.as_str()), ("A", "C"));

    let mut with_shortcut = chain.clone();
    with_shortcut.edges.push(envelops("e_ac", "a", "c", 0.1));
    assert!(compute_transitive_closure_pairs(&with_shortcut).is_empty());
    let kept: Vec<String> = compute_transitive_reduction_edges(&with_shortcut)
        .into_iter()
        .map(|edge| edge.id)
        .collect();
    assert_eq!(kept, vec!["e_ab", "e_bc"]);
}

#[test]
fn test_two_cycle_fails_antisymmetry() {
    let dataset = create_two_cycle();
    let result = compute_rule_checks(&dataset);
    assert!(!result.is_valid);
    assert!(!result.check(RuleId::Antisymmetry).unwrap().ok);
    assert!(!result.check(RuleId::Acyclic).unwrap().ok);
    assert!(result.check(RuleId::NoSelfLoop).unwrap().ok);

    assert!(!validate_dataset_for_mode(&dataset, OntologyMode::StrictPoset).allowed);
    let soft = validate_dataset_for_mode(&dataset, OntologyMode::SoftPoset);
    assert!(soft.allowed);
    assert_eq!(soft.notices, result.blocking_issues);
}

#[test]
fn test_self_loop_has_single_removal_repair() {
    init_logging();
    let dataset = OntologyDataset::new(
        vec![node("a")],
        vec![envelops("e_aa", "a", "a", 0.5)],
        vec![],
    );
    let result = compute_rule_checks(&dataset);
    assert!(result.diagnostics.has_cycle);

    let suggestions = suggest_repairs(&dataset, DEFAULT_MAX_REPAIRS);
    let removal = suggestions
        .iter()
        .find(|suggestion| {
            suggestion.actions
                == vec![RepairAction::RemoveEdge {
                    edge_id: "e_aa".to_string(),
                }]
        })
        .expect("self-loop removal");
    assert!(compute_rule_checks(&apply_repair_suggestion(&dataset, removal)).is_valid);
}

#[test]
fn test_broken_presets_are_repairable() {
    init_logging();
    for key in ["cyclic-cosmology", "mutual-containment", "software-layers"] {
        let preset = PRESETS.require(key).unwrap();
        let mut dataset = preset.data.clone();
        assert!(!compute_rule_checks(&dataset).is_valid, "{key} should start invalid");

        // Always taking the cheapest suggestion has to terminate in a valid dataset.
        for _ in 0..dataset.edges.len() {
            let Some(first) = suggest_repairs(&dataset, 1).into_iter().next() else {
                break;
            };
            dataset = apply_repair_suggestion(&dataset, &first);
        }
        assert!(compute_rule_checks(&dataset).is_valid, "{key} did not converge");
    }
}

#[test]
fn test_philosophy_presets_start_valid() {
    init_logging();
    for key in ["science-stack", "aristotle-categories", "kant-transcendental"] {
        let preset = PRESETS.require(key).unwrap();
        assert!(compute_rule_checks(&preset.data).is_valid, "{key}");
    }
}

#[test]
fn test_session_repair_round_trip() {
    init_logging();
    let mut session = OntologySession::new(create_two_cycle());
    let before = session.save_snapshot("broken").unwrap();
    session.set_mode(OntologyMode::StrictPoset).unwrap();

    let repair_id = session.repair_suggestions()[0].id.clone();
    session.apply_repair(&repair_id).unwrap();
    assert!(session.validation().allowed);

    let diff = session.diff(&SnapshotRef::Snapshot(before), &SnapshotRef::Current);
    assert_eq!(diff.removed_edges.len(), 1);
    assert_eq!(diff.removed_edges[0].id, "e_ba");
    assert!(diff.diagnostics.cycle_changed);
    assert_eq!(diff.diagnostics.antisymmetry_delta, -1);
}
