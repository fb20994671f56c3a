//! Session workflows: configured modes, the event stream and snapshot diffs.

mod common;

use common::{init_logging, write_file, SMALL_DATASET};
use ontoposet::{
    config::{AnalysisConfig, ConfigProvider, TomlConfigProvider},
    dataset::{parse_dataset_from_json, RelationPatch},
    event::OntologyEvent,
    poset::OntologyMode,
    properties::RelationType,
    session::{OntologySession, SnapshotRef},
    OntologyError,
};
use std::sync::mpsc::channel;
use tempfile::TempDir;
use test_log::test;

fn small_session() -> OntologySession {
    init_logging();
    OntologySession::new(parse_dataset_from_json(SMALL_DATASET).unwrap())
}

#[test]
fn test_config_file_drives_session() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_file(
        &temp_dir,
        "ontoposet.toml",
        "mode = \"strict_poset\"\nmax_repairs = 1\nstrength_epsilon = 0.25\n",
    );
    let config = TomlConfigProvider::new(path).get_config().unwrap();
    assert_eq!(config.mode, OntologyMode::StrictPoset);

    let mut session = small_session().with_config(&config);
    assert_eq!(session.mode(), OntologyMode::StrictPoset);

    // mid already has root as parent
    let err = session
        .add_relation("leaf", "mid", RelationType::Envelops, 0.5, None)
        .unwrap_err();
    assert!(matches!(err, OntologyError::ModeBlocked { .. }));
    assert!(err.is_user_error());

    // Non-envelops relations never touch the poset rules.
    session
        .add_relation("leaf", "mid", RelationType::Causes, 0.5, None)
        .unwrap();
    assert_eq!(session.dataset().edges.len(), 4);
}

#[test]
fn test_event_stream() {
    let (tx, rx) = channel();
    let mut session = small_session().with_events(tx);

    let id = session.add_node("Extra", None).unwrap();
    session.set_mode(OntologyMode::StrictPoset).unwrap();
    let blocked = session.add_relation("leaf", "mid", RelationType::Envelops, 0.5, None);
    assert!(blocked.is_err());
    session.remove_node(&id).unwrap();
    let snapshot = session.save_snapshot("").unwrap();
    session.delete_snapshot(&snapshot).unwrap();
    session.load_preset("science-stack").unwrap();

    let events: Vec<OntologyEvent> = rx.try_iter().collect();
    let names: Vec<String> = events.iter().map(ToString::to_string).collect();
    assert_eq!(
        names,
        vec![
            "DatasetCommitted",
            "ModeChanged",
            "EditBlocked",
            "DatasetCommitted",
            "SnapshotSaved",
            "SnapshotDeleted",
            "PresetLoaded",
        ]
    );
    assert_eq!(
        events.iter().filter(|event| event.changes_dataset()).count(),
        3
    );
    match &events[4] {
        OntologyEvent::SnapshotSaved(_, name) => assert_eq!(name, "Snapshot 1"),
        other => panic!("unexpected event {other}"),
    }
}

#[test]
fn test_self_relation_is_a_command_error() {
    let mut session = small_session();
    let err = session
        .add_relation("root", "root", RelationType::Envelops, 0.5, None)
        .unwrap_err();
    assert!(matches!(err, OntologyError::Command(_)));
}

#[test]
fn test_diff_respects_configured_epsilon() {
    let mut session = small_session().with_config(&AnalysisConfig {
        strength_epsilon: 0.05,
        ..Default::default()
    });
    let before = session.save_snapshot("before").unwrap();

    session
        .patch_relation(
            "e1",
            &RelationPatch {
                strength: Some(0.92),
                ..Default::default()
            },
        )
        .unwrap();
    let small_change = session.diff(&SnapshotRef::Snapshot(before.clone()), &SnapshotRef::Current);
    assert!(small_change.is_empty());

    session
        .patch_relation(
            "e1",
            &RelationPatch {
                kind: Some(RelationType::Grounds),
                ..Default::default()
            },
        )
        .unwrap();
    let diff = session.diff(&SnapshotRef::Snapshot(before), &SnapshotRef::Current);
    assert_eq!(diff.changed_edges.len(), 1);
    assert_eq!(diff.changed_edges[0].fields, vec!["type".to_string()]);
    assert_eq!(diff.diagnostics.env_count_delta, -1);
}

#[test]
fn test_remove_relation_cascades_to_meta_relations() {
    let mut session = small_session();
    session.remove_relation("e3").unwrap();
    assert!(session.dataset().meta_edges.is_empty());
    assert!(matches!(
        session.remove_relation("e3"),
        Err(OntologyError::NotFound(_))
    ));
}
