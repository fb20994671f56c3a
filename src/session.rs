//! The owner of "the current dataset".
//!
//! Everything else in the crate is a pure function over datasets. [OntologySession] is the one
//! place that holds state: the current dataset, the active [OntologyMode], and a list of saved
//! snapshots. Every edit builds a candidate dataset with the pure edit functions, then
//! [OntologySession::commit]s it; in `strict_poset` mode a candidate that fails the rule checks
//! is refused and the session is left exactly as it was.

use serde::{Deserialize, Serialize};
use std::{
    sync::mpsc::Sender,
    time::{SystemTime, UNIX_EPOCH},
};

use crate::{
    config::AnalysisConfig,
    dataset::{
        self, parse_dataset_from_json, to_json_pretty, MetaRelationPatch, NodePatch,
        RelationPatch,
    },
    diff::{compute_snapshot_diff_with_epsilon, SnapshotDiff, DEFAULT_STRENGTH_EPSILON},
    error::OntologyError,
    event::OntologyEvent,
    poset::{compute_rule_checks, validate_dataset_for_mode, ModeValidation, OntologyMode, RuleCheckResult},
    presets::PRESETS,
    query::{filter_dataset, ViewFilters},
    properties::{uid, MetaRelationType, NodeId, OntologyDataset, RelationId, RelationType},
    repair::{apply_repair_suggestion, suggest_repairs, RepairSuggestion, DEFAULT_MAX_REPAIRS},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotRecord {
    pub id: String,
    pub name: String,
    /// Seconds since the Unix epoch.
    pub created_at: u64,
    pub dataset: OntologyDataset,
}

/// One side of a snapshot diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapshotRef {
    Current,
    Snapshot(String),
}

pub struct OntologySession {
    dataset: OntologyDataset,
    mode: OntologyMode,
    preset_key: Option<String>,
    snapshots: Vec<SnapshotRecord>,
    max_repairs: usize,
    strength_epsilon: f64,
    filters: ViewFilters,
    tx: Option<Sender<OntologyEvent>>,
}

impl OntologySession {
    pub fn new(dataset: OntologyDataset) -> Self {
        OntologySession {
            dataset,
            mode: OntologyMode::default(),
            preset_key: None,
            snapshots: Vec::new(),
            max_repairs: DEFAULT_MAX_REPAIRS,
            strength_epsilon: DEFAULT_STRENGTH_EPSILON,
            filters: ViewFilters::default(),
            tx: None,
        }
    }

    /// A session holding a copy of the registered preset `key`.
    pub fn from_preset(key: &str) -> Result<Self, OntologyError> {
        let preset = PRESETS.require(key)?;
        let mut session = OntologySession::new(preset.data.clone());
        session.preset_key = Some(preset.key.clone());
        Ok(session)
    }

    /// Applies the mode, repair limit, diff epsilon and view filters from `config`.
    pub fn with_config(mut self, config: &AnalysisConfig) -> Self {
        self.mode = config.mode;
        self.max_repairs = config.max_repairs;
        self.strength_epsilon = config.strength_epsilon;
        self.filters = config.filters.clone();
        self
    }

    pub fn with_events(mut self, tx: Sender<OntologyEvent>) -> Self {
        self.tx = Some(tx);
        self
    }

    pub fn dataset(&self) -> &OntologyDataset {
        &self.dataset
    }

    pub fn mode(&self) -> OntologyMode {
        self.mode
    }

    pub fn preset_key(&self) -> Option<&str> {
        self.preset_key.as_deref()
    }

    pub fn filters(&self) -> &ViewFilters {
        &self.filters
    }

    /// Changes which relations [OntologySession::visible_dataset] keeps. Analyses and edits
    /// always see the full dataset.
    pub fn set_filters(&mut self, filters: ViewFilters) {
        self.filters = filters;
    }

    /// The current dataset reduced to the relations the view filters show.
    pub fn visible_dataset(&self) -> OntologyDataset {
        filter_dataset(&self.dataset, &self.filters)
    }

    /// Saved snapshots, newest first.
    pub fn snapshots(&self) -> &[SnapshotRecord] {
        &self.snapshots
    }

    /// Sends `event` to the subscriber, if any. A closed channel is logged and otherwise
    /// ignored: the state change that produced the event has already happened.
    fn emit(&self, event: OntologyEvent) {
        if let Some(tx) = self.tx.as_ref() {
            if let Err(err) = tx.send(event) {
                tracing::warn!("[OntologySession::emit] {}", OntologyError::from(err));
            }
        }
    }

    /// Replaces the current dataset with `candidate` if the active mode allows it.
    ///
    /// `action` names the edit ("adding node", "import", ...) in events and in the
    /// [OntologyError::ModeBlocked] refusal.
    pub fn commit(
        &mut self,
        candidate: OntologyDataset,
        action: &str,
    ) -> Result<ModeValidation, OntologyError> {
        let validation = validate_dataset_for_mode(&candidate, self.mode);
        if !validation.allowed {
            let issues = validation.rule_check.blocking_issues.clone();
            tracing::info!(
                "[OntologySession::commit] strict poset blocked {action}: {}",
                issues.join(" ")
            );
            self.emit(OntologyEvent::EditBlocked(action.to_string(), issues.clone()));
            return Err(OntologyError::ModeBlocked {
                context: format!("Strict poset blocked {action}."),
                issues,
            });
        }

        self.dataset = candidate;
        tracing::debug!(
            "[OntologySession::commit] {action}: {}",
            self.dataset.display_counts()
        );
        self.emit(OntologyEvent::DatasetCommitted(
            action.to_string(),
            self.dataset.display_counts(),
        ));
        Ok(validation)
    }

    /// Switches mode. The dataset is never touched; when switching into `strict_poset` with a
    /// dataset that already breaks the rules, the returned warning lists what is wrong.
    pub fn set_mode(&mut self, mode: OntologyMode) -> Result<Option<String>, OntologyError> {
        let previous = self.mode;
        self.mode = mode;
        let validation = validate_dataset_for_mode(&self.dataset, mode);
        let warning = (!validation.allowed).then(|| {
            format!(
                "Strict poset active: {}",
                validation.rule_check.blocking_issues.join(" ")
            )
        });
        self.emit(OntologyEvent::ModeChanged(
            previous,
            mode,
            validation.rule_check.blocking_issues,
        ));
        Ok(warning)
    }

    pub fn validation(&self) -> ModeValidation {
        validate_dataset_for_mode(&self.dataset, self.mode)
    }

    pub fn rule_check(&self) -> RuleCheckResult {
        compute_rule_checks(&self.dataset)
    }

    pub fn repair_suggestions(&self) -> Vec<RepairSuggestion> {
        suggest_repairs(&self.dataset, self.max_repairs)
    }

    pub fn add_node(&mut self, label: &str, notes: Option<&str>) -> Result<NodeId, OntologyError> {
        let (next, id) = dataset::add_node(&self.dataset, label, notes)?;
        self.commit(next, "adding node")?;
        Ok(id)
    }

    pub fn add_relation(
        &mut self,
        from: &str,
        to: &str,
        kind: RelationType,
        strength: f64,
        notes: Option<&str>,
    ) -> Result<RelationId, OntologyError> {
        let (next, id) = dataset::add_relation(&self.dataset, from, to, kind, strength, notes)?;
        self.commit(next, "adding relation")?;
        Ok(id)
    }

    pub fn add_meta_relation(
        &mut self,
        from_edge_id: &str,
        to_edge_id: &str,
        kind: MetaRelationType,
        strength: f64,
        notes: Option<&str>,
    ) -> Result<RelationId, OntologyError> {
        let (next, id) = dataset::add_meta_relation(
            &self.dataset,
            from_edge_id,
            to_edge_id,
            kind,
            strength,
            notes,
        )?;
        self.commit(next, "adding meta-relation")?;
        Ok(id)
    }

    pub fn patch_node(&mut self, id: &str, patch: &NodePatch) -> Result<(), OntologyError> {
        let next = dataset::patch_node(&self.dataset, id, patch)?;
        self.commit(next, "node edit").map(|_| ())
    }

    pub fn patch_relation(&mut self, id: &str, patch: &RelationPatch) -> Result<(), OntologyError> {
        let next = dataset::patch_relation(&self.dataset, id, patch)?;
        self.commit(next, "relation edit").map(|_| ())
    }

    pub fn patch_meta_relation(
        &mut self,
        id: &str,
        patch: &MetaRelationPatch,
    ) -> Result<(), OntologyError> {
        let next = dataset::patch_meta_relation(&self.dataset, id, patch)?;
        self.commit(next, "meta-relation edit").map(|_| ())
    }

    pub fn remove_node(&mut self, id: &str) -> Result<(), OntologyError> {
        let next = dataset::remove_node(&self.dataset, id)?;
        self.commit(next, "deleting node").map(|_| ())
    }

    pub fn remove_relation(&mut self, id: &str) -> Result<(), OntologyError> {
        let next = dataset::remove_relation(&self.dataset, id)?;
        self.commit(next, "deleting relation").map(|_| ())
    }

    pub fn remove_meta_relation(&mut self, id: &str) -> Result<(), OntologyError> {
        let next = dataset::remove_meta_relation(&self.dataset, id)?;
        self.commit(next, "deleting meta-relation").map(|_| ())
    }

    /// Applies the current suggestion with the given id.
    pub fn apply_repair(&mut self, repair_id: &str) -> Result<RepairSuggestion, OntologyError> {
        let suggestion = self
            .repair_suggestions()
            .into_iter()
            .find(|suggestion| suggestion.id == repair_id)
            .ok_or_else(|| OntologyError::NotFound(format!("repair suggestion '{repair_id}'")))?;
        let next = apply_repair_suggestion(&self.dataset, &suggestion);
        self.commit(next, "repair application")?;
        Ok(suggestion)
    }

    /// Replaces the dataset with imported JSON. Malformed input fails with
    /// [OntologyError::InvalidDataset] and nothing is applied.
    pub fn import_json(&mut self, json_text: &str) -> Result<ModeValidation, OntologyError> {
        let candidate = parse_dataset_from_json(json_text)?;
        self.commit(candidate, "import")
    }

    pub fn export_json(&self) -> Result<String, OntologyError> {
        to_json_pretty(&self.dataset)
    }

    /// Loads a registered preset. Mode returns to `soft_poset` and snapshots are cleared.
    pub fn load_preset(&mut self, key: &str) -> Result<(), OntologyError> {
        let preset = PRESETS.require(key)?;
        self.dataset = preset.data.clone();
        self.preset_key = Some(preset.key.clone());
        self.mode = OntologyMode::SoftPoset;
        self.snapshots.clear();
        tracing::debug!(
            "[OntologySession::load_preset] {}: {}",
            preset.key,
            self.dataset.display_counts()
        );
        self.emit(OntologyEvent::PresetLoaded(preset.key.clone()));
        Ok(())
    }

    /// Loads the first registered preset.
    pub fn reset(&mut self) -> Result<(), OntologyError> {
        let key = PRESETS
            .default_preset()
            .map(|preset| preset.key.clone())
            .ok_or_else(|| OntologyError::NotFound("default preset".to_string()))?;
        self.load_preset(&key)
    }

    /// Saves a copy of the current dataset. A blank name becomes "Snapshot N".
    pub fn save_snapshot(&mut self, name: &str) -> Result<String, OntologyError> {
        let name = match name.trim() {
            "" => format!("Snapshot {}", self.snapshots.len() + 1),
            trimmed => trimmed.to_string(),
        };
        let record = SnapshotRecord {
            id: uid("snap"),
            name,
            created_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_secs())
                .unwrap_or_default(),
            dataset: self.dataset.clone(),
        };
        let id = record.id.clone();
        let event = OntologyEvent::SnapshotSaved(record.id.clone(), record.name.clone());
        self.snapshots.insert(0, record);
        self.emit(event);
        Ok(id)
    }

    pub fn delete_snapshot(&mut self, id: &str) -> Result<(), OntologyError> {
        let before = self.snapshots.len();
        self.snapshots.retain(|record| record.id != id);
        if self.snapshots.len() == before {
            return Err(OntologyError::NotFound(format!("snapshot '{id}'")));
        }
        self.emit(OntologyEvent::SnapshotDeleted(id.to_string()));
        Ok(())
    }

    pub fn snapshot(&self, id: &str) -> Option<&SnapshotRecord> {
        self.snapshots.iter().find(|record| record.id == id)
    }

    /// The dataset a reference points at. Unknown snapshot ids resolve to the current dataset.
    pub fn resolve(&self, side: &SnapshotRef) -> &OntologyDataset {
        match side {
            SnapshotRef::Current => &self.dataset,
            SnapshotRef::Snapshot(id) => self
                .snapshot(id)
                .map(|record| &record.dataset)
                .unwrap_or(&self.dataset),
        }
    }

    pub fn diff(&self, left: &SnapshotRef, right: &SnapshotRef) -> SnapshotDiff {
        compute_snapshot_diff_with_epsilon(
            self.resolve(left),
            self.resolve(right),
            self.strength_epsilon,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        layout::{build_layout, LayoutMode},
        properties::{OntologyNode, Relation},
    };
    use std::sync::mpsc::channel;
    use test_log::test;

    fn pair() -> OntologyDataset {
        OntologyDataset::new(
            vec![OntologyNode::new("a", "A"), OntologyNode::new("b", "B")],
            vec![Relation::new("e_ab", "a", "b", RelationType::Envelops, 0.8)],
            vec![],
        )
    }

    #[test]
    fn test_strict_mode_refuses_and_keeps_state() {
        let (tx, rx) = channel();
        let mut session = OntologySession::new(pair()).with_events(tx);
        assert_eq!(session.set_mode(OntologyMode::StrictPoset).unwrap(), None);

        let err = session
            .add_relation("b", "a", RelationType::Envelops, 0.4, None)
            .unwrap_err();
        assert!(err.to_string().starts_with("Strict poset blocked adding relation."));
        assert_eq!(session.dataset(), &pair());

        let events: Vec<OntologyEvent> = rx.try_iter().collect();
        assert!(matches!(events[0], OntologyEvent::ModeChanged(..)));
        assert!(matches!(events[1], OntologyEvent::EditBlocked(..)));
    }

    #[test]
    fn test_soft_mode_accepts_with_notices() {
        let mut session = OntologySession::new(pair());
        session
            .add_relation("b", "a", RelationType::Envelops, 0.4, None)
            .unwrap();
        assert_eq!(session.dataset().edges.len(), 2);
        assert!(!session.rule_check().is_valid);
        assert!(!session.validation().notices.is_empty());

        let warning = session.set_mode(OntologyMode::StrictPoset).unwrap();
        assert!(warning.unwrap().starts_with("Strict poset active: "));
        // Edits that don't fix the violation are now refused.
        assert!(session.add_node("C", None).is_err());
    }

    #[test]
    fn test_apply_repair_by_id() {
        let mut dataset = pair();
        dataset
            .edges
            .push(Relation::new("e_ba", "b", "a", RelationType::Envelops, 0.2));
        let mut session = OntologySession::new(dataset);
        session.set_mode(OntologyMode::StrictPoset).unwrap();

        let first = session.repair_suggestions()[0].clone();
        let applied = session.apply_repair(&first.id).unwrap();
        assert_eq!(applied.id, first.id);
        assert!(session.rule_check().is_valid);
        assert!(matches!(
            session.apply_repair("repair_nope"),
            Err(OntologyError::NotFound(_))
        ));
    }

    #[test]
    fn test_snapshots_and_diff() {
        let mut session = OntologySession::new(pair());
        let first = session.save_snapshot("  ").unwrap();
        session.add_node("C", Some("third")).unwrap();
        let second = session.save_snapshot("after C").unwrap();

        let names: Vec<&str> = session.snapshots().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["after C", "Snapshot 1"]);

        let diff = session.diff(
            &SnapshotRef::Snapshot(first.clone()),
            &SnapshotRef::Snapshot(second.clone()),
        );
        assert_eq!(diff.added_nodes.len(), 1);
        assert!(session
            .diff(&SnapshotRef::Current, &SnapshotRef::Snapshot("missing".into()))
            .is_empty());

        session.delete_snapshot(&first).unwrap();
        assert_eq!(session.snapshots().len(), 1);
        assert!(session.delete_snapshot(&first).is_err());
    }

    #[test]
    fn test_import_rejects_without_partial_apply() {
        let mut session = OntologySession::new(pair());
        let err = session
            .import_json(r#"{"nodes": [], "edges": []}"#)
            .unwrap_err();
        assert!(matches!(err, OntologyError::InvalidDataset(_)));
        assert_eq!(session.dataset(), &pair());

        let exported = session.export_json().unwrap();
        let mut other = OntologySession::new(OntologyDataset::default());
        other.import_json(&exported).unwrap();
        assert_eq!(other.dataset(), &pair());
    }

    #[test]
    fn test_load_preset_resets_mode_and_snapshots() {
        let mut session = OntologySession::new(pair());
        session.set_mode(OntologyMode::FreeGraph).unwrap();
        session.save_snapshot("x").unwrap();
        session.load_preset("kant-transcendental").unwrap();
        assert_eq!(session.mode(), OntologyMode::SoftPoset);
        assert!(session.snapshots().is_empty());
        assert_eq!(session.preset_key(), Some("kant-transcendental"));
        assert!(session.load_preset("unknown").is_err());

        session.reset().unwrap();
        assert_eq!(session.preset_key(), Some("science-stack"));
    }

    #[test]
    fn test_closed_event_channel_keeps_edits() {
        let (tx, rx) = channel();
        let mut session = OntologySession::new(pair()).with_events(tx);
        drop(rx);

        let id = session.add_node("X", None).unwrap();
        assert_eq!(session.dataset().node(&id).map(|n| n.label.as_str()), Some("X"));

        let snapshot = session.save_snapshot("after X").unwrap();
        assert_eq!(session.snapshots()[0].id, snapshot);
        session.set_mode(OntologyMode::StrictPoset).unwrap();
        assert!(session.add_node("", None).is_err());
        session.delete_snapshot(&snapshot).unwrap();
        assert!(session.snapshots().is_empty());
    }

    #[test]
    fn test_config_filters_shape_the_visible_dataset() {
        let config = AnalysisConfig {
            filters: ViewFilters::default().with_min_strength(0.9),
            ..Default::default()
        };
        let mut session = OntologySession::new(pair()).with_config(&config);
        assert!(session.visible_dataset().edges.is_empty());
        assert_eq!(session.visible_dataset().nodes.len(), 2);
        assert_eq!(session.dataset(), &pair());
        let layout = build_layout(&session.visible_dataset(), LayoutMode::Layered);
        assert_eq!(layout.layers, vec![vec!["a".to_string(), "b".to_string()]]);

        session.set_filters(ViewFilters::envelops_only());
        assert_eq!(session.visible_dataset().edges.len(), 1);
    }
}
