use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::poset::OntologyMode;

/// Notifications sent by an [OntologySession](crate::session::OntologySession) as its state
/// changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OntologyEvent {
    /// Edit context, dataset summary line
    DatasetCommitted(String, String),
    /// Edit context, blocking issues that refused it
    EditBlocked(String, Vec<String>),
    /// Previous mode, new mode, blocking issues of the current dataset under the new mode
    ModeChanged(OntologyMode, OntologyMode, Vec<String>),
    /// Preset key
    PresetLoaded(String),
    /// Snapshot id, snapshot name
    SnapshotSaved(String, String),
    SnapshotDeleted(String),
}

impl OntologyEvent {
    /// True for events after which the session's current dataset differs from before.
    pub fn changes_dataset(&self) -> bool {
        matches!(
            self,
            OntologyEvent::DatasetCommitted(_, _) | OntologyEvent::PresetLoaded(_)
        )
    }
}

impl Display for OntologyEvent {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            OntologyEvent::DatasetCommitted(_, _) => write!(f, "DatasetCommitted"),
            OntologyEvent::EditBlocked(_, _) => write!(f, "EditBlocked"),
            OntologyEvent::ModeChanged(_, _, _) => write!(f, "ModeChanged"),
            OntologyEvent::PresetLoaded(_) => write!(f, "PresetLoaded"),
            OntologyEvent::SnapshotSaved(_, _) => write!(f, "SnapshotSaved"),
            OntologyEvent::SnapshotDeleted(_) => write!(f, "SnapshotDeleted"),
        }
    }
}
