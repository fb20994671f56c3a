use std::{fmt, io, sync::mpsc::SendError};

use regex::Error as RegexError;
use serde::{Deserialize, Serialize};
use serde_json::Error as JsonError;
use thiserror::Error;

use crate::event::OntologyEvent;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum OntologyError {
    #[error("Invalid Command: {0}")]
    Command(String),
    #[error("Custom error: {0}")]
    Custom(String),
    /// Import validation failure. The payload is the user-facing message and names the offending
    /// index, field or id.
    #[error("{0}")]
    InvalidDataset(String),
    #[error("File System error: {0}")]
    Io(String),
    /// A candidate dataset rejected by `strict_poset` mode.
    #[error("{}", mode_blocked_message(.context, .issues))]
    ModeBlocked {
        context: String,
        issues: Vec<String>,
    },
    #[error("Item Not Found: {0}")]
    NotFound(String),
    #[error("You do not have permission to access this resource")]
    PermissionDenied,
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
}

fn mode_blocked_message(context: &str, issues: &[String]) -> String {
    format!("{} {}", context, issues.join(" ")).trim().to_string()
}

impl OntologyError {
    pub fn invalid(message: impl Into<String>) -> Self {
        OntologyError::InvalidDataset(message.into())
    }

    /// True for failures caused by the input data rather than the environment.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            OntologyError::Command(_)
                | OntologyError::InvalidDataset(_)
                | OntologyError::ModeBlocked { .. }
                | OntologyError::NotFound(_)
        )
    }
}

impl From<toml::de::Error> for OntologyError {
    fn from(src: toml::de::Error) -> OntologyError {
        OntologyError::Serialization(format!("Toml deserialization error: {src}"))
    }
}

impl From<toml::ser::Error> for OntologyError {
    fn from(src: toml::ser::Error) -> OntologyError {
        OntologyError::Serialization(format!("Toml serialization error: {src}"))
    }
}

impl From<JsonError> for OntologyError {
    fn from(src: JsonError) -> OntologyError {
        OntologyError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<io::Error> for OntologyError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => OntologyError::NotFound(format!("{x}")),
            io::ErrorKind::PermissionDenied => OntologyError::PermissionDenied,
            _ => OntologyError::Io(format!("IOError: {}", x.kind())),
        }
    }
}

impl From<fmt::Error> for OntologyError {
    fn from(x: fmt::Error) -> Self {
        OntologyError::Custom(format!("{x}"))
    }
}

impl From<RegexError> for OntologyError {
    fn from(x: RegexError) -> Self {
        OntologyError::Serialization(format!("Regex parse failed: {x}"))
    }
}

impl From<SendError<OntologyEvent>> for OntologyError {
    fn from(x: SendError<OntologyEvent>) -> Self {
        OntologyError::Io(format!(
            "Channel update send Error, could not transmit session event {:?}",
            x.0
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_mode_blocked_message_joins_issues() {
        let err = OntologyError::ModeBlocked {
            context: "Strict poset blocked import.".to_string(),
            issues: vec!["First.".to_string(), "Second.".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Strict poset blocked import. First. Second."
        );

        let bare = OntologyError::ModeBlocked {
            context: String::new(),
            issues: vec!["Only.".to_string()],
        };
        assert_eq!(bare.to_string(), "Only.");
    }

    #[test]
    fn test_invalid_dataset_displays_raw_message() {
        let err = OntologyError::invalid("Duplicate node id: a");
        assert_eq!(err.to_string(), "Duplicate node id: a");
        assert!(err.is_user_error());
        assert!(!OntologyError::Io("x".into()).is_user_error());
    }

    #[test]
    fn test_io_not_found_maps_to_not_found() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "missing.json");
        assert!(matches!(
            OntologyError::from(io_err),
            OntologyError::NotFound(_)
        ));
    }
}
