//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use std::path::PathBuf;
use tempfile::TempDir;

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times; subsequent calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// A small valid dataset document: `root ⊇ mid ⊇ leaf`, one `grounds` relation and one
/// meta-relation.
#[allow(dead_code)]
pub const SMALL_DATASET: &str = r#"{
  "nodes": [
    { "id": "root", "label": "  Root  " },
    { "id": "mid", "label": "Middle", "notes": "between" },
    { "id": "leaf", "label": "Leaf", "notes": 42 }
  ],
  "edges": [
    { "id": "e1", "from": "root", "to": "mid", "type": "envelops", "strength": 0.9 },
    { "id": "e2", "from": "mid", "to": "leaf", "type": "envelops", "strength": 1.7 },
    { "id": "e3", "from": "leaf", "to": "root", "type": "grounds", "strength": 0.4 }
  ],
  "metaEdges": [
    { "id": "m1", "fromEdgeId": "e1", "toEdgeId": "e3", "type": "supports", "strength": 0.5 }
  ]
}"#;

/// Write `content` to `<temp_dir>/<name>` and return the path.
#[allow(dead_code)]
pub fn write_file(temp_dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = temp_dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// A preset document wrapping [SMALL_DATASET].
#[allow(dead_code)]
pub fn small_preset(key: &str, name: &str) -> String {
    format!(
        r#"{{ "key": "{key}", "name": "{name}", "description": "test preset", "data": {SMALL_DATASET} }}"#
    )
}
