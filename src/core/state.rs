//! core::state
//!
//! Persisted snapshots of reconciled content types.
//!
//! # Storage Layout
//!
//! Everything lives under `<project>/.ctsync/`:
//! - `state.json` - Snapshot per content type address
//! - `lock` - Exclusive lock file
//!
//! # Schema
//!
//! The state file is self-describing with `kind` and `schema_version` and is
//! strictly parsed. Each entry is a [`ContentTypeModel`] exactly as the
//! last successful reconciliation left it, including the remote versions.
//!
//! # Example
//!
//! ```
//! use ctsync::core::state::{StateFile, STATE_KIND};
//!
//! let state = StateFile::default();
//! assert_eq!(state.kind, STATE_KIND);
//! assert!(state.get("author").is_none());
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ContentTypeModel;

/// The kind identifier for the state file.
pub const STATE_KIND: &str = "ctsync.state";

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Errors from state operations.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to read state file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse state file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write state file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid kind '{found}', expected '{}'", STATE_KIND)]
    InvalidKind { found: String },

    #[error("unsupported state schema version {0}, supported: {SCHEMA_VERSION}")]
    UnsupportedVersion(u32),
}

/// Path routing for a project's state directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatePaths {
    root: PathBuf,
}

impl StatePaths {
    pub fn new(project_dir: &Path) -> Self {
        Self {
            root: project_dir.to_path_buf(),
        }
    }

    pub fn project_dir(&self) -> &Path {
        &self.root
    }

    /// `<project>/.ctsync`
    pub fn state_dir(&self) -> PathBuf {
        self.root.join(".ctsync")
    }

    /// `<project>/.ctsync/state.json`
    pub fn state_file(&self) -> PathBuf {
        self.state_dir().join("state.json")
    }

    /// `<project>/.ctsync/lock`
    pub fn lock_file(&self) -> PathBuf {
        self.state_dir().join("lock")
    }
}

#[derive(Debug, Deserialize)]
struct StateEnvelope {
    kind: String,
    schema_version: u32,
}

/// Snapshots keyed by content type address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StateFile {
    pub kind: String,
    pub schema_version: u32,
    #[serde(default)]
    pub content_types: BTreeMap<String, ContentTypeModel>,
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            kind: STATE_KIND.to_string(),
            schema_version: SCHEMA_VERSION,
            content_types: BTreeMap::new(),
        }
    }
}

impl StateFile {
    /// Load the state file; a missing file is an empty state.
    pub fn load(paths: &StatePaths) -> Result<Self, StateError> {
        let path = paths.state_file();
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path).map_err(|e| StateError::ReadError {
            path: path.clone(),
            source: e,
        })?;
        Self::parse(&contents, &path)
    }

    fn parse(contents: &str, path: &Path) -> Result<Self, StateError> {
        let parse_error = |e: serde_json::Error| StateError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        let envelope: StateEnvelope = serde_json::from_str(contents).map_err(parse_error)?;
        if envelope.kind != STATE_KIND {
            return Err(StateError::InvalidKind {
                found: envelope.kind,
            });
        }
        if envelope.schema_version != SCHEMA_VERSION {
            return Err(StateError::UnsupportedVersion(envelope.schema_version));
        }

        serde_json::from_str(contents).map_err(parse_error)
    }

    /// Write the state file atomically (temp file, then rename).
    pub fn save(&self, paths: &StatePaths) -> Result<(), StateError> {
        let path = paths.state_file();
        let write_error = |p: &Path, e: std::io::Error| StateError::WriteError {
            path: p.to_path_buf(),
            source: e,
        };

        fs::create_dir_all(paths.state_dir()).map_err(|e| write_error(&path, e))?;

        let contents = serde_json::to_string_pretty(self).map_err(|e| StateError::ParseError {
            path: path.clone(),
            message: e.to_string(),
        })?;

        let temp_path = path.with_extension("json.tmp");
        let mut file = fs::File::create(&temp_path).map_err(|e| write_error(&temp_path, e))?;
        file.write_all(contents.as_bytes())
            .map_err(|e| write_error(&temp_path, e))?;
        file.sync_all().map_err(|e| write_error(&temp_path, e))?;

        fs::rename(&temp_path, &path).map_err(|e| write_error(&path, e))?;
        tracing::debug!(path = %path.display(), entries = self.content_types.len(), "state saved");
        Ok(())
    }

    pub fn get(&self, address: &str) -> Option<&ContentTypeModel> {
        self.content_types.get(address)
    }

    pub fn put(&mut self, address: impl Into<String>, model: ContentTypeModel) {
        self.content_types.insert(address.into(), model);
    }

    pub fn remove(&mut self, address: &str) -> Option<ContentTypeModel> {
        self.content_types.remove(address)
    }

    /// Address already bound to the given remote identity, if any.
    pub fn address_of(&self, space_id: &str, environment: &str, id: &str) -> Option<&str> {
        self.content_types
            .iter()
            .find(|(_, m)| {
                m.space_id == space_id
                    && m.environment == environment
                    && m.id.as_deref() == Some(id)
            })
            .map(|(address, _)| address.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn model() -> ContentTypeModel {
        ContentTypeModel {
            space_id: "space".into(),
            environment: "master".into(),
            id: Some("author".into()),
            name: "Author".into(),
            display_field: "name".into(),
            version: Some(3),
            ..Default::default()
        }
    }

    #[test]
    fn missing_file_is_empty_state() {
        let temp = TempDir::new().unwrap();
        let state = StateFile::load(&StatePaths::new(temp.path())).unwrap();
        assert!(state.content_types.is_empty());
    }

    #[test]
    fn save_then_load() {
        let temp = TempDir::new().unwrap();
        let paths = StatePaths::new(temp.path());

        let mut state = StateFile::default();
        state.put("author", model());
        state.save(&paths).unwrap();

        assert!(paths.state_file().exists());
        assert!(!paths.state_file().with_extension("json.tmp").exists());

        let loaded = StateFile::load(&paths).unwrap();
        assert_eq!(loaded, state);
        assert_eq!(loaded.address_of("space", "master", "author"), Some("author"));
        assert_eq!(loaded.address_of("space", "staging", "author"), None);
    }

    #[test]
    fn rejects_wrong_kind_and_version() {
        let path = Path::new("state.json");
        let wrong_kind = r#"{ "kind": "other", "schema_version": 1 }"#;
        assert!(matches!(
            StateFile::parse(wrong_kind, path),
            Err(StateError::InvalidKind { .. })
        ));

        let wrong_version = r#"{ "kind": "ctsync.state", "schema_version": 9 }"#;
        assert!(matches!(
            StateFile::parse(wrong_version, path),
            Err(StateError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn rejects_unknown_fields() {
        let text = r#"{ "kind": "ctsync.state", "schema_version": 1, "extra": true }"#;
        assert!(matches!(
            StateFile::parse(text, Path::new("state.json")),
            Err(StateError::ParseError { .. })
        ));
    }
}
