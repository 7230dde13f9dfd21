//! On-disk document for overrides and presets.
//!
//! The store persists as one JSON file holding two tables: override rows
//! (unique per `(kind, name)`) and presets (unique by name). The document
//! is serialized fully before anything touches the filesystem, so a failed
//! write never leaves a partially-updated file or in-memory state.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::params::ComponentKind;
use crate::error::{ConfigError, ConfigResult};

/// Persisted override row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideRecord {
    pub kind: ComponentKind,
    pub name: String,
    pub value: f64,
    pub last_modified: u64,
}

/// A named, persisted snapshot of one kind's effective parameters.
///
/// `parameters` is a value copy taken at save time, immune to later
/// override changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preset {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub kind: ComponentKind,
    pub parameters: BTreeMap<String, f64>,
    pub created_at: u64,
}

/// Complete on-disk document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreFile {
    #[serde(default)]
    pub overrides: Vec<OverrideRecord>,
    #[serde(default)]
    pub presets: Vec<Preset>,
    /// Monotonic preset id counter; ids are never reused.
    #[serde(default)]
    pub next_preset_id: u64,
}

/// JSON file backend for the configuration store.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    /// Creates a backend writing to `path`. Nothing is touched on disk
    /// until the first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the document, returning an empty one when the file does not
    /// exist yet.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` when the file exists but cannot be read or
    /// parsed.
    pub fn load(&self) -> ConfigResult<StoreFile> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no store file yet, starting empty");
            return Ok(StoreFile::default());
        }
        let raw = fs::read_to_string(&self.path).map_err(|e| {
            ConfigError::Persistence(format!("cannot read \"{}\": {e}", self.path.display()))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            ConfigError::Persistence(format!("invalid store \"{}\": {e}", self.path.display()))
        })
    }

    /// Writes the document.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` on serialization or I/O failure; the caller is
    /// expected to roll back its in-memory changes in that case.
    pub fn save(&self, file: &StoreFile) -> ConfigResult<()> {
        let raw = serde_json::to_string_pretty(file)
            .map_err(|e| ConfigError::Persistence(format!("cannot serialize store: {e}")))?;
        fs::write(&self.path, raw).map_err(|e| {
            ConfigError::Persistence(format!("cannot write \"{}\": {e}", self.path.display()))
        })?;
        debug!(path = %self.path.display(), "store file written");
        Ok(())
    }
}
