//! TOML-based core settings.
//!
//! Covers only what the core itself needs to know: where the configuration
//! store lives on disk and the intended tick cadence. The rendering layer
//! owns the actual clock; `tick_interval_secs` is advisory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Settings error with field path and constraint description.
#[derive(Error, Debug)]
#[error("settings error: {field} — {message}")]
pub struct SettingsError {
    /// Dotted field path (e.g., `"tick_interval_secs"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

/// Core settings parsed from TOML.
///
/// All fields have defaults; load from TOML with
/// [`Settings::from_toml_file`] or use [`Settings::default`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Path of the JSON configuration store (overrides and presets).
    pub storage_path: PathBuf,
    /// Intended simulation tick interval in seconds (must be > 0).
    pub tick_interval_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("citygrid.json"),
            tick_interval_secs: 1,
        }
    }
}

impl Settings {
    /// Parses settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `SettingsError` if the file cannot be read or the TOML is
    /// invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path).map_err(|e| SettingsError {
            field: "settings".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses settings from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `SettingsError` if the TOML is invalid or contains unknown
    /// fields.
    pub fn from_toml_str(s: &str) -> Result<Self, SettingsError> {
        toml::from_str(s).map_err(|e| SettingsError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if settings are valid.
    pub fn validate(&self) -> Vec<SettingsError> {
        let mut errors = Vec::new();

        if self.tick_interval_secs == 0 {
            errors.push(SettingsError {
                field: "tick_interval_secs".into(),
                message: "must be > 0".into(),
            });
        }
        if self.storage_path.as_os_str().is_empty() {
            errors.push(SettingsError {
                field: "storage_path".into(),
                message: "must not be empty".into(),
            });
        }

        errors
    }
}
