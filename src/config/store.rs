//! Parameter store: seeded definitions plus user overrides.
//!
//! Resolution rule: an override shadows the seeded default. Validation
//! policy: writes outside `[min, max]` are rejected, never clamped —
//! clamping would silently change simulated behavior.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::params::{
    ComponentKind, DefinitionTable, ParameterDef, seeded_definitions,
};
use crate::error::{ConfigError, ConfigResult};

/// One persisted override row; unique per `(kind, name)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverrideRow {
    /// Effective value replacing the seeded default.
    pub value: f64,
    /// Seconds since the Unix epoch of the last write.
    pub last_modified: u64,
}

/// Seconds since the Unix epoch, saturating at zero on clock skew.
pub(crate) fn now_epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Seeded parameter definitions and the user overrides shadowing them.
#[derive(Debug)]
pub struct ParameterStore {
    definitions: DefinitionTable,
    overrides: BTreeMap<ComponentKind, BTreeMap<String, OverrideRow>>,
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterStore {
    /// Creates a store with the seeded definitions and no overrides.
    pub fn new() -> Self {
        Self {
            definitions: seeded_definitions(),
            overrides: BTreeMap::new(),
        }
    }

    /// Looks up the definition for `(kind, name)`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownParameter` when the pair was never seeded.
    pub fn definition(&self, kind: ComponentKind, name: &str) -> ConfigResult<&ParameterDef> {
        self.definitions
            .get(&kind)
            .and_then(|params| params.get(name))
            .ok_or_else(|| ConfigError::UnknownParameter {
                kind,
                name: name.to_string(),
            })
    }

    /// Returns the effective value: override if present, else default.
    ///
    /// # Errors
    ///
    /// Returns `UnknownParameter` when `(kind, name)` has no definition.
    pub fn effective(&self, kind: ComponentKind, name: &str) -> ConfigResult<f64> {
        let def = self.definition(kind, name)?;
        let row = self.overrides.get(&kind).and_then(|rows| rows.get(name));
        Ok(row.map_or(def.default, |r| r.value))
    }

    /// Returns the full effective name→value map for one kind.
    pub fn effective_map(&self, kind: ComponentKind) -> BTreeMap<String, f64> {
        let Some(params) = self.definitions.get(&kind) else {
            return BTreeMap::new();
        };
        params
            .iter()
            .map(|(name, def)| {
                let value = self
                    .overrides
                    .get(&kind)
                    .and_then(|rows| rows.get(*name))
                    .map_or(def.default, |r| r.value);
                (name.to_string(), value)
            })
            .collect()
    }

    /// Validates and upserts an override, returning the replaced row.
    ///
    /// The returned row (or `None` for a fresh insert) lets the caller
    /// restore the prior state if persistence fails afterwards.
    ///
    /// # Errors
    ///
    /// `UnknownParameter` for an unseeded pair; `OutOfRange` when `value`
    /// lies outside the definition's bounds (the store is unchanged).
    pub fn set_override(
        &mut self,
        kind: ComponentKind,
        name: &str,
        value: f64,
    ) -> ConfigResult<Option<OverrideRow>> {
        let def = self.definition(kind, name)?;
        if !def.contains(value) {
            return Err(ConfigError::OutOfRange {
                min: def.min,
                max: def.max,
                unit: def.unit,
            });
        }

        let row = OverrideRow {
            value,
            last_modified: now_epoch_secs(),
        };
        Ok(self
            .overrides
            .entry(kind)
            .or_default()
            .insert(name.to_string(), row))
    }

    /// Deletes one override, or all overrides for `kind` when `name` is
    /// `None`. Returns the removed rows for rollback.
    pub fn reset_override(
        &mut self,
        kind: ComponentKind,
        name: Option<&str>,
    ) -> Vec<(String, OverrideRow)> {
        let Some(rows) = self.overrides.get_mut(&kind) else {
            return Vec::new();
        };
        match name {
            Some(name) => rows
                .remove_entry(name)
                .map(|entry| vec![entry])
                .unwrap_or_default(),
            None => std::mem::take(rows).into_iter().collect(),
        }
    }

    /// Reinstates rows removed by a failed write, or removes a row that a
    /// failed write inserted.
    pub(crate) fn restore_override(
        &mut self,
        kind: ComponentKind,
        name: &str,
        prior: Option<OverrideRow>,
    ) {
        let rows = self.overrides.entry(kind).or_default();
        match prior {
            Some(row) => {
                rows.insert(name.to_string(), row);
            }
            None => {
                rows.remove(name);
            }
        }
    }

    /// Reinstates a batch of rows removed by a failed reset.
    pub(crate) fn restore_overrides(
        &mut self,
        kind: ComponentKind,
        rows: Vec<(String, OverrideRow)>,
    ) {
        self.overrides.entry(kind).or_default().extend(rows);
    }

    /// Inserts a persisted row without validation (used when loading the
    /// store file; rows were validated when written).
    pub(crate) fn insert_loaded(&mut self, kind: ComponentKind, name: String, row: OverrideRow) {
        self.overrides.entry(kind).or_default().insert(name, row);
    }

    /// Iterates all override rows for persistence.
    pub fn overrides(
        &self,
    ) -> impl Iterator<Item = (ComponentKind, &str, &OverrideRow)> {
        self.overrides.iter().flat_map(|(kind, rows)| {
            rows.iter().map(|(name, row)| (*kind, name.as_str(), row))
        })
    }
}
