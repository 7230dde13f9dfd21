//! Configuration service: effective-value snapshot, preset CRUD, and
//! change notification.
//!
//! The service owns a [`ParameterStore`] plus the persisted preset table
//! and keeps an in-memory "current configuration" snapshot that entity
//! constructors read. Every successful write recomputes the snapshot for
//! all kinds, not just the changed one; the table is small and wholesale
//! recomputation keeps the logic obviously correct.
//!
//! Notification is synchronous and runs in registration order. Calling
//! back into the service from inside a subscriber is not supported:
//! subscribers must only record the event and refresh their own views
//! after dispatch returns.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::info;

use crate::config::params::ComponentKind;
use crate::config::persist::{JsonStore, OverrideRecord, Preset, StoreFile};
use crate::config::store::{OverrideRow, ParameterStore, now_epoch_secs};
use crate::error::{ConfigError, ConfigResult};

/// Configuration change notification delivered to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigEvent {
    /// A parameter override was written or reset.
    ConfigChanged,
    /// A preset was saved.
    PresetSaved,
    /// A preset was deleted.
    PresetDeleted,
}

impl ConfigEvent {
    /// Stable tag for UI display and persisted logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigEvent::ConfigChanged => "config_changed",
            ConfigEvent::PresetSaved => "instance_saved",
            ConfigEvent::PresetDeleted => "instance_deleted",
        }
    }
}

/// Token returned by [`ConfigurationService::subscribe`].
pub type SubscriberId = u64;

type Subscriber = Box<dyn FnMut(ConfigEvent)>;

/// Resolves effective parameters, validates writes, and persists presets.
pub struct ConfigurationService {
    params: ParameterStore,
    presets: Vec<Preset>,
    next_preset_id: u64,
    current: BTreeMap<ComponentKind, BTreeMap<String, f64>>,
    backend: JsonStore,
    subscribers: Vec<(SubscriberId, Subscriber)>,
    next_subscriber: SubscriberId,
}

impl ConfigurationService {
    /// Opens the service over the JSON store at `path`, seeding defaults
    /// and loading any persisted overrides and presets.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` when an existing store file cannot be read or
    /// parsed.
    pub fn open(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let backend = JsonStore::new(path.as_ref());
        let file = backend.load()?;

        let mut params = ParameterStore::new();
        for record in file.overrides {
            params.insert_loaded(
                record.kind,
                record.name,
                OverrideRow {
                    value: record.value,
                    last_modified: record.last_modified,
                },
            );
        }

        let highest_id = file.presets.iter().map(|p| p.id).max().unwrap_or(0);
        let next_preset_id = file.next_preset_id.max(highest_id + 1);

        let mut service = Self {
            params,
            presets: file.presets,
            next_preset_id,
            current: BTreeMap::new(),
            backend,
            subscribers: Vec::new(),
            next_subscriber: 1,
        };
        service.recompute_current();
        Ok(service)
    }

    /// Returns the current effective name→value map for `kind`.
    pub fn effective(&self, kind: ComponentKind) -> &BTreeMap<String, f64> {
        // Every kind is seeded, so the snapshot always has an entry.
        static EMPTY: BTreeMap<String, f64> = BTreeMap::new();
        self.current.get(&kind).unwrap_or(&EMPTY)
    }

    /// Returns one effective value.
    ///
    /// # Errors
    ///
    /// Returns `UnknownParameter` when `(kind, name)` has no definition.
    pub fn effective_value(&self, kind: ComponentKind, name: &str) -> ConfigResult<f64> {
        self.params.effective(kind, name)
    }

    /// Validates and persists a parameter override.
    ///
    /// On success the whole snapshot is recomputed and subscribers receive
    /// `ConfigChanged`. On any failure the store and snapshot are left
    /// exactly as before.
    ///
    /// # Errors
    ///
    /// `UnknownParameter`, `OutOfRange`, or `Persistence`.
    pub fn save(&mut self, kind: ComponentKind, name: &str, value: f64) -> ConfigResult<String> {
        let prior = self.params.set_override(kind, name, value)?;
        if let Err(err) = self.persist() {
            self.params.restore_override(kind, name, prior);
            return Err(err);
        }
        self.recompute_current();
        info!(%kind, name, value, "parameter override saved");
        self.notify(ConfigEvent::ConfigChanged);
        Ok("Configuration saved successfully".to_string())
    }

    /// Resets one parameter, or all parameters of `kind` when `name` is
    /// `None`, back to the seeded defaults.
    ///
    /// # Errors
    ///
    /// `Persistence` when the store file cannot be written; the overrides
    /// are restored in that case.
    pub fn reset(&mut self, kind: ComponentKind, name: Option<&str>) -> ConfigResult<String> {
        let removed = self.params.reset_override(kind, name);
        if let Err(err) = self.persist() {
            self.params.restore_overrides(kind, removed);
            return Err(err);
        }
        self.recompute_current();
        info!(%kind, ?name, "overrides reset to defaults");
        self.notify(ConfigEvent::ConfigChanged);
        Ok("Configuration reset to defaults".to_string())
    }

    /// Snapshots the current effective parameters of `kind` as a named
    /// preset.
    ///
    /// The snapshot is a value copy, immune to later override changes.
    ///
    /// # Errors
    ///
    /// `NameRequired` for an empty name, `DuplicateName` when the name is
    /// taken (the original preset is untouched), or `Persistence`.
    pub fn save_preset(
        &mut self,
        name: &str,
        kind: ComponentKind,
        description: &str,
    ) -> ConfigResult<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ConfigError::NameRequired);
        }
        if self.presets.iter().any(|p| p.name == name) {
            return Err(ConfigError::DuplicateName(name.to_string()));
        }

        let preset = Preset {
            id: self.next_preset_id,
            name: name.to_string(),
            description: description.to_string(),
            kind,
            parameters: self.effective(kind).clone(),
            created_at: now_epoch_secs(),
        };
        self.presets.push(preset);
        self.next_preset_id += 1;

        if let Err(err) = self.persist() {
            self.presets.pop();
            self.next_preset_id -= 1;
            return Err(err);
        }
        info!(%kind, name, "preset saved");
        self.notify(ConfigEvent::PresetSaved);
        Ok(format!("Saved instance '{name}' successfully"))
    }

    /// Lists presets, optionally filtered by component kind.
    pub fn presets(&self, kind: Option<ComponentKind>) -> Vec<&Preset> {
        self.presets
            .iter()
            .filter(|p| kind.is_none_or(|k| p.kind == k))
            .collect()
    }

    /// Returns a copy of the parameter snapshot stored under `id`.
    ///
    /// # Errors
    ///
    /// `PresetNotFound` when no preset has this id.
    pub fn load_preset(&self, id: u64) -> ConfigResult<BTreeMap<String, f64>> {
        self.presets
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.parameters.clone())
            .ok_or(ConfigError::PresetNotFound(id))
    }

    /// Deletes the preset with `id`.
    ///
    /// # Errors
    ///
    /// `PresetNotFound` is reported but leaves no state change;
    /// `Persistence` restores the preset.
    pub fn delete_preset(&mut self, id: u64) -> ConfigResult<String> {
        let index = self
            .presets
            .iter()
            .position(|p| p.id == id)
            .ok_or(ConfigError::PresetNotFound(id))?;
        let preset = self.presets.remove(index);

        if let Err(err) = self.persist() {
            self.presets.insert(index, preset);
            return Err(err);
        }
        info!(id, "preset deleted");
        self.notify(ConfigEvent::PresetDeleted);
        Ok("Instance deleted successfully".to_string())
    }

    /// Registers a subscriber and returns its unsubscribe token.
    ///
    /// Subscribers run synchronously, in registration order. They must not
    /// call back into the service (see module docs).
    pub fn subscribe(&mut self, subscriber: impl FnMut(ConfigEvent) + 'static) -> SubscriberId {
        let id = self.next_subscriber;
        self.next_subscriber += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    /// Removes a subscriber. Returns `false` when the token was already
    /// unregistered.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    fn notify(&mut self, event: ConfigEvent) {
        for (_, subscriber) in &mut self.subscribers {
            subscriber(event);
        }
    }

    fn recompute_current(&mut self) {
        self.current = ComponentKind::ALL
            .into_iter()
            .map(|kind| (kind, self.params.effective_map(kind)))
            .collect();
    }

    fn persist(&self) -> ConfigResult<()> {
        let file = StoreFile {
            overrides: self
                .params
                .overrides()
                .map(|(kind, name, row)| OverrideRecord {
                    kind,
                    name: name.to_string(),
                    value: row.value,
                    last_modified: row.last_modified,
                })
                .collect(),
            presets: self.presets.clone(),
            next_preset_id: self.next_preset_id,
        };
        self.backend.save(&file)
    }
}
