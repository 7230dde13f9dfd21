//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use citygrid_sim::config::{ComponentKind, ConfigurationService};
use citygrid_sim::grid::{EntityId, GridPosition, LoadKind, PowerGrid};

/// Opens a fresh service over a store file inside `dir`.
pub fn open_service(dir: &tempfile::TempDir) -> ConfigurationService {
    ConfigurationService::open(store_path(dir)).expect("service should open")
}

/// Path of the store file used by [`open_service`], for reopen tests.
pub fn store_path(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("citygrid.json")
}

/// Maps a load kind to its configuration kind.
pub fn config_kind(kind: LoadKind) -> ComponentKind {
    match kind {
        LoadKind::Inductive => ComponentKind::InductiveLoad,
        LoadKind::Capacitive => ComponentKind::CapacitiveLoad,
        LoadKind::Resistive => ComponentKind::ResistiveLoad,
    }
}

/// Places a source configured from the service's effective parameters.
pub fn place_source(grid: &mut PowerGrid, service: &ConfigurationService) -> EntityId {
    grid.place_source(GridPosition::new(0, 0), service.effective(ComponentKind::Source))
}

/// Places a load of `kind` configured from the service's effective
/// parameters.
pub fn place_load(
    grid: &mut PowerGrid,
    service: &ConfigurationService,
    kind: LoadKind,
    at: (i32, i32),
) -> EntityId {
    grid.place_load(
        GridPosition::new(at.0, at.1),
        kind,
        service.effective(config_kind(kind)),
    )
}

/// Explicit parameter map for direct placement without a service.
pub fn load_params(p_demand_mw: f64, power_factor: f64) -> BTreeMap<String, f64> {
    BTreeMap::from([
        ("p_demand_mw".to_string(), p_demand_mw),
        ("power_factor".to_string(), power_factor),
    ])
}
