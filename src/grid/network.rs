//! The entity arena: placement, bidirectional connections, and the
//! per-tick recompute loop.
//!
//! All entities live in the grid, addressed by [`EntityId`]. Each edge is
//! stored on both sides as IDs (the load holds its source id, the source
//! holds a set of load ids); both sides are updated inside a single call,
//! so the graph is consistent or the operation failed as a no-op.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::config::params::names;
use crate::error::{GridError, GridResult};
use crate::grid::entity::{EntityId, GridPosition, Status};
use crate::grid::load::{Load, LoadKind, status_for_voltage};
use crate::grid::source::Source;

/// The live entity graph for one session.
///
/// Ephemeral by design: sessions rebuild it from user actions; only
/// configuration presets persist.
#[derive(Debug, Default)]
pub struct PowerGrid {
    sources: BTreeMap<EntityId, Source>,
    loads: BTreeMap<EntityId, Load>,
    next_index: u32,
    ticks: u64,
}

impl PowerGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Places a source at `position`, reading `p_nom_mw`/`v_nom_kv` from
    /// the effective parameter map (seeded defaults fill any gap).
    pub fn place_source(
        &mut self,
        position: GridPosition,
        params: &BTreeMap<String, f64>,
    ) -> EntityId {
        let id = self.allocate_id();
        let p_nom_mw = params.get(names::P_NOM_MW).copied().unwrap_or(1000.0);
        let v_nom_kv = params.get(names::V_NOM_KV).copied().unwrap_or(110.0);
        let source = Source::new(id, position, bus_name(id), p_nom_mw, v_nom_kv);
        info!(bus = %source.bus, p_nom_mw, v_nom_kv, "source placed");
        self.sources.insert(id, source);
        id
    }

    /// Places a load at `position`, reading `p_demand_mw`/`power_factor`
    /// from the effective parameter map (kind defaults fill any gap).
    pub fn place_load(
        &mut self,
        position: GridPosition,
        kind: LoadKind,
        params: &BTreeMap<String, f64>,
    ) -> EntityId {
        let id = self.allocate_id();
        let p_demand_mw = params
            .get(names::P_DEMAND_MW)
            .copied()
            .unwrap_or(LoadKind::DEFAULT_DEMAND_MW);
        let power_factor = params
            .get(names::POWER_FACTOR)
            .copied()
            .unwrap_or_else(|| kind.default_power_factor());
        let load = Load::new(id, position, bus_name(id), kind, p_demand_mw, power_factor);
        info!(
            bus = %load.bus,
            label = kind.label(),
            p_demand_mw,
            power_factor,
            "load placed"
        );
        self.loads.insert(id, load);
        id
    }

    pub fn source(&self, id: EntityId) -> Option<&Source> {
        self.sources.get(&id)
    }

    pub fn load(&self, id: EntityId) -> Option<&Load> {
        self.loads.get(&id)
    }

    pub fn sources(&self) -> impl Iterator<Item = &Source> {
        self.sources.values()
    }

    pub fn loads(&self) -> impl Iterator<Item = &Load> {
        self.loads.values()
    }

    /// Number of ticks executed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Connects a load to a source, updating both edge directions and
    /// recomputing the source.
    ///
    /// # Errors
    ///
    /// `UnknownEntity` when either id is absent, `NotALoad`/`NotASource`
    /// on kind mismatch, `AlreadyConnected` when the load already holds a
    /// connection (disconnect first; the edge set is unchanged).
    pub fn connect(&mut self, load_id: EntityId, source_id: EntityId) -> GridResult<()> {
        // Validate both ends before touching either side.
        if self.sources.contains_key(&load_id) {
            return Err(GridError::NotALoad(load_id));
        }
        if self.loads.contains_key(&source_id) {
            return Err(GridError::NotASource(source_id));
        }
        let load = self
            .loads
            .get(&load_id)
            .ok_or(GridError::UnknownEntity(load_id))?;
        if load.is_connected() {
            return Err(GridError::AlreadyConnected);
        }
        if !self.sources.contains_key(&source_id) {
            return Err(GridError::UnknownEntity(source_id));
        }

        let (p, q) = (load.p_demand_mw(), load.q_demand_mvar());
        if let Some(source) = self.sources.get_mut(&source_id) {
            source.attach(load_id);
        }
        if let Some(load) = self.loads.get_mut(&load_id) {
            load.set_source(Some(source_id));
            info!(load = %load.bus, p_mw = p, q_mvar = q, "load connected");
        }
        self.recompute_source(source_id);
        Ok(())
    }

    /// Tears down a load's connection, updating both edge directions and
    /// recomputing the former source.
    ///
    /// # Errors
    ///
    /// `UnknownEntity`/`NotALoad` for a bad id, `NotConnected` when the
    /// load holds no connection.
    pub fn disconnect(&mut self, load_id: EntityId) -> GridResult<()> {
        if self.sources.contains_key(&load_id) {
            return Err(GridError::NotALoad(load_id));
        }
        let load = self
            .loads
            .get_mut(&load_id)
            .ok_or(GridError::UnknownEntity(load_id))?;
        let source_id = load.source().ok_or(GridError::NotConnected)?;
        load.set_source(None);
        info!(load = %load.bus, "load disconnected");

        if let Some(source) = self.sources.get_mut(&source_id) {
            source.detach(load_id);
        }
        self.recompute_source(source_id);
        Ok(())
    }

    /// Updates a load's demand (and optionally power factor), re-deriving
    /// its reactive demand and recomputing its source when connected.
    ///
    /// # Errors
    ///
    /// `UnknownEntity`/`NotALoad` for a bad id.
    pub fn update_demand(
        &mut self,
        load_id: EntityId,
        p_demand_mw: f64,
        power_factor: Option<f64>,
    ) -> GridResult<()> {
        if self.sources.contains_key(&load_id) {
            return Err(GridError::NotALoad(load_id));
        }
        let load = self
            .loads
            .get_mut(&load_id)
            .ok_or(GridError::UnknownEntity(load_id))?;
        load.update_demand(p_demand_mw, power_factor);
        if let Some(source_id) = load.source() {
            self.recompute_source(source_id);
        }
        Ok(())
    }

    /// Removes an entity, detaching any edges first.
    ///
    /// # Errors
    ///
    /// `UnknownEntity` when the id is absent.
    pub fn remove(&mut self, id: EntityId) -> GridResult<()> {
        if let Some(source) = self.sources.remove(&id) {
            for load_id in source.loads() {
                if let Some(load) = self.loads.get_mut(load_id) {
                    load.set_source(None);
                }
            }
            info!(bus = %source.bus, "source removed");
            return Ok(());
        }
        if let Some(load) = self.loads.remove(&id) {
            if let Some(source_id) = load.source() {
                if let Some(source) = self.sources.get_mut(&source_id) {
                    source.detach(id);
                }
                self.recompute_source(source_id);
            }
            info!(bus = %load.bus, "load removed");
            return Ok(());
        }
        Err(GridError::UnknownEntity(id))
    }

    /// Drops every entity; the session starts over.
    pub fn clear(&mut self) {
        self.sources.clear();
        self.loads.clear();
        self.ticks = 0;
    }

    /// Executes one simulation tick: recomputes every source's totals,
    /// voltage, and status, then refreshes connected-load statuses.
    ///
    /// Pure arithmetic over in-memory state; never fails. Cadence is the
    /// caller's choice.
    pub fn tick(&mut self) -> u64 {
        self.ticks += 1;
        let source_ids: Vec<EntityId> = self.sources.keys().copied().collect();
        for id in source_ids {
            self.recompute_source(id);
        }
        self.ticks
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = EntityId::from_index(self.next_index);
        self.next_index += 1;
        id
    }

    fn recompute_source(&mut self, source_id: EntityId) {
        let demands: Vec<(f64, f64)> = match self.sources.get(&source_id) {
            Some(source) => source
                .loads()
                .iter()
                .filter_map(|load_id| self.loads.get(load_id))
                .map(|load| (load.p_demand_mw(), load.q_demand_mvar()))
                .collect(),
            None => return,
        };

        let (voltage, load_ids) = match self.sources.get_mut(&source_id) {
            Some(source) => {
                source.recompute(demands);
                (source.voltage_pu(), source.loads().clone())
            }
            None => return,
        };

        let status = status_for_voltage(voltage);
        for load_id in load_ids {
            if let Some(load) = self.loads.get_mut(&load_id) {
                if status == Status::Critical && load.status() != Status::Critical {
                    warn!(load = %load.bus, voltage_pu = voltage, "low voltage at load");
                }
                load.set_status(status);
            }
        }
    }
}

fn bus_name(id: EntityId) -> String {
    format!("bus_{id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_with_source_and_load(kind: LoadKind, p: f64, pf: f64) -> (PowerGrid, EntityId, EntityId) {
        let mut grid = PowerGrid::new();
        let source = grid.place_source(GridPosition::new(0, 0), &BTreeMap::new());
        let load = grid.place_load(
            GridPosition::new(1, 0),
            kind,
            &BTreeMap::from([
                ("p_demand_mw".to_string(), p),
                ("power_factor".to_string(), pf),
            ]),
        );
        (grid, source, load)
    }

    #[test]
    fn placement_uses_defaults_when_params_missing() {
        let mut grid = PowerGrid::new();
        let sid = grid.place_source(GridPosition::new(0, 0), &BTreeMap::new());
        let lid = grid.place_load(GridPosition::new(1, 1), LoadKind::Capacitive, &BTreeMap::new());

        let source = grid.source(sid).unwrap();
        assert_eq!(source.p_nom_mw, 1000.0);
        assert_eq!(source.v_nom_kv, 110.0);

        let load = grid.load(lid).unwrap();
        assert_eq!(load.p_demand_mw(), 5.0);
        assert_eq!(load.power_factor(), 0.9);
    }

    #[test]
    fn bus_names_are_unique() {
        let mut grid = PowerGrid::new();
        let a = grid.place_source(GridPosition::new(0, 0), &BTreeMap::new());
        let b = grid.place_load(GridPosition::new(1, 0), LoadKind::Resistive, &BTreeMap::new());
        assert_ne!(grid.source(a).unwrap().bus, grid.load(b).unwrap().bus);
    }

    #[test]
    fn connect_updates_both_sides_and_recomputes() {
        let (mut grid, sid, lid) = grid_with_source_and_load(LoadKind::Inductive, 100.0, 0.8);
        grid.connect(lid, sid).unwrap();

        let source = grid.source(sid).unwrap();
        assert!(source.loads().contains(&lid));
        assert!((source.total_p_mw() - 100.0).abs() < 1e-9);
        assert!((source.total_q_mvar() - 75.0).abs() < 1e-9);

        let load = grid.load(lid).unwrap();
        assert_eq!(load.source(), Some(sid));
    }

    #[test]
    fn double_connect_is_rejected_and_edge_set_unchanged() {
        let (mut grid, sid, lid) = grid_with_source_and_load(LoadKind::Inductive, 10.0, 0.8);
        grid.connect(lid, sid).unwrap();
        let err = grid.connect(lid, sid).unwrap_err();
        assert_eq!(err, GridError::AlreadyConnected);
        assert_eq!(grid.source(sid).unwrap().load_count(), 1);
    }

    #[test]
    fn connect_to_missing_source_is_reported() {
        let mut grid = PowerGrid::new();
        let lid = grid.place_load(GridPosition::new(0, 0), LoadKind::Resistive, &BTreeMap::new());
        let ghost = EntityId::from_index(99);
        assert_eq!(grid.connect(lid, ghost), Err(GridError::UnknownEntity(ghost)));
        assert!(!grid.load(lid).unwrap().is_connected());
    }

    #[test]
    fn kind_mismatch_is_reported() {
        let (mut grid, sid, lid) = grid_with_source_and_load(LoadKind::Inductive, 10.0, 0.8);
        assert_eq!(grid.connect(sid, lid), Err(GridError::NotALoad(sid)));
        assert_eq!(grid.disconnect(sid), Err(GridError::NotALoad(sid)));
    }

    #[test]
    fn disconnect_then_reconnect_round_trips() {
        let (mut grid, sid, lid) = grid_with_source_and_load(LoadKind::Inductive, 100.0, 0.8);
        grid.connect(lid, sid).unwrap();
        let q_before = grid.load(lid).unwrap().q_demand_mvar();

        grid.disconnect(lid).unwrap();
        let source = grid.source(sid).unwrap();
        assert_eq!(source.total_p_mw(), 0.0);
        assert_eq!(source.load_count(), 0);
        assert_eq!(grid.load(lid).unwrap().status(), Status::Inactive);

        grid.connect(lid, sid).unwrap();
        let source = grid.source(sid).unwrap();
        assert!((source.total_p_mw() - 100.0).abs() < 1e-9);
        assert!((grid.load(lid).unwrap().q_demand_mvar() - q_before).abs() < 1e-12);
    }

    #[test]
    fn disconnect_without_connection_is_reported() {
        let mut grid = PowerGrid::new();
        let lid = grid.place_load(GridPosition::new(0, 0), LoadKind::Resistive, &BTreeMap::new());
        assert_eq!(grid.disconnect(lid), Err(GridError::NotConnected));
    }

    #[test]
    fn reactive_contributions_partially_cancel() {
        let mut grid = PowerGrid::new();
        let sid = grid.place_source(GridPosition::new(0, 0), &BTreeMap::new());
        let inductive = grid.place_load(
            GridPosition::new(1, 0),
            LoadKind::Inductive,
            &BTreeMap::from([
                ("p_demand_mw".to_string(), 10.0),
                ("power_factor".to_string(), 0.8),
            ]),
        );
        let capacitive = grid.place_load(
            GridPosition::new(2, 0),
            LoadKind::Capacitive,
            &BTreeMap::from([
                ("p_demand_mw".to_string(), 10.0),
                ("power_factor".to_string(), 0.9),
            ]),
        );

        grid.connect(inductive, sid).unwrap();
        let q_inductive_only = grid.source(sid).unwrap().total_q_mvar();
        assert!(q_inductive_only > 0.0);

        grid.connect(capacitive, sid).unwrap();
        let q_both = grid.source(sid).unwrap().total_q_mvar();
        assert!(q_both.abs() < q_inductive_only);
    }

    #[test]
    fn update_demand_propagates_to_source() {
        let (mut grid, sid, lid) = grid_with_source_and_load(LoadKind::Inductive, 10.0, 0.8);
        grid.connect(lid, sid).unwrap();
        grid.update_demand(lid, 40.0, Some(0.9)).unwrap();

        let expected_q = 40.0 * (0.9_f64).acos().tan();
        let source = grid.source(sid).unwrap();
        assert!((source.total_p_mw() - 40.0).abs() < 1e-9);
        assert!((source.total_q_mvar() - expected_q).abs() < 1e-9);
    }

    #[test]
    fn tick_refreshes_statuses() {
        let (mut grid, sid, lid) = grid_with_source_and_load(LoadKind::Inductive, 100.0, 0.8);
        grid.connect(lid, sid).unwrap();
        assert_eq!(grid.tick(), 1);
        assert_eq!(grid.tick(), 2);

        // voltage = -0.51 -> critical at both ends
        assert_eq!(grid.source(sid).unwrap().status(), Status::Critical);
        assert_eq!(grid.load(lid).unwrap().status(), Status::Critical);
    }

    #[test]
    fn removing_a_source_orphans_its_loads() {
        let (mut grid, sid, lid) = grid_with_source_and_load(LoadKind::Inductive, 10.0, 0.8);
        grid.connect(lid, sid).unwrap();
        grid.remove(sid).unwrap();

        assert!(grid.source(sid).is_none());
        let load = grid.load(lid).unwrap();
        assert!(!load.is_connected());
        assert_eq!(load.status(), Status::Inactive);
    }

    #[test]
    fn removing_a_connected_load_recomputes_the_source() {
        let (mut grid, sid, lid) = grid_with_source_and_load(LoadKind::Inductive, 100.0, 0.8);
        grid.connect(lid, sid).unwrap();
        grid.remove(lid).unwrap();

        let source = grid.source(sid).unwrap();
        assert_eq!(source.total_p_mw(), 0.0);
        assert_eq!(source.voltage_pu(), 1.0);
        assert_eq!(source.load_count(), 0);
    }

    #[test]
    fn clear_resets_the_session() {
        let (mut grid, _, _) = grid_with_source_and_load(LoadKind::Inductive, 10.0, 0.8);
        grid.tick();
        grid.clear();
        assert_eq!(grid.sources().count(), 0);
        assert_eq!(grid.loads().count(), 0);
        assert_eq!(grid.ticks(), 0);
    }
}
