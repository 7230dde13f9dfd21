//! Source entity: the grid's single supply point.

use std::collections::BTreeSet;

use tracing::warn;

use crate::grid::entity::{EntityId, GridPosition, Status};

/// Capacity used for loading and voltage calculations (MW).
///
/// A constant independent of the configured `p_nom_mw`: configuring
/// nominal power changes reporting only, never the loading or voltage
/// math.
pub const SOURCE_CAPACITY_MW: f64 = 1000.0;

/// A power-supplying entity aggregating the demand of its connected loads.
///
/// Totals, voltage, and status are derived state, recomputed by the grid
/// on every connect/disconnect and tick.
#[derive(Debug, Clone)]
pub struct Source {
    pub id: EntityId,
    pub position: GridPosition,
    /// Unique electrical bus identifier.
    pub bus: String,
    /// Configured nominal power rating (MW). Reporting only; see
    /// [`SOURCE_CAPACITY_MW`].
    pub p_nom_mw: f64,
    /// Configured nominal voltage rating (kV).
    pub v_nom_kv: f64,
    voltage_pu: f64,
    total_p_mw: f64,
    total_q_mvar: f64,
    loads: BTreeSet<EntityId>,
    status: Status,
}

impl Source {
    pub(crate) fn new(
        id: EntityId,
        position: GridPosition,
        bus: String,
        p_nom_mw: f64,
        v_nom_kv: f64,
    ) -> Self {
        Self {
            id,
            position,
            bus,
            p_nom_mw,
            v_nom_kv,
            voltage_pu: 1.0,
            total_p_mw: 0.0,
            total_q_mvar: 0.0,
            loads: BTreeSet::new(),
            status: Status::Normal,
        }
    }

    /// Per-unit voltage derived from loading and reactive demand.
    ///
    /// Linear approximation with no floor; extreme load can drive it
    /// negative.
    pub fn voltage_pu(&self) -> f64 {
        self.voltage_pu
    }

    /// Sum of active demand over connected loads (MW).
    pub fn total_p_mw(&self) -> f64 {
        self.total_p_mw
    }

    /// Signed sum of reactive demand over connected loads (MVAr).
    pub fn total_q_mvar(&self) -> f64 {
        self.total_q_mvar
    }

    /// Loading as a fraction of [`SOURCE_CAPACITY_MW`].
    pub fn loading_percent(&self) -> f64 {
        self.total_p_mw / SOURCE_CAPACITY_MW
    }

    /// Remaining capacity (MW), floored at zero.
    pub fn available_capacity_mw(&self) -> f64 {
        (SOURCE_CAPACITY_MW - self.total_p_mw).max(0.0)
    }

    pub fn is_overloaded(&self) -> bool {
        self.loading_percent() > 1.0
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// IDs of currently connected loads.
    pub fn loads(&self) -> &BTreeSet<EntityId> {
        &self.loads
    }

    pub fn load_count(&self) -> usize {
        self.loads.len()
    }

    pub(crate) fn attach(&mut self, load: EntityId) -> bool {
        self.loads.insert(load)
    }

    pub(crate) fn detach(&mut self, load: EntityId) -> bool {
        self.loads.remove(&load)
    }

    /// Recomputes totals, voltage, and status from connected-load demands.
    ///
    /// `demands` yields `(p_mw, q_mvar)` per connected load; disconnected
    /// loads contribute nothing because they are no longer in the set.
    pub(crate) fn recompute<I>(&mut self, demands: I)
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let (total_p, total_q) = demands
            .into_iter()
            .fold((0.0, 0.0), |(p, q), (dp, dq)| (p + dp, q + dq));
        self.total_p_mw = total_p;
        self.total_q_mvar = total_q;

        let loading = self.loading_percent();
        self.voltage_pu = 1.0 - loading * 0.1 - self.total_q_mvar.abs() * 0.02;

        let previous = self.status;
        self.status = if loading > 0.9 || self.voltage_pu < 0.95 {
            Status::Critical
        } else if loading > 0.7 || self.voltage_pu < 0.98 {
            Status::Warning
        } else {
            Status::Normal
        };

        if self.status == Status::Critical && previous != Status::Critical {
            if loading > 0.9 {
                warn!(
                    bus = %self.bus,
                    loading_pct = loading * 100.0,
                    "high loading at source"
                );
            }
            if self.voltage_pu < 0.95 {
                warn!(
                    bus = %self.bus,
                    voltage_pu = self.voltage_pu,
                    "low voltage at source"
                );
            }
        }
    }
}
