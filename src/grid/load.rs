//! Load entities: inductive, capacitive, and resistive consumers.

use crate::grid::entity::{EntityId, GridPosition, Status};

/// Electrical behavior of a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    /// Motors, transformers. Positive reactive demand.
    Inductive,
    /// Capacitor banks. Negative reactive demand.
    Capacitive,
    /// Heating, lighting. Zero reactive demand.
    Resistive,
}

impl LoadKind {
    /// Short display label ("CI", "CC", "CR").
    pub fn label(self) -> &'static str {
        match self {
            LoadKind::Inductive => "CI",
            LoadKind::Capacitive => "CC",
            LoadKind::Resistive => "CR",
        }
    }

    /// Power factor used when no configuration is supplied.
    pub fn default_power_factor(self) -> f64 {
        match self {
            LoadKind::Inductive => 0.8,
            LoadKind::Capacitive => 0.9,
            LoadKind::Resistive => 1.0,
        }
    }

    /// Active demand used when no configuration is supplied (MW).
    pub const DEFAULT_DEMAND_MW: f64 = 5.0;
}

/// Display status of a connected load, derived from its source's voltage.
pub(crate) fn status_for_voltage(voltage_pu: f64) -> Status {
    if voltage_pu < 0.95 {
        Status::Critical
    } else if voltage_pu < 0.98 {
        Status::Warning
    } else {
        Status::Normal
    }
}

/// A power-consuming entity.
///
/// Reactive demand is derived, never stored independently: it is
/// recomputed from `p_demand_mw` and `power_factor` on construction and on
/// every [`Load::update_demand`], with its sign fixed by the kind.
#[derive(Debug, Clone)]
pub struct Load {
    pub id: EntityId,
    pub position: GridPosition,
    /// Unique electrical bus identifier.
    pub bus: String,
    pub kind: LoadKind,
    p_demand_mw: f64,
    power_factor: f64,
    q_demand_mvar: f64,
    source: Option<EntityId>,
    status: Status,
}

impl Load {
    pub(crate) fn new(
        id: EntityId,
        position: GridPosition,
        bus: String,
        kind: LoadKind,
        p_demand_mw: f64,
        power_factor: f64,
    ) -> Self {
        let mut load = Self {
            id,
            position,
            bus,
            kind,
            p_demand_mw,
            power_factor,
            q_demand_mvar: 0.0,
            source: None,
            status: Status::Inactive,
        };
        load.derive_reactive();
        load
    }

    /// Active power demand (MW).
    pub fn p_demand_mw(&self) -> f64 {
        self.p_demand_mw
    }

    /// Configured power factor.
    pub fn power_factor(&self) -> f64 {
        self.power_factor
    }

    /// Signed reactive demand (MVAr): positive inductive, negative
    /// capacitive, zero resistive.
    pub fn q_demand_mvar(&self) -> f64 {
        self.q_demand_mvar
    }

    /// The source this load draws from, when connected.
    pub fn source(&self) -> Option<EntityId> {
        self.source
    }

    pub fn is_connected(&self) -> bool {
        self.source.is_some()
    }

    /// Display status; always `Inactive` while unconnected.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Apparent power S = sqrt(P² + Q²) (MVA).
    pub fn apparent_power_mva(&self) -> f64 {
        (self.p_demand_mw.powi(2) + self.q_demand_mvar.powi(2)).sqrt()
    }

    /// Power factor recomputed from P and S.
    pub fn actual_power_factor(&self) -> f64 {
        let s = self.apparent_power_mva();
        if s > 0.0 { self.p_demand_mw / s } else { 1.0 }
    }

    /// Updates active demand (and optionally power factor), re-deriving
    /// reactive demand.
    pub(crate) fn update_demand(&mut self, p_demand_mw: f64, power_factor: Option<f64>) {
        self.p_demand_mw = p_demand_mw;
        if let Some(pf) = power_factor {
            self.power_factor = pf;
        }
        self.derive_reactive();
    }

    pub(crate) fn set_source(&mut self, source: Option<EntityId>) {
        self.source = source;
        if source.is_none() {
            self.status = Status::Inactive;
        }
    }

    pub(crate) fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    fn derive_reactive(&mut self) {
        let magnitude = self.p_demand_mw * self.power_factor.acos().tan();
        self.q_demand_mvar = match self.kind {
            LoadKind::Inductive => magnitude,
            LoadKind::Capacitive => -magnitude,
            LoadKind::Resistive => 0.0,
        };
    }
}
