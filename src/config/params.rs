//! Component kinds, parameter definitions, and the seeded defaults table.
//!
//! Definitions are seeded once when a [`crate::config::store::ParameterStore`]
//! is created and never mutated at runtime.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Names of the seeded parameters.
pub mod names {
    /// Source nominal power capacity (MW).
    pub const P_NOM_MW: &str = "p_nom_mw";
    /// Source nominal voltage (kV).
    pub const V_NOM_KV: &str = "v_nom_kv";
    /// Load active power demand (MW).
    pub const P_DEMAND_MW: &str = "p_demand_mw";
    /// Load power factor (pu).
    pub const POWER_FACTOR: &str = "power_factor";
}

/// Kind tag for every configurable grid component.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Source,
    InductiveLoad,
    CapacitiveLoad,
    ResistiveLoad,
}

impl ComponentKind {
    /// All kinds, in the order edit screens list them.
    pub const ALL: [ComponentKind; 4] = [
        ComponentKind::Source,
        ComponentKind::InductiveLoad,
        ComponentKind::CapacitiveLoad,
        ComponentKind::ResistiveLoad,
    ];

    /// Stable lowercase tag used in persisted records and messages.
    pub fn as_str(self) -> &'static str {
        match self {
            ComponentKind::Source => "source",
            ComponentKind::InductiveLoad => "inductive_load",
            ComponentKind::CapacitiveLoad => "capacitive_load",
            ComponentKind::ResistiveLoad => "resistive_load",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable definition of one configurable parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterDef {
    /// Value used when no override is present.
    pub default: f64,
    /// Inclusive lower bound for overrides.
    pub min: f64,
    /// Inclusive upper bound for overrides.
    pub max: f64,
    /// Display unit (MW, kV, pu).
    pub unit: &'static str,
    /// Human-readable description for edit screens.
    pub description: &'static str,
}

impl ParameterDef {
    /// Returns `true` when `value` lies within `[min, max]`.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Per-kind definition table.
pub type DefinitionTable = BTreeMap<ComponentKind, BTreeMap<&'static str, ParameterDef>>;

/// Builds the seeded definition table.
pub fn seeded_definitions() -> DefinitionTable {
    let mut table = DefinitionTable::new();

    table.insert(
        ComponentKind::Source,
        BTreeMap::from([
            (
                names::P_NOM_MW,
                ParameterDef {
                    default: 1000.0,
                    min: 100.0,
                    max: 5000.0,
                    unit: "MW",
                    description: "Nominal Power Capacity",
                },
            ),
            (
                names::V_NOM_KV,
                ParameterDef {
                    default: 110.0,
                    min: 11.0,
                    max: 400.0,
                    unit: "kV",
                    description: "Nominal Voltage",
                },
            ),
        ]),
    );

    table.insert(
        ComponentKind::InductiveLoad,
        load_definitions(0.8, 0.5, 0.95),
    );
    table.insert(
        ComponentKind::CapacitiveLoad,
        load_definitions(0.9, 0.85, 1.0),
    );
    table.insert(
        ComponentKind::ResistiveLoad,
        load_definitions(1.0, 0.98, 1.0),
    );

    table
}

/// Load kinds share the demand definition and differ only in power factor.
fn load_definitions(
    pf_default: f64,
    pf_min: f64,
    pf_max: f64,
) -> BTreeMap<&'static str, ParameterDef> {
    BTreeMap::from([
        (
            names::P_DEMAND_MW,
            ParameterDef {
                default: 5.0,
                min: 0.1,
                max: 100.0,
                unit: "MW",
                description: "Power Demand",
            },
        ),
        (
            names::POWER_FACTOR,
            ParameterDef {
                default: pf_default,
                min: pf_min,
                max: pf_max,
                unit: "pu",
                description: "Power Factor",
            },
        ),
    ])
}
