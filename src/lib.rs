//! Electrical-grid simulation and configuration core for an isometric
//! city-builder.
//!
//! The crate owns the entity graph (one source, many loads), the periodic
//! voltage/loading recompute, and the parameter configuration store with
//! persisted user overrides and named presets. Rendering, menus, and input
//! live outside; they call in through [`config::ConfigurationService`] and
//! [`grid::PowerGrid`] and read entity status for color-coding.

/// Parameter store, presets, and change notification.
pub mod config;
pub mod error;
/// Entity graph, sources, loads, and the tick recompute.
pub mod grid;
pub mod settings;
pub mod telemetry;
