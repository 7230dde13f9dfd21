//! Parameter configuration: seeded definitions, user overrides, presets,
//! and change notification.

pub mod params;
pub mod persist;
pub mod service;
pub mod store;

pub use params::{ComponentKind, ParameterDef, names};
pub use persist::{JsonStore, Preset, StoreFile};
pub use service::{ConfigEvent, ConfigurationService, SubscriberId};
pub use store::ParameterStore;
