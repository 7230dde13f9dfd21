//! Entity graph and simulation recompute loop.

pub mod entity;
pub mod load;
pub mod network;
pub mod source;

// Re-export the main types for convenience
pub use entity::{EntityId, GridPosition, Status};
pub use load::{Load, LoadKind};
pub use network::PowerGrid;
pub use source::{SOURCE_CAPACITY_MW, Source};
