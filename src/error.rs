//! Error taxonomy for the configuration and grid cores.
//!
//! Every failure here is recoverable: operations that return an error leave
//! prior state intact, and the caller decides whether to retry or surface
//! the message to the user.

use std::fmt;

use thiserror::Error;

use crate::config::params::ComponentKind;
use crate::grid::entity::EntityId;

/// Result alias for configuration-store and preset operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result alias for entity-graph operations.
pub type GridResult<T> = Result<T, GridError>;

/// Errors from parameter writes, preset CRUD, and persistence.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The `(kind, name)` pair has no seeded parameter definition.
    #[error("unknown parameter `{name}` for {kind}")]
    UnknownParameter {
        kind: ComponentKind,
        name: String,
    },

    /// Value outside the definition's `[min, max]` range. Writes are
    /// rejected, never clamped.
    #[error("value must be between {min} and {max} {unit}")]
    OutOfRange {
        min: f64,
        max: f64,
        unit: &'static str,
    },

    /// Preset name was empty.
    #[error("a name is required")]
    NameRequired,

    /// A preset with this name already exists; the original is untouched.
    #[error("an instance named `{0}` already exists")]
    DuplicateName(String),

    /// No preset with this id.
    #[error("no saved instance with id {0}")]
    PresetNotFound(u64),

    /// Underlying storage failure. In-memory state is left unchanged, so
    /// the service remains usable read-only.
    #[error("storage error: {0}")]
    Persistence(String),
}

/// Errors from connect/disconnect/update operations on the entity graph.
///
/// A failed operation is a no-op: the graph is never left with a
/// one-sided edge.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridError {
    /// The load already holds a connection; disconnect first.
    #[error("load is already connected")]
    AlreadyConnected,

    /// The load holds no connection to tear down.
    #[error("load is not connected")]
    NotConnected,

    /// No entity with this id exists in the grid.
    #[error("no entity with id {0}")]
    UnknownEntity(EntityId),

    /// The id resolves to a source where a load was required.
    #[error("entity {0} is not a load")]
    NotALoad(EntityId),

    /// The id resolves to a load where a source was required.
    #[error("entity {0} is not a source")]
    NotASource(EntityId),
}

/// Converts a service result into the `(success, message)` pair the UI
/// layer displays directly.
pub fn feedback<T, E>(result: &Result<T, E>) -> (bool, String)
where
    T: fmt::Display,
    E: fmt::Display,
{
    match result {
        Ok(msg) => (true, msg.to_string()),
        Err(err) => (false, err.to_string()),
    }
}
