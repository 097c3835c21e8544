//! Simulation error types.
//!
//! Physics passes never fail: a missing component skips the entity and
//! degenerate math falls back to zero vectors or minimum speeds. Errors only
//! exist at the command and configuration boundary.

use std::fmt;

/// Top-level error enum for the simulation.
#[derive(Debug)]
pub enum SimError {
    /// An edit command referenced an entity id that is not in the store.
    UnknownEntity {
        /// The id that was looked up.
        id: u32,
    },

    /// A configuration value is outside its usable range.
    InvalidConfig {
        /// Name of the offending field.
        field: &'static str,
        /// The value that was rejected.
        value: f64,
        /// Human-readable description of the constraint.
        reason: &'static str,
    },

    /// Config or scene JSON could not be decoded.
    Parse(serde_json::Error),

    /// The host could not acquire a drawing surface.
    Surface(String),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::UnknownEntity { id } => write!(f, "no entity with id {id}"),
            SimError::InvalidConfig {
                field,
                value,
                reason,
            } => write!(f, "invalid config value {field} = {value}: {reason}"),
            SimError::Parse(e) => write!(f, "failed to parse JSON: {e}"),
            SimError::Surface(msg) => write!(f, "surface unavailable: {msg}"),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SimError {
    fn from(e: serde_json::Error) -> Self {
        SimError::Parse(e)
    }
}
