//! Error types for registry operations.
//!
//! Uses `thiserror` for ergonomic error definition.

use thiserror::Error;

use crate::entity::Entity;

/// Convenient result alias for registry operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for Driftwood operations.
///
/// The error surface is deliberately small: invalid archetype transitions
/// route to the error archetype sentinel rather than an `Err`, and stale
/// callback handles are reported by boolean return, so only caller bugs
/// and hard capacity limits surface here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A mutating operation was attempted with a null or stale entity handle.
    #[error("stale entity handle: {0:?}")]
    StaleEntity(Entity),

    /// More distinct component types were registered than the registry supports.
    #[error("component type capacity exceeded: at most {limit} types may be registered")]
    TypeCapacity {
        /// The fixed capacity of the type registry.
        limit: usize,
    },
}

impl Error {
    /// Creates a stale entity error.
    #[must_use]
    pub fn stale_entity(entity: Entity) -> Self {
        Self::StaleEntity(entity)
    }

    /// Creates a type capacity error.
    #[must_use]
    pub fn type_capacity(limit: usize) -> Self {
        Self::TypeCapacity { limit }
    }
}
