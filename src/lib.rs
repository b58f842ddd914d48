//! Driftwood - Entity-component registry with deferred destruction
//!
//! This crate re-exports both layers of the Driftwood system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 1: driftwood_registry   — Archetypes, component storage, destruction pipeline
//! Layer 0: driftwood_foundation — Core types (Entity, Error), dense/sparse containers
//! ```

pub use driftwood_foundation as foundation;
pub use driftwood_registry as registry;
