//! Core types and containers for Driftwood.
//!
//! This crate provides:
//! - [`Entity`] - Generational entity identifiers
//! - [`Error`] - Error types for registry operations
//! - [`ComponentTypeId`] / [`TypeRegistry`] - Stable small-integer component type ids
//! - [`CompactVec`] - Block-allocated dense array with swap-removal
//! - [`SparseMap`] / [`FreeListSparseMap`] - Paged sparse integer-keyed maps

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod algorithms;
mod compact;
mod entity;
mod error;
mod sparse;
mod types;

pub use algorithms::distinct_prefix;
pub use compact::CompactVec;
pub use entity::Entity;
pub use error::{Error, Result};
pub use sparse::{FreeListSparseMap, SparseMap};
pub use types::{ComponentTypeId, TypeRegistry, MAX_COMPONENT_TYPES};
