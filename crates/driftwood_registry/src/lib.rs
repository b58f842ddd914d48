//! Entity-component storage with archetype tracking and deferred
//! destruction.
//!
//! The [`EntityRegistry`] owns everything: an id allocator with
//! generational versions, one dense [`ComponentRegistry`] per component
//! type, the interned [`archetype`] transition graph, and the destruction
//! pipeline (intent queues, per-type destruction bins, and exactly-once
//! destruction callbacks).
//!
//! [`ComponentRegistry`]: component::ComponentRegistry

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_panics_doc)]

pub mod archetype;
pub mod callback;
pub(crate) mod component;
pub(crate) mod destruction;
pub mod registry;

pub use archetype::{Archetype, ArchetypeId};
pub use callback::{CallbackHandle, DestructionCallback};
pub use component::Component;
pub use registry::EntityRegistry;
