//! Component type identifiers.
//!
//! Each distinct Rust component type is assigned a small stable integer id
//! on first use. Ids are totally ordered, which lets archetypes keep their
//! type lists sorted and binary-searchable.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum number of distinct component types a registry can hold.
pub const MAX_COMPONENT_TYPES: usize = 512;

/// Stable small-integer identifier for a component type.
///
/// Assigned once per distinct Rust type by a [`TypeRegistry`] and valid for
/// that registry's lifetime. Ids from different registries are unrelated.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ComponentTypeId(pub(crate) u16);

impl ComponentTypeId {
    /// Returns the raw index of this type id.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentTypeId({})", self.0)
    }
}

/// Assigns ids to component types on first use.
///
/// Owned by the entity registry rather than living in process-global
/// statics, so independent registries never collide on type ids and tests
/// can reset state by constructing a fresh registry.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    ids: HashMap<TypeId, ComponentTypeId>,
}

impl TypeRegistry {
    /// Creates an empty type registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id for `T`, assigning the next free id on first use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeCapacity`] once [`MAX_COMPONENT_TYPES`] distinct
    /// types have been registered. This is a hard limit; callers are
    /// expected to treat it as fatal.
    pub fn register<T: 'static>(&mut self) -> Result<ComponentTypeId> {
        if let Some(&id) = self.ids.get(&TypeId::of::<T>()) {
            return Ok(id);
        }

        let next = self.ids.len();
        if next >= MAX_COMPONENT_TYPES {
            return Err(Error::type_capacity(MAX_COMPONENT_TYPES));
        }

        #[allow(clippy::cast_possible_truncation)]
        let id = ComponentTypeId(next as u16);
        self.ids.insert(TypeId::of::<T>(), id);
        Ok(id)
    }

    /// Returns the id previously assigned to `T`, if any.
    ///
    /// Unlike [`register`](Self::register) this never allocates an id, so it
    /// can be used on read-only paths (presence checks, removal marking of a
    /// type no entity ever had).
    #[must_use]
    pub fn lookup<T: 'static>(&self) -> Option<ComponentTypeId> {
        self.ids.get(&TypeId::of::<T>()).copied()
    }

    /// Returns the number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true if no types have been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
