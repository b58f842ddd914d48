//! Per-type dense component storage.
//!
//! Each component type gets one [`ComponentRegistry<T>`] holding a dense
//! array of values, an index-aligned dense array of owning entities, and a
//! sparse entity-id → slot link map. Removal is swap-removal: the last
//! component is moved into the vacated slot and the moved owner's link is
//! repaired to point at its new address.

use std::any::Any;

use driftwood_foundation::{CompactVec, ComponentTypeId, Entity, SparseMap};

/// Marker trait for component types.
///
/// Components are plain data: default-constructible (new components start
/// at their default value) and cloneable (entity copies are value copies).
/// Every such type is automatically a component.
pub trait Component: Default + Clone + 'static {}

impl<T: Default + Clone + 'static> Component for T {}

/// Dense-array slot currently holding an entity's component of one type.
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct EntityComponentLink {
    pub address: u32,
}

/// Object-safe view of a [`ComponentRegistry<T>`] for the orchestrator.
///
/// The registry keeps one boxed instance per component type, indexed by
/// [`ComponentTypeId`], so destruction and copying can operate without
/// compile-time knowledge of every component type.
pub(crate) trait ErasedRegistry {
    /// The component type this registry stores.
    fn type_id(&self) -> ComponentTypeId;

    /// Number of stored components.
    fn len(&self) -> usize;

    /// Returns true if `entity` has this component.
    fn has(&self, entity: Entity) -> bool;

    /// The entity owning the component at dense index `address`, if in bounds.
    fn owner_at(&self, address: usize) -> Option<Entity>;

    /// Removes this component from every entity in `entities`.
    ///
    /// The caller guarantees the list is duplicate-free and every listed
    /// entity has the component. Batching amortizes the dynamic dispatch
    /// that a per-entity call would pay.
    fn remove_bulk_unchecked(&mut self, entities: &[Entity]);

    /// Clones `src`'s component value onto `dst`, adding the component to
    /// `dst` if absent. The caller guarantees `src` has the component.
    fn copy_unchecked(&mut self, dst: Entity, src: Entity);

    /// Downcast support for the typed fast path.
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcast support for the typed fast path.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Dense storage for all components of type `T`.
pub(crate) struct ComponentRegistry<T: Component> {
    type_id: ComponentTypeId,
    values: CompactVec<T>,
    owners: CompactVec<Entity>,
    links: SparseMap<EntityComponentLink>,
}

impl<T: Component> ComponentRegistry<T> {
    pub fn new(type_id: ComponentTypeId) -> Self {
        Self {
            type_id,
            values: CompactVec::new(),
            owners: CompactVec::new(),
            links: SparseMap::new(),
        }
    }

    /// Returns the dense address of `entity`'s component, adding a
    /// default-valued component if absent. The bool is true if the
    /// component was newly added.
    pub fn add_or_get_address(&mut self, entity: Entity) -> (u32, bool) {
        if let Some(link) = self.links.get(entity.id) {
            return (link.address, false);
        }

        #[allow(clippy::cast_possible_truncation)]
        let address = self.values.push(T::default()) as u32;
        self.owners.push(entity);
        self.links.insert(entity.id, EntityComponentLink { address });
        (address, true)
    }

    /// Returns the component value at a dense address.
    ///
    /// # Panics
    ///
    /// Panics if `address` was not returned by
    /// [`add_or_get_address`](Self::add_or_get_address) for a still-present
    /// component.
    pub fn value_at_mut(&mut self, address: u32) -> &mut T {
        self.values
            .get_mut(address as usize)
            .expect("dense address out of bounds")
    }

    /// Returns a shared reference to `entity`'s component, if present.
    pub fn get(&self, entity: Entity) -> Option<&T> {
        let link = self.links.get(entity.id)?;
        self.values.get(link.address as usize)
    }

    /// Returns a mutable reference to `entity`'s component, if present.
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        let link = *self.links.get(entity.id)?;
        self.values.get_mut(link.address as usize)
    }

    /// Removes `entity`'s component. The caller guarantees the entity has
    /// the component.
    ///
    /// Swap-removes from both dense arrays and repairs the link of the
    /// entity whose component was moved into the vacated slot.
    fn remove_unchecked(&mut self, entity: Entity) {
        let link = *self
            .links
            .get(entity.id)
            .expect("removal of a component the entity does not have");

        // The owner of the last component will be moved into the vacated
        // slot; point its link at the new address before the move. When the
        // removed component is itself the last one, this writes the link
        // that is removed immediately after.
        let last = self.owners.len() - 1;
        let filler = *self.owners.get(last).expect("owner array is non-empty");
        self.links
            .get_mut(filler.id)
            .expect("moved owner has a link")
            .address = link.address;

        self.owners.swap_remove(link.address as usize);
        self.values.swap_remove(link.address as usize);
        self.links.remove(entity.id);
    }
}

impl<T: Component> ErasedRegistry for ComponentRegistry<T> {
    fn type_id(&self) -> ComponentTypeId {
        self.type_id
    }

    fn len(&self) -> usize {
        self.owners.len()
    }

    fn has(&self, entity: Entity) -> bool {
        self.links.contains(entity.id)
    }

    fn owner_at(&self, address: usize) -> Option<Entity> {
        self.owners.get(address).copied()
    }

    fn remove_bulk_unchecked(&mut self, entities: &[Entity]) {
        for entity in entities {
            self.remove_unchecked(*entity);
        }
    }

    fn copy_unchecked(&mut self, dst: Entity, src: Entity) {
        let value = self
            .get(src)
            .cloned()
            .expect("copy source entity has the component");
        let (address, _) = self.add_or_get_address(dst);
        *self.value_at_mut(address) = value;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
