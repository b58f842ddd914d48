//! The entity registry: entity lifecycle, component access, queries, and
//! the deferred destruction pipeline.

use std::cell::RefCell;
use std::fmt;

use driftwood_foundation::{
    ComponentTypeId, Entity, Error, FreeListSparseMap, Result, SparseMap, TypeRegistry,
    distinct_prefix,
};

use crate::archetype::{ArchetypeDatabase, ArchetypeId};
use crate::callback::{CallbackHandle, CallbackTable, DestructionCallback};
use crate::component::{Component, ComponentRegistry, ErasedRegistry};
use crate::destruction::DestructionBuffer;

/// Central store of entities and their components.
///
/// Every entity starts in the empty archetype and moves along the
/// archetype transition graph as components are added and removed.
/// Destruction is deferred: [`mark_entity_for_destruction`] and
/// [`mark_component_for_removal`] record intents (through `&self`, so
/// marking is legal while a query iterator is borrowed from the registry),
/// and nothing is actually removed until [`process_destruction`] runs —
/// which takes `&mut self` and therefore cannot overlap an iteration.
///
/// [`mark_entity_for_destruction`]: Self::mark_entity_for_destruction
/// [`mark_component_for_removal`]: Self::mark_component_for_removal
/// [`process_destruction`]: Self::process_destruction
#[derive(Default)]
pub struct EntityRegistry {
    types: TypeRegistry,
    archetypes: ArchetypeDatabase,
    /// Live entity id → current archetype. Also the id allocator: freed
    /// ids return to its free list.
    entity_archetypes: FreeListSparseMap<ArchetypeId>,
    /// Entity id → current version. Never shrinks; versions outlive the
    /// ids they stamp so recycled ids invalidate old handles.
    entity_versions: SparseMap<u64>,
    /// One type-erased component registry per registered type, indexed by
    /// [`ComponentTypeId`].
    registries: Vec<Option<Box<dyn ErasedRegistry>>>,
    pending_destroy: RefCell<Vec<Entity>>,
    destruction_buffer: RefCell<DestructionBuffer>,
    callbacks: CallbackTable,
}

impl EntityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entity_archetypes.len()
    }

    /// Returns true if `entity` refers to a currently live entity: a
    /// non-null handle whose version matches the version on record for its
    /// id.
    #[must_use]
    pub fn is_live(&self, entity: Entity) -> bool {
        !entity.is_null()
            && self.entity_archetypes.contains(entity.id)
            && self.entity_versions.get(entity.id) == Some(&entity.version)
    }

    /// Creates a new entity in the empty archetype.
    ///
    /// Ids are recycled from destroyed entities; versions are not, so a
    /// handle to a destroyed entity stays dead even after its id is
    /// reused.
    pub fn create_entity(&mut self) -> Entity {
        let id = self.entity_archetypes.insert(ArchetypeId::EMPTY);
        let version = match self.entity_versions.get(id) {
            Some(version) => *version,
            None => {
                self.entity_versions.insert(id, 1);
                1
            }
        };
        Entity::new(id, version)
    }

    /// Creates a new entity carrying a clone of every component `src` has.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleEntity`] if `src` is null or destroyed.
    pub fn copy_entity(&mut self, src: Entity) -> Result<Entity> {
        if !self.is_live(src) {
            return Err(Error::stale_entity(src));
        }

        let src_archetype = *self
            .entity_archetypes
            .get(src.id)
            .expect("live entity has an archetype");
        let type_ids = self.archetypes.get(src_archetype).type_ids().to_vec();

        let dst = self.create_entity();
        for type_id in type_ids {
            self.registries[type_id.index()]
                .as_mut()
                .expect("archetype lists only registered types")
                .copy_unchecked(dst, src);
            let current = *self
                .entity_archetypes
                .get(dst.id)
                .expect("freshly created entity has an archetype");
            let next = self.archetypes.transition_add(current, type_id);
            *self
                .entity_archetypes
                .get_mut(dst.id)
                .expect("freshly created entity has an archetype") = next;
        }
        Ok(dst)
    }

    /// Returns a mutable reference to `entity`'s component of type `T`,
    /// adding a default-valued component (and advancing the entity's
    /// archetype) if it does not have one yet.
    ///
    /// The borrow ends before any later structural mutation: the borrow
    /// checker rules out holding this reference across an add, a removal,
    /// or [`process_destruction`](Self::process_destruction).
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleEntity`] if `entity` is null or destroyed,
    /// and [`Error::TypeCapacity`] if `T` is the first use of a type
    /// beyond the component-type limit.
    pub fn add_or_get_component<T: Component>(&mut self, entity: Entity) -> Result<&mut T> {
        if !self.is_live(entity) {
            return Err(Error::stale_entity(entity));
        }
        let type_id = self.register_type::<T>()?;

        let (address, added) = self.typed_mut::<T>(type_id).add_or_get_address(entity);
        if added {
            let current = *self
                .entity_archetypes
                .get(entity.id)
                .expect("live entity has an archetype");
            // A fresh add cannot be a duplicate, so the transition never
            // lands on the error archetype.
            let next = self.archetypes.transition_add(current, type_id);
            *self
                .entity_archetypes
                .get_mut(entity.id)
                .expect("live entity has an archetype") = next;
        }
        Ok(self.typed_mut::<T>(type_id).value_at_mut(address))
    }

    /// Returns a mutable reference to `entity`'s component of type `T`,
    /// or `None` if the entity is dead or lacks the component.
    pub fn try_get_component<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        if !self.is_live(entity) {
            return None;
        }
        let type_id = self.types.lookup::<T>()?;
        self.registries[type_id.index()]
            .as_mut()?
            .as_any_mut()
            .downcast_mut::<ComponentRegistry<T>>()?
            .get_mut(entity)
    }

    /// Returns a shared reference to `entity`'s component of type `T`,
    /// or `None` if the entity is dead or lacks the component.
    #[must_use]
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        if !self.is_live(entity) {
            return None;
        }
        let type_id = self.types.lookup::<T>()?;
        self.registries
            .get(type_id.index())?
            .as_ref()?
            .as_any()
            .downcast_ref::<ComponentRegistry<T>>()?
            .get(entity)
    }

    /// Returns true if `entity` is live and has a component of type `T`.
    #[must_use]
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.types
            .lookup::<T>()
            .is_some_and(|type_id| self.has_component_id(entity, type_id))
    }

    /// Returns true if `entity` is live and has a component of `type_id`.
    #[must_use]
    pub fn has_component_id(&self, entity: Entity, type_id: ComponentTypeId) -> bool {
        self.is_live(entity) && self.erased(type_id).is_some_and(|r| r.has(entity))
    }

    /// Number of entities currently holding a component of type `T`.
    #[must_use]
    pub fn count_component<T: Component>(&self) -> usize {
        self.types
            .lookup::<T>()
            .map_or(0, |type_id| self.count_component_id(type_id))
    }

    /// Number of entities currently holding a component of `type_id`.
    #[must_use]
    pub fn count_component_id(&self, type_id: ComponentTypeId) -> usize {
        self.erased(type_id).map_or(0, ErasedRegistry::len)
    }

    /// Queues removal of `entity`'s component of type `T`.
    ///
    /// Nothing is removed until the next
    /// [`process_destruction`](Self::process_destruction). Takes `&self`,
    /// so marking is legal from inside a query iteration.
    ///
    /// Returns `Ok(false)` if the entity does not have the component
    /// (repeated marks of the same component are therefore harmless).
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleEntity`] if `entity` is null or destroyed.
    pub fn mark_component_for_removal<T: Component>(&self, entity: Entity) -> Result<bool> {
        if !self.is_live(entity) {
            return Err(Error::stale_entity(entity));
        }
        let Some(type_id) = self.types.lookup::<T>() else {
            return Ok(false);
        };
        if !self.erased(type_id).is_some_and(|r| r.has(entity)) {
            return Ok(false);
        }
        self.destruction_buffer
            .borrow_mut()
            .queue_unchecked(entity, type_id);
        Ok(true)
    }

    /// Queues `entity` and all of its components for destruction at the
    /// next [`process_destruction`](Self::process_destruction).
    ///
    /// Takes `&self`, so marking is legal from inside a query iteration.
    /// Marking a dead entity, or the same entity more than once, is a
    /// no-op.
    pub fn mark_entity_for_destruction(&self, entity: Entity) {
        if self.is_live(entity) {
            self.pending_destroy.borrow_mut().push(entity);
        }
    }

    /// Registers `callback` to run when `entity`'s component of type `T`
    /// is destroyed, either individually or as part of whole-entity
    /// destruction. Each callback fires at most once and is unregistered
    /// by firing.
    ///
    /// Returns the null handle if `entity` is dead or lacks the component.
    pub fn add_component_destruction_callback<T: Component>(
        &mut self,
        entity: Entity,
        callback: DestructionCallback,
    ) -> CallbackHandle {
        let Some(type_id) = self.types.lookup::<T>() else {
            return CallbackHandle::null();
        };
        if !self.has_component_id(entity, type_id) {
            return CallbackHandle::null();
        }
        self.callbacks.add_unchecked(entity, type_id, callback)
    }

    /// Unregisters a destruction callback. Returns false if the handle is
    /// null or stale (already removed, or already fired).
    pub fn remove_component_destruction_callback(&mut self, handle: CallbackHandle) -> bool {
        self.callbacks.remove(handle)
    }

    /// Iterates the entities currently holding a component of type `T`.
    ///
    /// Order is storage order, not creation order. The iterator borrows
    /// the registry shared: marking intents during the walk is fine,
    /// structural mutation is rejected at compile time.
    pub fn entities_with<T: Component>(&self) -> impl Iterator<Item = Entity> + '_ {
        let registry = self.types.lookup::<T>().and_then(|id| self.erased(id));
        let len = registry.map_or(0, ErasedRegistry::len);
        (0..len).filter_map(move |address| registry?.owner_at(address))
    }

    /// Iterates the entities holding components of both `A` and `B`.
    pub fn entities_with_2<A: Component, B: Component>(
        &self,
    ) -> impl Iterator<Item = Entity> + '_ {
        self.entities_matching(vec![self.types.lookup::<A>(), self.types.lookup::<B>()])
    }

    /// Iterates the entities holding components of `A`, `B`, and `C`.
    pub fn entities_with_3<A: Component, B: Component, C: Component>(
        &self,
    ) -> impl Iterator<Item = Entity> + '_ {
        self.entities_matching(vec![
            self.types.lookup::<A>(),
            self.types.lookup::<B>(),
            self.types.lookup::<C>(),
        ])
    }

    /// Iterates the entities holding components of `A` through `D`.
    pub fn entities_with_4<A: Component, B: Component, C: Component, D: Component>(
        &self,
    ) -> impl Iterator<Item = Entity> + '_ {
        self.entities_matching(vec![
            self.types.lookup::<A>(),
            self.types.lookup::<B>(),
            self.types.lookup::<C>(),
            self.types.lookup::<D>(),
        ])
    }

    /// Iterates the entities holding components of `A` through `E`.
    pub fn entities_with_5<A: Component, B: Component, C: Component, D: Component, E: Component>(
        &self,
    ) -> impl Iterator<Item = Entity> + '_ {
        self.entities_matching(vec![
            self.types.lookup::<A>(),
            self.types.lookup::<B>(),
            self.types.lookup::<C>(),
            self.types.lookup::<D>(),
            self.types.lookup::<E>(),
        ])
    }

    /// Destroys everything marked since the previous pass, in a fixed
    /// order:
    ///
    /// 1. snapshot and dedupe the doomed entities, then queue every
    ///    component of each one's current archetype;
    /// 2. sort and dedupe the destruction buffer, so a component queued
    ///    both individually and by a whole-entity mark dies once;
    /// 3. invoke destruction callbacks, before anything is removed;
    /// 4. bulk-remove the queued components per type;
    /// 5. advance surviving entities' archetypes past the removed types;
    /// 6. (entity-level destruction callbacks would run here);
    /// 7. return doomed ids to the free list and bump their versions;
    /// 8. clear the buffer, keeping its allocations.
    ///
    /// Requires `&mut self`, so it cannot run while a query iterator is
    /// alive.
    pub fn process_destruction(&mut self) {
        // Step 1. Stale marks (an entity marked twice is destroyed on the
        // first pass) are dropped with the liveness filter.
        let mut doomed = self.pending_destroy.take();
        doomed.retain(|entity| self.is_live(*entity));
        doomed.sort_unstable();
        let boundary = distinct_prefix(&mut doomed);
        doomed.truncate(boundary);

        let mut buffer = self.destruction_buffer.take();
        for &entity in &doomed {
            let archetype_id = *self
                .entity_archetypes
                .get(entity.id)
                .expect("doomed entities were filtered for liveness");
            for &type_id in self.archetypes.get(archetype_id).type_ids() {
                buffer.queue_unchecked(entity, type_id);
            }
        }

        // Step 2.
        buffer.sort_and_dedup();

        // Step 3.
        for (type_id, entities) in buffer.bins() {
            self.callbacks.invoke_unchecked(type_id, entities);
        }

        // Step 4.
        for (type_id, entities) in buffer.bins() {
            self.registries[type_id.index()]
                .as_mut()
                .expect("queued components come from registered types")
                .remove_bulk_unchecked(entities);
        }

        // Step 5. Doomed entities skip the walk; their whole archetype
        // record is dropped in step 7.
        for (type_id, entities) in buffer.bins() {
            for &entity in entities {
                if doomed.binary_search(&entity).is_ok() {
                    continue;
                }
                let current = *self
                    .entity_archetypes
                    .get(entity.id)
                    .expect("surviving entity has an archetype");
                let next = self.archetypes.transition_remove(current, type_id);
                *self
                    .entity_archetypes
                    .get_mut(entity.id)
                    .expect("surviving entity has an archetype") = next;
            }
        }

        // Step 6: reserved for entity-level destruction callbacks.

        // Step 7.
        for &entity in &doomed {
            self.entity_archetypes.remove(entity.id);
            if let Some(version) = self.entity_versions.get_mut(entity.id) {
                *version += 1;
            }
        }

        // Step 8.
        buffer.clear();
        *self.destruction_buffer.borrow_mut() = buffer;
        doomed.clear();
        *self.pending_destroy.borrow_mut() = doomed;
    }

    /// Interns `T` in the type registry and lazily creates its component
    /// registry.
    fn register_type<T: Component>(&mut self) -> Result<ComponentTypeId> {
        let type_id = self.types.register::<T>()?;
        let index = type_id.index();
        if self.registries.len() <= index {
            self.registries.resize_with(index + 1, || None);
        }
        if self.registries[index].is_none() {
            self.registries[index] = Some(Box::new(ComponentRegistry::<T>::new(type_id)));
        }
        Ok(type_id)
    }

    fn erased(&self, type_id: ComponentTypeId) -> Option<&dyn ErasedRegistry> {
        self.registries
            .get(type_id.index())?
            .as_deref()
            .map(|r| r as &dyn ErasedRegistry)
    }

    /// Typed view of a registry known to exist for `type_id`.
    fn typed_mut<T: Component>(&mut self, type_id: ComponentTypeId) -> &mut ComponentRegistry<T> {
        self.registries[type_id.index()]
            .as_mut()
            .expect("registry exists for a registered type")
            .as_any_mut()
            .downcast_mut::<ComponentRegistry<T>>()
            .expect("registry slot matches its component type")
    }

    /// Shared query machinery for the multi-component iterators.
    ///
    /// Walks the owner array of the rarest requested type and filters the
    /// rest by membership, so the walk length is bounded by the smallest
    /// registry. Any unregistered type means no entity can match.
    fn entities_matching(
        &self,
        type_ids: Vec<Option<ComponentTypeId>>,
    ) -> impl Iterator<Item = Entity> + '_ {
        let registries: Option<Vec<&dyn ErasedRegistry>> = type_ids
            .into_iter()
            .map(|type_id| type_id.and_then(|id| self.erased(id)))
            .collect();
        let registries = registries.unwrap_or_default();

        let rarest_index = registries
            .iter()
            .enumerate()
            .min_by_key(|(_, r)| r.len())
            .map(|(index, _)| index);
        let rarest = rarest_index.map(|index| registries[index]);
        let len = rarest.map_or(0, ErasedRegistry::len);

        (0..len)
            .filter_map(move |address| rarest?.owner_at(address))
            .filter(move |entity| {
                registries
                    .iter()
                    .enumerate()
                    .all(|(index, r)| Some(index) == rarest_index || r.has(*entity))
            })
    }
}

impl fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRegistry")
            .field("entities", &self.entity_archetypes.len())
            .field("component_types", &self.types.len())
            .field("archetypes", &self.archetypes.len())
            .finish_non_exhaustive()
    }
}
