//! Destruction callback subscriptions.
//!
//! Callbacks are registered per (entity, component type) pair and invoked
//! exactly once, immediately before the component is physically removed.
//! Handles are versioned so that a handle kept after removal (or after the
//! callback fired) is detectably stale.

use std::fmt;

use driftwood_foundation::{ComponentTypeId, Entity, FreeListSparseMap, SparseMap};

/// A destruction callback. Receives the entity whose component is about to
/// be removed.
pub type DestructionCallback = Box<dyn FnMut(Entity)>;

/// Opaque, versioned reference to one registered destruction callback.
///
/// The default value is the null handle; removing a null or stale handle
/// returns `false` rather than erroring, since racing unregistrations are
/// an expected outcome.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CallbackHandle {
    id_plus_one: u32,
    version: u32,
}

impl CallbackHandle {
    /// Returns the null handle.
    #[must_use]
    pub const fn null() -> Self {
        Self {
            id_plus_one: 0,
            version: 0,
        }
    }

    /// Returns true if this is the null handle.
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.id_plus_one == 0
    }

    fn new(id: u32, version: u32) -> Self {
        Self {
            id_plus_one: id + 1,
            version,
        }
    }

    fn id(self) -> Option<u32> {
        self.id_plus_one.checked_sub(1)
    }
}

/// Where a callback id lives: its (type, entity) pair and its position in
/// that pair's backward list.
#[derive(Copy, Clone, Debug)]
struct ForwardLink {
    type_id: ComponentTypeId,
    entity_id: u32,
    slot: usize,
}

/// One registered callback in a backward list, tagged with its forward id.
struct BackwardLink {
    callback: DestructionCallback,
    id: u32,
}

/// Subscription table mapping (entity, component type) to destruction
/// callbacks.
///
/// The forward table allocates callback ids and records where each
/// callback sits; the backward tables (one sparse map per component type,
/// created lazily) hold the callbacks themselves, listed per entity; the
/// version table detects stale handles. A component type that never had a
/// callback registered costs a single slot check on the destruction path,
/// never a map probe.
#[derive(Default)]
pub(crate) struct CallbackTable {
    forward: FreeListSparseMap<ForwardLink>,
    backward: Vec<Option<SparseMap<Vec<BackwardLink>>>>,
    versions: SparseMap<u32>,
}

impl CallbackTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` for the (entity, type) pair. The caller
    /// guarantees the entity is live and has the component.
    pub fn add_unchecked(
        &mut self,
        entity: Entity,
        type_id: ComponentTypeId,
        callback: DestructionCallback,
    ) -> CallbackHandle {
        let id = self.forward.insert(ForwardLink {
            type_id,
            entity_id: entity.id,
            slot: 0,
        });

        let slot = {
            let list = self.backward_list_mut(entity.id, type_id);
            list.push(BackwardLink { callback, id });
            list.len() - 1
        };
        self.forward
            .get_mut(id)
            .expect("forward link was just inserted")
            .slot = slot;

        let version = match self.versions.get_mut(id) {
            Some(version) => {
                *version += 1;
                *version
            }
            None => {
                self.versions.insert(id, 1);
                1
            }
        };

        CallbackHandle::new(id, version)
    }

    /// Unregisters the callback behind `handle`.
    ///
    /// Returns false for a null handle or one whose version no longer
    /// matches (already removed, or already fired and auto-removed).
    pub fn remove(&mut self, handle: CallbackHandle) -> bool {
        let Some(id) = handle.id() else {
            return false;
        };
        let Some(forward) = self.forward.get(id).copied() else {
            return false;
        };
        if self.versions.get(id) != Some(&handle.version) {
            return false;
        }

        if let Some(version) = self.versions.get_mut(id) {
            *version += 1;
        }

        let table = self.backward[forward.type_id.index()]
            .as_mut()
            .expect("backward table exists for a registered callback");
        let list = table
            .get_mut(forward.entity_id)
            .expect("backward list exists for a registered callback");

        // Swap-remove from the backward list, patching the forward link of
        // the element moved into the vacated slot.
        let moved = list.swap_remove(forward.slot);
        debug_assert_eq!(moved.id, id);
        if let Some(swapped_in) = list.get(forward.slot) {
            self.forward
                .get_mut(swapped_in.id)
                .expect("swapped-in callback has a forward link")
                .slot = forward.slot;
        }
        if list.is_empty() {
            table.remove(forward.entity_id);
        }

        self.forward.remove(id);
        true
    }

    /// Invokes and auto-removes every callback registered for the given
    /// (type, entity) pairs.
    ///
    /// The caller guarantees the entities are distinct. Each entity's whole
    /// list is dropped in bulk after its callbacks run, so no per-element
    /// link repair is needed; versions are bumped so outstanding handles to
    /// the fired callbacks read as stale.
    pub fn invoke_unchecked(&mut self, type_id: ComponentTypeId, entities: &[Entity]) {
        // Types that never registered a callback short-circuit on the slot
        // check. Most component types take this path.
        let Some(Some(table)) = self.backward.get_mut(type_id.index()) else {
            return;
        };
        if table.is_empty() {
            return;
        }

        for entity in entities {
            let Some(mut list) = table.remove(entity.id) else {
                continue;
            };
            for link in &mut list {
                (link.callback)(*entity);
            }
            for link in &list {
                if let Some(version) = self.versions.get_mut(link.id) {
                    *version += 1;
                }
                self.forward.remove(link.id);
            }
        }
    }

    fn backward_list_mut(
        &mut self,
        entity_id: u32,
        type_id: ComponentTypeId,
    ) -> &mut Vec<BackwardLink> {
        let index = type_id.index();
        if self.backward.len() <= index {
            self.backward.resize_with(index + 1, || None);
        }
        let table = self.backward[index].get_or_insert_with(SparseMap::new);

        if !table.contains(entity_id) {
            table.insert(entity_id, Vec::new());
        }
        table
            .get_mut(entity_id)
            .expect("backward list was just ensured")
    }
}

impl fmt::Debug for CallbackTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackTable")
            .field("registered", &self.forward.len())
            .finish_non_exhaustive()
    }
}
