//! Accumulation and deduplication of pending component destructions.

use std::collections::HashMap;

use driftwood_foundation::{ComponentTypeId, Entity, distinct_prefix};

/// Accumulates component destruction intents, binned by component type.
///
/// Nothing is destroyed here: the registry drains the buffer during
/// `process_destruction`, after sorting and deduplicating each bin so a
/// component queued both individually and by a whole-entity sweep is
/// destroyed at most once.
#[derive(Default)]
pub(crate) struct DestructionBuffer {
    bins: HashMap<ComponentTypeId, Vec<Entity>>,
}

impl DestructionBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues removal of `entity`'s component of `type_id`.
    ///
    /// The caller guarantees the entity currently has the component.
    /// Duplicate calls for the same pair are tolerated; they collapse in
    /// [`sort_and_dedup`](Self::sort_and_dedup).
    pub fn queue_unchecked(&mut self, entity: Entity, type_id: ComponentTypeId) {
        self.bins.entry(type_id).or_default().push(entity);
    }

    /// Sorts each bin by (id, version) and truncates it to its distinct
    /// prefix.
    pub fn sort_and_dedup(&mut self) {
        for bin in self.bins.values_mut() {
            bin.sort_unstable();
            let boundary = distinct_prefix(bin);
            bin.truncate(boundary);
        }
    }

    /// Iterates the `(type, entities)` bins. Empty bins are skipped.
    pub fn bins(&self) -> impl Iterator<Item = (ComponentTypeId, &[Entity])> {
        self.bins
            .iter()
            .filter(|(_, bin)| !bin.is_empty())
            .map(|(type_id, bin)| (*type_id, bin.as_slice()))
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.bins.values().all(Vec::is_empty)
    }

    /// Empties every bin, keeping the allocations for reuse next pass.
    pub fn clear(&mut self) {
        for bin in self.bins.values_mut() {
            bin.clear();
        }
    }
}
