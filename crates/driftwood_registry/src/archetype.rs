//! Archetypes and the memoized archetype transition graph.
//!
//! An archetype is the canonical representation of "the set of component
//! types an entity currently has". Archetypes are interned: the database
//! holds at most one instance per distinct type set, entities refer to
//! archetypes by id, and single-component add/remove transitions between
//! archetypes are memoized in per-archetype jump tables.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use driftwood_foundation::ComponentTypeId;

/// Identifier of an interned archetype, stable for the database's lifetime.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArchetypeId(u16);

impl ArchetypeId {
    /// The error archetype: the result of an invalid transition (duplicate
    /// add or remove-of-absent). A sentinel, never storage.
    pub const ERROR: ArchetypeId = ArchetypeId(0);

    /// The empty archetype: the initial archetype of every new entity.
    pub const EMPTY: ArchetypeId = ArchetypeId(1);

    /// Returns true if this is the error sentinel.
    #[must_use]
    pub const fn is_error(self) -> bool {
        self.0 == 0
    }

    /// Returns the raw index of this archetype id.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ArchetypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_error() {
            write!(f, "ArchetypeId(error)")
        } else {
            write!(f, "ArchetypeId({})", self.0)
        }
    }
}

/// An immutable, sorted, duplicate-free set of component type ids with a
/// cached hash.
///
/// Two archetypes are equal iff their type sequences are equal (and neither
/// is the error archetype), regardless of the order components were added.
#[derive(Clone)]
pub struct Archetype {
    type_ids: Vec<ComponentTypeId>,
    hash: u64,
    is_error: bool,
}

impl Archetype {
    /// Builds an archetype from an arbitrary list of type ids, sorting and
    /// deduplicating it.
    #[must_use]
    pub fn from_type_ids(mut type_ids: Vec<ComponentTypeId>) -> Self {
        type_ids.sort_unstable();
        type_ids.dedup();
        Self::from_sorted(type_ids)
    }

    /// Builds an archetype from an already sorted, duplicate-free list.
    fn from_sorted(type_ids: Vec<ComponentTypeId>) -> Self {
        debug_assert!(type_ids.is_sorted());
        let mut hasher = DefaultHasher::new();
        type_ids.hash(&mut hasher);
        Self {
            hash: hasher.finish(),
            type_ids,
            is_error: false,
        }
    }

    /// The distinguished error archetype value.
    #[must_use]
    fn error() -> Self {
        Self {
            type_ids: Vec::new(),
            hash: 0,
            is_error: true,
        }
    }

    /// Returns true if this is the error archetype.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.is_error
    }

    /// The sorted component type ids of this archetype.
    #[must_use]
    pub fn type_ids(&self) -> &[ComponentTypeId] {
        &self.type_ids
    }

    /// Returns true if this archetype contains `type_id`.
    #[must_use]
    pub fn contains(&self, type_id: ComponentTypeId) -> bool {
        self.type_ids.binary_search(&type_id).is_ok()
    }
}

impl PartialEq for Archetype {
    fn eq(&self, other: &Self) -> bool {
        self.is_error == other.is_error && self.type_ids == other.type_ids
    }
}

impl Eq for Archetype {}

impl Hash for Archetype {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.is_error.hash(state);
        state.write_u64(self.hash);
    }
}

impl fmt::Debug for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_error {
            write!(f, "Archetype(error)")
        } else {
            f.debug_list().entries(&self.type_ids).finish()
        }
    }
}

/// Per-archetype memoization of single-component transitions.
#[derive(Default)]
struct JumpTable {
    add: HashMap<ComponentTypeId, ArchetypeId>,
    remove: HashMap<ComponentTypeId, ArchetypeId>,
}

/// Append-only table of every archetype ever observed, with memoized
/// add/remove transitions between them.
pub struct ArchetypeDatabase {
    archetypes: Vec<Archetype>,
    ids: HashMap<Archetype, ArchetypeId>,
    jump_tables: Vec<JumpTable>,
}

impl Default for ArchetypeDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchetypeDatabase {
    /// Creates a database seeded with the error and empty archetypes.
    #[must_use]
    pub fn new() -> Self {
        let mut db = Self {
            archetypes: Vec::new(),
            ids: HashMap::new(),
            jump_tables: Vec::new(),
        };

        let error = db.intern(Archetype::error());
        debug_assert_eq!(error, ArchetypeId::ERROR);
        let empty = db.intern(Archetype::from_sorted(Vec::new()));
        debug_assert_eq!(empty, ArchetypeId::EMPTY);

        db
    }

    /// Returns the archetype value for an id.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this database.
    #[must_use]
    pub fn get(&self, id: ArchetypeId) -> &Archetype {
        &self.archetypes[id.index()]
    }

    /// Returns the number of interned archetypes, including the error and
    /// empty archetypes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    /// Returns false: the database always holds at least the two seeded
    /// archetypes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The archetype an entity of `src` moves to when a component of
    /// `type_id` is added.
    ///
    /// Returns [`ArchetypeId::ERROR`] for a duplicate add (the source
    /// archetype already contains `type_id`). Transitions out of the error
    /// archetype also land on the error archetype.
    pub fn transition_add(&mut self, src: ArchetypeId, type_id: ComponentTypeId) -> ArchetypeId {
        if let Some(&next) = self.jump_tables[src.index()].add.get(&type_id) {
            return next;
        }

        let src_archetype = &self.archetypes[src.index()];
        let next = if src_archetype.is_error() || src_archetype.contains(type_id) {
            ArchetypeId::ERROR
        } else {
            let mut type_ids = src_archetype.type_ids().to_vec();
            let position = type_ids
                .binary_search(&type_id)
                .expect_err("duplicate add was checked above");
            type_ids.insert(position, type_id);
            self.intern(Archetype::from_sorted(type_ids))
        };

        self.jump_tables[src.index()].add.insert(type_id, next);
        next
    }

    /// The archetype an entity of `src` moves to when its component of
    /// `type_id` is removed.
    ///
    /// Returns [`ArchetypeId::ERROR`] if the source archetype does not
    /// contain `type_id`.
    pub fn transition_remove(&mut self, src: ArchetypeId, type_id: ComponentTypeId) -> ArchetypeId {
        if let Some(&next) = self.jump_tables[src.index()].remove.get(&type_id) {
            return next;
        }

        let src_archetype = &self.archetypes[src.index()];
        let next = match src_archetype.type_ids().binary_search(&type_id) {
            Err(_) => ArchetypeId::ERROR,
            Ok(position) => {
                let mut type_ids = src_archetype.type_ids().to_vec();
                type_ids.remove(position);
                self.intern(Archetype::from_sorted(type_ids))
            }
        };

        self.jump_tables[src.index()].remove.insert(type_id, next);
        next
    }

    /// Returns the id for an archetype value, interning it if unseen.
    fn intern(&mut self, archetype: Archetype) -> ArchetypeId {
        if let Some(&id) = self.ids.get(&archetype) {
            return id;
        }

        #[allow(clippy::cast_possible_truncation)]
        let id = ArchetypeId(self.archetypes.len() as u16);
        self.archetypes.push(archetype.clone());
        self.ids.insert(archetype, id);
        self.jump_tables.push(JumpTable::default());
        id
    }
}

impl fmt::Debug for ArchetypeDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchetypeDatabase")
            .field("archetypes", &self.archetypes)
            .finish_non_exhaustive()
    }
}
