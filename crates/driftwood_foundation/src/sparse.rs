//! Paged sparse maps keyed by small non-negative integers.
//!
//! A [`SparseMap`] gives array-like O(1) access over a large, mostly-unused
//! key range: keys are split into a page index and an offset, pages are
//! allocated lazily on first write, and an unallocated page costs only a
//! `None` in the page vector. [`FreeListSparseMap`] additionally manages
//! key allocation and reuse for callers that do not care which key they
//! get, such as entity and callback id allocation.

use std::fmt;

const PAGE_BITS: u32 = 9;
const PAGE_SIZE: usize = 1 << PAGE_BITS;

/// How many keys the free list grows by when exhausted.
const FREE_LIST_GROW_STEP: usize = 128;

/// Free-list entry marking a key as currently allocated.
const ALLOCATED: i64 = -2;
/// Free-list entry marking the end of the list.
const END_OF_LIST: i64 = -1;

type Page<V> = Box<[Option<V>]>;

fn split_key(key: u32) -> (usize, usize) {
    ((key >> PAGE_BITS) as usize, key as usize & (PAGE_SIZE - 1))
}

/// A paged map from `u32` keys to values.
///
/// Slot occupancy is carried by the `Option` in each page slot, so
/// membership tests, lookups, inserts, and removals are all O(1) with no
/// hashing.
pub struct SparseMap<V> {
    pages: Vec<Option<Page<V>>>,
    len: usize,
}

impl<V> Default for SparseMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> SparseMap<V> {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pages: Vec::new(),
            len: 0,
        }
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns true if `key` is present.
    #[must_use]
    pub fn contains(&self, key: u32) -> bool {
        let (page, offset) = split_key(key);
        matches!(
            self.pages.get(page),
            Some(Some(slots)) if slots[offset].is_some()
        )
    }

    /// Returns a reference to the value for `key`, if present.
    #[must_use]
    pub fn get(&self, key: u32) -> Option<&V> {
        let (page, offset) = split_key(key);
        self.pages.get(page)?.as_ref()?[offset].as_ref()
    }

    /// Returns a mutable reference to the value for `key`, if present.
    #[must_use]
    pub fn get_mut(&mut self, key: u32) -> Option<&mut V> {
        let (page, offset) = split_key(key);
        self.pages.get_mut(page)?.as_mut()?[offset].as_mut()
    }

    /// Inserts `value` at `key` if the key is vacant.
    ///
    /// Returns a mutable reference to the stored value, or `None` if the
    /// key was already present (the existing value is left untouched;
    /// present keys must be removed before they can be re-inserted).
    pub fn insert(&mut self, key: u32, value: V) -> Option<&mut V> {
        let (page, offset) = split_key(key);

        if self.pages.len() <= page {
            self.pages.resize_with(page + 1, || None);
        }

        let slots = self.pages[page].get_or_insert_with(|| {
            let mut page: Vec<Option<V>> = Vec::with_capacity(PAGE_SIZE);
            page.resize_with(PAGE_SIZE, || None);
            page.into_boxed_slice()
        });

        if slots[offset].is_some() {
            return None;
        }

        slots[offset] = Some(value);
        self.len += 1;
        slots[offset].as_mut()
    }

    /// Removes and returns the value for `key`, if present.
    pub fn remove(&mut self, key: u32) -> Option<V> {
        let (page, offset) = split_key(key);
        let removed = self.pages.get_mut(page)?.as_mut()?[offset].take();
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }
}

impl<V: fmt::Debug> fmt::Debug for SparseMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.pages.iter().enumerate().flat_map(|(p, page)| {
            page.iter()
                .flat_map(move |slots| {
                    slots
                        .iter()
                        .enumerate()
                        .filter_map(move |(o, v)| Some((p * PAGE_SIZE + o, v.as_ref()?)))
                })
        });
        f.debug_map().entries(entries).finish()
    }
}

/// A sparse map that also allocates its own keys.
///
/// Keys are handed out from an intrusive free list that grows in fixed
/// chunks; removing a key pushes it back on the list head, so a removed
/// key is the first candidate for reuse.
pub struct FreeListSparseMap<V> {
    map: SparseMap<V>,
    free_list: Vec<i64>,
    first_free: i64,
}

impl<V> Default for FreeListSparseMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> FreeListSparseMap<V> {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            map: SparseMap::new(),
            free_list: Vec::new(),
            first_free: END_OF_LIST,
        }
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns true if `key` is currently allocated.
    #[must_use]
    pub fn contains(&self, key: u32) -> bool {
        self.map.contains(key)
    }

    /// Returns a reference to the value for `key`, if allocated.
    #[must_use]
    pub fn get(&self, key: u32) -> Option<&V> {
        self.map.get(key)
    }

    /// Returns a mutable reference to the value for `key`, if allocated.
    #[must_use]
    pub fn get_mut(&mut self, key: u32) -> Option<&mut V> {
        self.map.get_mut(key)
    }

    /// Stores `value` under a fresh or recycled key and returns the key.
    pub fn insert(&mut self, value: V) -> u32 {
        let key = self.allocate_key();
        let inserted = self.map.insert(key, value).is_some();
        debug_assert!(inserted, "free list handed out an occupied key");
        key
    }

    /// Removes and returns the value for `key`, returning the key to the
    /// free list head for reuse.
    pub fn remove(&mut self, key: u32) -> Option<V> {
        let removed = self.map.remove(key)?;
        debug_assert_eq!(self.free_list[key as usize], ALLOCATED);
        self.free_list[key as usize] = self.first_free;
        self.first_free = i64::from(key);
        Some(removed)
    }

    fn allocate_key(&mut self) -> u32 {
        if self.first_free == END_OF_LIST {
            self.grow_free_list();
        }

        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        let key = self.first_free as usize;
        self.first_free = self.free_list[key];
        self.free_list[key] = ALLOCATED;
        u32::try_from(key).expect("free list key exceeds u32 range")
    }

    fn grow_free_list(&mut self) {
        // New keys are chained so that the lowest new key is handed out
        // first and the last new entry links to the old list head.
        let start = self.free_list.len();
        let end = start + FREE_LIST_GROW_STEP;
        #[allow(clippy::cast_possible_wrap)]
        self.free_list.extend((start..end).map(|k| k as i64 + 1));
        *self
            .free_list
            .last_mut()
            .expect("free list is non-empty after growth") = self.first_free;
        #[allow(clippy::cast_possible_wrap)]
        {
            self.first_free = start as i64;
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for FreeListSparseMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FreeListSparseMap")
            .field("map", &self.map)
            .field("first_free", &self.first_free)
            .finish_non_exhaustive()
    }
}
