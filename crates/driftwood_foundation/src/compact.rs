//! Block-allocated dense array with swap-removal.

use std::fmt;
use std::mem;

const BLOCK_BITS: usize = 7;
const BLOCK_SIZE: usize = 1 << BLOCK_BITS;

/// A growable dense array allocated in fixed-size blocks.
///
/// Growth allocates a new block instead of reallocating, so the address of
/// an existing element is stable for its lifetime in the array. Removal is
/// [`swap_remove`](Self::swap_remove) only: O(1), but it reorders the
/// array, so callers must treat element order as insignificant and repair
/// any external index that referenced the moved last element.
///
/// Vacated slots are reset to `T::default()`, hence the `Default` bound.
pub struct CompactVec<T: Default> {
    blocks: Vec<Box<[T; BLOCK_SIZE]>>,
    len: usize,
}

impl<T: Default> Default for CompactVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Default> CompactVec<T> {
    /// Creates an empty array.
    #[must_use]
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            len: 0,
        }
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the array is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends a value and returns its index.
    ///
    /// O(1) amortized; allocates a new block at capacity boundaries and
    /// never moves existing elements.
    pub fn push(&mut self, value: T) -> usize {
        if self.len == self.blocks.len() * BLOCK_SIZE {
            self.blocks.push(Box::new(std::array::from_fn(|_| T::default())));
        }

        let index = self.len;
        self.len += 1;
        *self.slot_mut(index) = value;
        index
    }

    /// Returns a reference to the element at `index`, if in bounds.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        if index < self.len {
            Some(self.slot(index))
        } else {
            None
        }
    }

    /// Returns a mutable reference to the element at `index`, if in bounds.
    #[must_use]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index < self.len {
            Some(self.slot_mut(index))
        } else {
            None
        }
    }

    /// Removes the element at `index` by moving the last element into its
    /// place, returning the removed value.
    ///
    /// Returns `None` if `index` is out of bounds. The vacated last slot is
    /// reset to `T::default()`.
    pub fn swap_remove(&mut self, index: usize) -> Option<T> {
        if index >= self.len {
            return None;
        }

        let last = self.len - 1;
        let filler = mem::take(self.slot_mut(last));
        self.len = last;

        if index == last {
            Some(filler)
        } else {
            Some(mem::replace(self.slot_mut(index), filler))
        }
    }

    /// Iterates over the elements in storage order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        (0..self.len).map(|i| self.slot(i))
    }

    fn slot(&self, index: usize) -> &T {
        &self.blocks[index >> BLOCK_BITS][index & (BLOCK_SIZE - 1)]
    }

    fn slot_mut(&mut self, index: usize) -> &mut T {
        &mut self.blocks[index >> BLOCK_BITS][index & (BLOCK_SIZE - 1)]
    }
}

impl<T: Default + fmt::Debug> fmt::Debug for CompactVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
