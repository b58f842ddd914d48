//! Entity identifiers with generational versions.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Entity identifier with a generational version for stale reference detection.
///
/// The `id` is a dense slot index that is recycled after destruction; the
/// `version` is bumped by the registry every time the slot is reused, so a
/// handle kept across a destruction always compares as dead.
///
/// Version `0` is reserved for the null entity, which is also the `Default`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Entity {
    /// Reusable slot index.
    pub id: u32,
    /// Generation counter; `0` means null.
    pub version: u64,
}

impl Entity {
    /// Creates a new entity handle with the given id and version.
    #[must_use]
    pub const fn new(id: u32, version: u64) -> Self {
        Self { id, version }
    }

    /// Returns the sentinel value representing "no entity".
    #[must_use]
    pub const fn null() -> Self {
        Self { id: 0, version: 0 }
    }

    /// Returns true if this handle is the null sentinel.
    ///
    /// A non-null handle can still be stale; only the owning registry can
    /// tell a live handle from a dead one.
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.version == 0
    }

    /// Sort key ordering entities by id first, then version.
    ///
    /// This is the ordering the destruction pipeline sorts by before
    /// deduplicating queued entities.
    #[must_use]
    pub const fn sort_key(self) -> (u32, u64) {
        (self.id, self.version)
    }
}

impl Ord for Entity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for Entity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Entity(null)")
        } else {
            write!(f, "Entity({}v{})", self.id, self.version)
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Entity(null)")
        } else {
            write!(f, "Entity({})", self.id)
        }
    }
}
