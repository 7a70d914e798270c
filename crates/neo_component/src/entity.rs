//! Entity identities.
//!
//! Each [`ComponentStore`](crate::ComponentStore) owns one [`EntityAllocator`].
//! Ids start at 1 and only grow, so an id that has been handed out, live or
//! removed, never comes back.

use serde::{Deserialize, Serialize};

/// Identity of an object in the world. Carries no data of its own.
///
/// Whether an entity is alive is known only to the store that created it;
/// ask [`ComponentStore::is_alive`](crate::ComponentStore::is_alive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity(pub u64);

impl Entity {
    /// Reserved id 0. No store ever allocates it.
    pub const NULL: Entity = Entity(0);

    /// Wrap a raw id.
    #[must_use]
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// The raw id.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }

    /// Whether this is [`Entity::NULL`].
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Hands out entity ids for one store.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    /// Highest id allocated so far; 0 before the first allocation.
    last: u64,
}

impl EntityAllocator {
    /// An allocator whose first id will be 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next id.
    pub fn allocate(&mut self) -> Entity {
        self.last += 1;
        Entity(self.last)
    }

    /// How many ids have been handed out.
    #[must_use]
    pub fn allocated(&self) -> u64 {
        self.last
    }

    /// Whether `entity` came from this allocator, regardless of whether it is
    /// still alive.
    #[must_use]
    pub fn has_allocated(&self, entity: Entity) -> bool {
        (1..=self.last).contains(&entity.0)
    }
}
