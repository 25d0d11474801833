//! # Entity Management
//!
//! Entities are lightweight identifiers consisting of:
//! - An index, reused by component stores as their instance index
//! - A generation counter for detecting stale references
//!
//! Index 0 is never handed out: every component store keeps slot 0 as its
//! "no instance" sentinel.

use bytemuck::{Pod, Zeroable};

/// Unique identifier for an entity.
///
/// The ID is split into two parts:
/// - Lower 32 bits: dense index
/// - Upper 32 bits: generation counter for detecting stale references
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Pod, Zeroable)]
#[repr(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new entity ID from index and generation.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64))
    }

    /// Returns the index portion of the entity ID.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Returns the generation portion of the entity ID.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Null/invalid entity ID.
    pub const NULL: Self = Self(u64::MAX);

    /// Checks if this entity ID is null/invalid.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u64::MAX
    }

    /// The packed representation.
    #[inline]
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    /// Rebuilds an ID from [`EntityId::to_bits`].
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::NULL
    }
}

/// Dense index of an entity, as used by component stores.
#[inline]
#[must_use]
pub const fn entity_index(entity: EntityId) -> u32 {
    entity.index()
}

/// Hands out entity IDs and recycles their indices.
///
/// Indices start at 1 and are reused LIFO after [`Entities::despawn`], with
/// the generation bumped so that old IDs no longer match.
///
/// # Example
///
/// ```rust
/// use strata_core::Entities;
///
/// let mut entities = Entities::new();
/// let a = entities.spawn();
/// assert!(entities.despawn(a));
///
/// let b = entities.spawn();
/// assert_eq!(a.index(), b.index());
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone)]
pub struct Entities {
    /// Current generation per index; slot 0 unused.
    generations: Vec<u32>,
    /// Liveness per index; slot 0 unused.
    alive: Vec<bool>,
    /// Free list of entity indices for reuse.
    free_indices: Vec<u32>,
    /// Number of currently alive entities.
    alive_count: usize,
}

impl Entities {
    /// Creates an empty allocator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            generations: vec![0],
            alive: vec![false],
            free_indices: Vec::new(),
            alive_count: 0,
        }
    }

    /// Creates an allocator with room for `capacity` entities before growing.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let mut entities = Self::new();
        entities.generations.reserve(capacity);
        entities.alive.reserve(capacity);
        entities
    }

    /// Returns the number of currently alive entities.
    #[inline]
    #[must_use]
    pub const fn alive_count(&self) -> usize {
        self.alive_count
    }

    /// Largest index ever handed out (0 if none).
    #[inline]
    #[must_use]
    pub fn high_water(&self) -> u32 {
        (self.generations.len().max(1) - 1) as u32
    }

    /// Spawns a new entity, returning its ID.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX - 1` indices are live at once.
    pub fn spawn(&mut self) -> EntityId {
        let index = if let Some(index) = self.free_indices.pop() {
            let idx = index as usize;
            // Increment generation to invalidate old references
            self.generations[idx] = self.generations[idx].wrapping_add(1);
            self.alive[idx] = true;
            index
        } else {
            assert!(
                self.generations.len() < u32::MAX as usize,
                "entity index space exhausted"
            );
            let index = self.generations.len() as u32;
            self.generations.push(0);
            self.alive.push(true);
            index
        };

        self.alive_count += 1;
        EntityId::new(index, self.generations[index as usize])
    }

    /// Despawns an entity, freeing its index for reuse.
    ///
    /// Returns `false` if the ID is null, stale or already dead.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        if !self.is_alive(id) {
            return false;
        }

        self.alive[id.index() as usize] = false;
        self.alive_count -= 1;
        self.free_indices.push(id.index());
        true
    }

    /// Checks if an entity is alive.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        if id.is_null() || id.index() == 0 {
            return false;
        }

        let idx = id.index() as usize;
        idx < self.generations.len()
            && self.alive[idx]
            && self.generations[idx] == id.generation()
    }

    /// Iterates over every alive entity in index order.
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.alive
            .iter()
            .enumerate()
            .filter(|(_, alive)| **alive)
            .map(|(idx, _)| EntityId::new(idx as u32, self.generations[idx]))
    }
}

impl Default for Entities {
    fn default() -> Self {
        Self::new()
    }
}
