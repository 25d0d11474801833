//! # Instance Handles
//!
//! A component instance is addressed by the dense index of the entity that
//! owns it. The handle also remembers the entity's generation, so a store can
//! tell a live instance from a slot that has been reclaimed and reused, and a
//! marker type, so transform handles cannot be passed to a light store.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::num::NonZeroU32;

use crate::entity::EntityId;

/// Handle to one instance of component `M`.
///
/// `Option<Instance<M>>` is the nullable link type; it is the same size as
/// the handle because index 0 is never a valid instance.
pub struct Instance<M> {
    index: NonZeroU32,
    generation: u32,
    _marker: PhantomData<fn() -> M>,
}

impl<M> Instance<M> {
    /// Creates a handle from its parts.
    #[inline]
    #[must_use]
    pub const fn new(index: NonZeroU32, generation: u32) -> Self {
        Self {
            index,
            generation,
            _marker: PhantomData,
        }
    }

    /// The handle an entity's instance would have, or `None` for the null
    /// entity and index 0.
    #[inline]
    #[must_use]
    pub const fn from_entity(entity: EntityId) -> Option<Self> {
        if entity.is_null() {
            return None;
        }
        match NonZeroU32::new(entity.index()) {
            Some(index) => Some(Self::new(index, entity.generation())),
            None => None,
        }
    }

    /// Dense index of the instance.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index.get()
    }

    /// Slot of the instance in every field of its store.
    #[inline]
    #[must_use]
    pub const fn slot(self) -> usize {
        self.index.get() as usize
    }

    /// Generation of the owning entity when the instance was created.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    /// The entity this instance belongs to.
    #[inline]
    #[must_use]
    pub const fn entity(self) -> EntityId {
        EntityId::new(self.index.get(), self.generation)
    }
}

impl<M> Clone for Instance<M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M> Copy for Instance<M> {}

impl<M> PartialEq for Instance<M> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<M> Eq for Instance<M> {}

impl<M> Hash for Instance<M> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<M> fmt::Debug for Instance<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instance({}v{})", self.index, self.generation)
    }
}
