//! # Transform Component
//!
//! Position, rotation and scale of every entity that has one, plus the
//! parent/child tree, all kept in a single [`FieldStore`].
//!
//! ## Layout
//!
//! Slot `i` of every field belongs to the entity with index `i`, so looking
//! up an entity's transform is an index extraction, not a map lookup. Slot 0
//! is the "no instance" sentinel and link fields use 0 for "none".
//!
//! ```text
//! slot:         0     1      2      3
//! parent:       0     0      1      1
//! first_child:  0     2      0      0
//! next_sibling: 0     0      3      0
//! prev_sibling: 0     0      0      2
//! ```
//!
//! ## World matrices
//!
//! `world(n) = world(parent(n)) * local(n)` holds after every public
//! operation. Each local mutation re-derives the world matrix of the node and
//! its whole subtree.

use std::fmt;

use glam::{Mat4, Quat, Vec3};
use strata_core::{EntityId, FieldStore, Instance};

use crate::config::TransformConfig;
use crate::error::{SceneError, SceneResult};

/// Logs and panics when a tree invariant is broken.
macro_rules! invariant {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            tracing::error!($($arg)+);
            panic!($($arg)+);
        }
    };
}

mod columns;
mod descriptor;
mod hierarchy;
mod pose;
mod propagate;

use columns::{Columns, FIELDS};
pub use descriptor::TransformDescriptor;
pub use hierarchy::{Ancestors, Children, Descendants};

/// Marker type naming the transform component in [`Instance`] handles.
#[derive(Debug)]
pub enum Transform {}

/// Handle to one transform.
pub type TransformInstance = Instance<Transform>;

/// Struct-of-arrays store of transforms and their hierarchy.
///
/// # Example
///
/// ```rust
/// use glam::Vec3;
/// use strata_core::Entities;
/// use strata_scene::{TransformComponent, TransformDescriptor};
///
/// let mut entities = Entities::new();
/// let mut transforms = TransformComponent::new()?;
///
/// let root = transforms.create(entities.spawn(), None, None)?;
/// let child = transforms.create(
///     entities.spawn(),
///     Some(&TransformDescriptor::at(Vec3::X)),
///     Some(root),
/// )?;
///
/// transforms.set_position(root, Vec3::new(5.0, 0.0, 0.0));
/// assert_eq!(transforms.world_position(child), Vec3::new(6.0, 0.0, 0.0));
/// # Ok::<(), strata_scene::SceneError>(())
/// ```
pub struct TransformComponent {
    store: FieldStore,
    columns: Columns,
    config: TransformConfig,
    /// Largest index ever given a transform.
    count: u32,
    /// Live transforms.
    len: usize,
    /// Reused by worklist propagation.
    stack: Vec<(u32, Mat4)>,
}

impl TransformComponent {
    /// Creates an empty component with the default configuration.
    ///
    /// # Errors
    ///
    /// As for [`TransformComponent::with_config`].
    pub fn new() -> SceneResult<Self> {
        Self::with_config(TransformConfig::default())
    }

    /// Creates an empty component.
    ///
    /// # Errors
    ///
    /// [`SceneError::Config`] if the store configuration is out of range.
    pub fn with_config(config: TransformConfig) -> SceneResult<Self> {
        config.store.validate()?;
        let store = FieldStore::new(&FIELDS, config.store.initial_capacity)?;
        let columns = Columns::resolve(&store)?;

        tracing::trace!(
            capacity = store.capacity(),
            propagation = ?config.propagation,
            "transform component created"
        );

        Ok(Self {
            store,
            columns,
            config,
            count: 0,
            len: 0,
            stack: Vec::new(),
        })
    }

    /// The active configuration.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &TransformConfig {
        &self.config
    }

    /// Read-only access to the backing store.
    #[inline]
    #[must_use]
    pub const fn store(&self) -> &FieldStore {
        &self.store
    }

    /// Number of live transforms.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no transform is live.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Largest instance index ever created. Valid handles satisfy
    /// `0 < index <= count`.
    #[inline]
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Slots allocated in every field, sentinel included.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.store.capacity()
    }

    /// Creates a transform for `entity`.
    ///
    /// The instance is appended after the existing children of `parent`, or
    /// becomes a root. Without a descriptor the local transform is identity.
    /// Storage grows when the entity's index does not fit.
    ///
    /// # Errors
    ///
    /// - [`SceneError::ReservedEntity`] for the null entity or index 0
    /// - [`SceneError::StaleInstance`] if `parent` is not live
    /// - [`SceneError::AlreadyPresent`] if the slot holds a live transform
    /// - [`SceneError::Store`] if growing the store fails
    pub fn create(
        &mut self,
        entity: EntityId,
        descriptor: Option<&TransformDescriptor>,
        parent: Option<TransformInstance>,
    ) -> SceneResult<TransformInstance> {
        let instance =
            TransformInstance::from_entity(entity).ok_or(SceneError::ReservedEntity(entity))?;
        if let Some(parent) = parent {
            if !self.contains(parent) {
                return Err(SceneError::StaleInstance(parent.entity()));
            }
        }

        let slot = instance.slot();
        if slot >= self.store.capacity() {
            let capacity = self.config.store.capacity_for(self.store.capacity(), slot);
            self.store.resize(capacity)?;
        }
        if self.slot_is_live(slot) {
            return Err(SceneError::AlreadyPresent {
                entity,
                existing: self.store.get(self.columns.entity, slot),
            });
        }

        let (position, rotation, scale) = descriptor.copied().unwrap_or_default().resolve();
        self.reset_slot(slot);
        self.store.set(self.columns.entity, slot, entity);
        self.store.set(self.columns.local_position, slot, position);
        self.store.set(self.columns.local_rotation, slot, rotation);
        self.store.set(self.columns.local_scale, slot, scale);
        self.rebuild_local(slot);

        self.count = self.count.max(instance.index());
        self.len += 1;

        if let Some(parent) = parent {
            self.link_under(slot, parent.slot());
        }
        self.refresh(instance);

        tracing::trace!(
            entity = ?entity,
            parent = ?parent,
            "transform created"
        );

        Ok(instance)
    }

    /// The transform of `entity`, if it has a live one.
    #[must_use]
    pub fn for_entity(&self, entity: EntityId) -> Option<TransformInstance> {
        TransformInstance::from_entity(entity).filter(|&instance| self.contains(instance))
    }

    /// Like [`TransformComponent::for_entity`], as a `Result`.
    ///
    /// # Errors
    ///
    /// [`SceneError::NoInstance`] if `entity` has no live transform.
    pub fn instance_of(&self, entity: EntityId) -> SceneResult<TransformInstance> {
        self.for_entity(entity).ok_or(SceneError::NoInstance(entity))
    }

    /// Returns `true` if `instance` refers to a live transform.
    #[must_use]
    pub fn contains(&self, instance: TransformInstance) -> bool {
        let slot = instance.slot();
        instance.index() <= self.count
            && slot < self.store.capacity()
            && self.store.get(self.columns.entity, slot) == instance.entity()
    }

    /// Destroys `instance` and its whole subtree.
    ///
    /// Every removed slot is reset and can be reused by a later
    /// [`TransformComponent::create`]. Capacity is kept. Returns the number of
    /// transforms removed; 0 for a stale handle.
    pub fn destroy(&mut self, instance: TransformInstance) -> usize {
        if !self.contains(instance) {
            return 0;
        }

        let slot = instance.slot();
        self.unlink(slot);

        let removed: Vec<usize> = std::iter::once(instance)
            .chain(self.descendants(instance))
            .map(TransformInstance::slot)
            .collect();
        for &slot in &removed {
            self.reset_slot(slot);
        }
        self.len -= removed.len();

        tracing::debug!(
            entity = ?instance.entity(),
            removed = removed.len(),
            "transform subtree destroyed"
        );

        removed.len()
    }

    /// Destroys every live transform with index in `first..first + count`,
    /// with their subtrees. Returns the number of transforms removed.
    pub fn destroy_range(&mut self, first: u32, count: u32) -> usize {
        let end = first.saturating_add(count).min(self.count.saturating_add(1));
        let targets: Vec<_> = (first.max(1)..end)
            .filter_map(|index| self.handle_at(index))
            .collect();

        // Earlier subtrees may already contain later targets; those return 0.
        targets
            .into_iter()
            .map(|instance| self.destroy(instance))
            .sum()
    }

    /// Handle of the live transform in slot `index`, if any.
    fn handle_at(&self, index: u32) -> Option<TransformInstance> {
        let slot = index as usize;
        if !self.slot_is_live(slot) {
            return None;
        }
        TransformInstance::from_entity(self.store.get(self.columns.entity, slot))
    }

    /// A zeroed or reset slot never stores its own index.
    fn slot_is_live(&self, slot: usize) -> bool {
        slot != 0
            && slot <= self.count as usize
            && slot < self.store.capacity()
            && self.store.get(self.columns.entity, slot).index() as usize == slot
    }

    /// Slot of a handle that must be live.
    fn live_slot(&self, instance: TransformInstance) -> usize {
        invariant!(
            self.contains(instance),
            "transform handle {instance:?} is not live"
        );
        instance.slot()
    }

    fn reset_slot(&mut self, slot: usize) {
        let c = self.columns;
        self.store.zero_slot(slot);
        self.store.set(c.entity, slot, EntityId::NULL);
        self.store.set(c.local_rotation, slot, Quat::IDENTITY);
        self.store.set(c.local_scale, slot, Vec3::ONE);
        self.store.set(c.local_matrix, slot, Mat4::IDENTITY);
        self.store.set(c.world_matrix, slot, Mat4::IDENTITY);
    }
}

impl fmt::Debug for TransformComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformComponent")
            .field("len", &self.len)
            .field("count", &self.count)
            .field("capacity", &self.store.capacity())
            .field("propagation", &self.config.propagation)
            .finish_non_exhaustive()
    }
}
