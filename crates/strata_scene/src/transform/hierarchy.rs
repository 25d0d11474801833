//! # Hierarchy
//!
//! Parent/child links are plain slot indices stored in four fields. Children
//! of a node form a doubly linked sibling chain starting at `first_child`;
//! new children are appended at the tail, so iteration order is insertion
//! order.
//!
//! The tree must stay acyclic. Reparenting a node under one of its own
//! descendants is not detected.

use glam::Mat4;
use strata_core::Column;

use super::{TransformComponent, TransformInstance};
use crate::error::{SceneError, SceneResult};

impl TransformComponent {
    /// Parent of `instance`, or `None` for a root.
    #[inline]
    #[must_use]
    pub fn parent(&self, instance: TransformInstance) -> Option<TransformInstance> {
        self.link(self.columns.parent, instance)
    }

    /// First child of `instance`.
    #[inline]
    #[must_use]
    pub fn first_child(&self, instance: TransformInstance) -> Option<TransformInstance> {
        self.link(self.columns.first_child, instance)
    }

    /// Previous sibling of `instance`.
    #[inline]
    #[must_use]
    pub fn prev_sibling(&self, instance: TransformInstance) -> Option<TransformInstance> {
        self.link(self.columns.prev_sibling, instance)
    }

    /// Next sibling of `instance`.
    #[inline]
    #[must_use]
    pub fn next_sibling(&self, instance: TransformInstance) -> Option<TransformInstance> {
        self.link(self.columns.next_sibling, instance)
    }

    /// Returns `true` if `instance` has no parent.
    #[inline]
    #[must_use]
    pub fn is_root(&self, instance: TransformInstance) -> bool {
        self.parent(instance).is_none()
    }

    /// Returns `true` if `instance` has no children.
    #[inline]
    #[must_use]
    pub fn is_leaf(&self, instance: TransformInstance) -> bool {
        self.first_child(instance).is_none()
    }

    /// Returns `true` if `ancestor` is on the parent chain of `instance`.
    #[must_use]
    pub fn is_ancestor(&self, instance: TransformInstance, ancestor: TransformInstance) -> bool {
        self.ancestors(instance).any(|v| v == ancestor)
    }

    /// Children of `instance` in insertion order.
    #[must_use]
    pub fn children(&self, instance: TransformInstance) -> Children<'_> {
        let slot = self.live_slot(instance);
        Children {
            transforms: self,
            cursor: self.store.get(self.columns.first_child, slot),
        }
    }

    /// Parent, grandparent and so on up to the root.
    #[must_use]
    pub fn ancestors(&self, instance: TransformInstance) -> Ancestors<'_> {
        let slot = self.live_slot(instance);
        Ancestors {
            transforms: self,
            cursor: self.store.get(self.columns.parent, slot),
        }
    }

    /// Every node below `instance`, in pre-order. `instance` itself is not
    /// included.
    #[must_use]
    pub fn descendants(&self, instance: TransformInstance) -> Descendants<'_> {
        let slot = self.live_slot(instance);
        Descendants {
            transforms: self,
            root: slot as u32,
            cursor: self.store.get(self.columns.first_child, slot),
        }
    }

    /// Every live transform without a parent, in index order.
    pub fn roots(&self) -> impl Iterator<Item = TransformInstance> + '_ {
        (1..=self.count)
            .filter_map(|index| self.handle_at(index))
            .filter(|&instance| self.store.get(self.columns.parent, instance.slot()) == 0)
    }

    /// Moves `instance` under `parent` (or to the roots), appended after the
    /// parent's existing children. The local transform is kept, so the world
    /// matrices of the subtree are recomputed.
    ///
    /// # Errors
    ///
    /// [`SceneError::StaleInstance`] if either handle is not live.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is `instance` itself.
    pub fn set_parent(
        &mut self,
        instance: TransformInstance,
        parent: Option<TransformInstance>,
    ) -> SceneResult<()> {
        self.reparent(instance, parent)?;
        self.refresh(instance);
        Ok(())
    }

    /// Like [`TransformComponent::set_parent`], but rewrites the local
    /// position, rotation and scale so the world pose does not change.
    ///
    /// Shear in the resulting local matrix cannot be expressed as TRS and is
    /// dropped.
    ///
    /// # Errors
    ///
    /// [`SceneError::StaleInstance`] if either handle is not live.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is `instance` itself.
    pub fn set_parent_keep_world(
        &mut self,
        instance: TransformInstance,
        parent: Option<TransformInstance>,
    ) -> SceneResult<()> {
        let world = self.checked_world(instance)?;
        self.reparent(instance, parent)?;

        let parent_world = parent.map_or(Mat4::IDENTITY, |p| self.world_matrix(p));
        let local = parent_world.inverse() * world;
        let (scale, rotation, position) = local.to_scale_rotation_translation();
        self.set_position_rotation_scale(instance, position, rotation, scale);
        Ok(())
    }

    /// Unlinks `instance` from its parent and siblings. Children stay
    /// attached. World matrices are not touched.
    pub fn remove_from_parent(&mut self, instance: TransformInstance) {
        let slot = self.live_slot(instance);
        self.unlink(slot);
    }

    /// Unlinks `instance` and refreshes it as a root.
    pub fn detach(&mut self, instance: TransformInstance) {
        self.remove_from_parent(instance);
        self.refresh(instance);
    }

    fn checked_world(&self, instance: TransformInstance) -> SceneResult<Mat4> {
        if !self.contains(instance) {
            return Err(SceneError::StaleInstance(instance.entity()));
        }
        Ok(self.world_matrix(instance))
    }

    fn reparent(
        &mut self,
        instance: TransformInstance,
        parent: Option<TransformInstance>,
    ) -> SceneResult<()> {
        for handle in std::iter::once(instance).chain(parent) {
            if !self.contains(handle) {
                return Err(SceneError::StaleInstance(handle.entity()));
            }
        }
        invariant!(
            parent != Some(instance),
            "transform {instance:?} cannot be its own parent"
        );

        let slot = instance.slot();
        self.unlink(slot);
        if let Some(parent) = parent {
            self.link_under(slot, parent.slot());
        }
        Ok(())
    }

    /// Appends `slot` at the tail of `parent`'s child chain.
    pub(super) fn link_under(&mut self, slot: usize, parent: usize) {
        let c = self.columns;
        let first = self.store.get(c.first_child, parent) as usize;

        if first == 0 {
            self.store.set(c.first_child, parent, slot as u32);
        } else {
            invariant!(
                self.store.get(c.prev_sibling, first) == 0,
                "first child {first} of {parent} has a previous sibling"
            );
            let mut tail = first;
            loop {
                let next = self.store.get(c.next_sibling, tail) as usize;
                if next == 0 {
                    break;
                }
                tail = next;
            }
            self.store.set(c.next_sibling, tail, slot as u32);
            self.store.set(c.prev_sibling, slot, tail as u32);
        }
        self.store.set(c.parent, slot, parent as u32);
    }

    /// Removes `slot` from its sibling chain and clears its parent.
    pub(super) fn unlink(&mut self, slot: usize) {
        let c = self.columns;
        let parent = self.store.get(c.parent, slot) as usize;
        let prev = self.store.get(c.prev_sibling, slot);
        let next = self.store.get(c.next_sibling, slot);

        if next != 0 {
            self.store.set(c.prev_sibling, next as usize, prev);
        }
        if prev != 0 {
            self.store.set(c.next_sibling, prev as usize, next);
        } else if parent != 0 {
            invariant!(
                self.store.get(c.first_child, parent) as usize == slot,
                "{slot} has no previous sibling but is not the first child of {parent}"
            );
            self.store.set(c.first_child, parent, next);
        }

        self.store.set(c.parent, slot, 0);
        self.store.set(c.prev_sibling, slot, 0);
        self.store.set(c.next_sibling, slot, 0);
    }

    fn link(&self, column: Column<u32>, instance: TransformInstance) -> Option<TransformInstance> {
        let index = self.store.get(column, self.live_slot(instance));
        self.link_at(index)
    }

    /// Handle for a stored link; 0 means none.
    fn link_at(&self, index: u32) -> Option<TransformInstance> {
        if index == 0 {
            return None;
        }
        let handle = self.handle_at(index);
        invariant!(handle.is_some(), "link to dead transform slot {index}");
        handle
    }

    #[inline]
    pub(super) fn next_of(&self, index: u32) -> u32 {
        self.store.get(self.columns.next_sibling, index as usize)
    }

    #[inline]
    pub(super) fn first_child_of(&self, index: u32) -> u32 {
        self.store.get(self.columns.first_child, index as usize)
    }

    #[inline]
    pub(super) fn parent_of(&self, index: u32) -> u32 {
        self.store.get(self.columns.parent, index as usize)
    }
}

/// Iterator over the children of a transform.
#[derive(Debug, Clone)]
pub struct Children<'a> {
    transforms: &'a TransformComponent,
    cursor: u32,
}

impl Iterator for Children<'_> {
    type Item = TransformInstance;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == 0 {
            return None;
        }
        let current = self.cursor;
        self.cursor = self.transforms.next_of(current);
        self.transforms.link_at(current)
    }
}

/// Iterator over the ancestors of a transform, nearest first.
#[derive(Debug, Clone)]
pub struct Ancestors<'a> {
    transforms: &'a TransformComponent,
    cursor: u32,
}

impl Iterator for Ancestors<'_> {
    type Item = TransformInstance;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == 0 {
            return None;
        }
        let current = self.cursor;
        self.cursor = self.transforms.parent_of(current);
        self.transforms.link_at(current)
    }
}

/// Iterator over the descendants of a transform, in pre-order.
#[derive(Debug, Clone)]
pub struct Descendants<'a> {
    transforms: &'a TransformComponent,
    root: u32,
    cursor: u32,
}

impl Iterator for Descendants<'_> {
    type Item = TransformInstance;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == 0 {
            return None;
        }
        let current = self.cursor;
        let t = self.transforms;

        self.cursor = if t.first_child_of(current) != 0 {
            t.first_child_of(current)
        } else {
            // Climb until a node below the root has a next sibling.
            let mut node = current;
            loop {
                if node == self.root {
                    break 0;
                }
                let next = t.next_of(node);
                if next != 0 {
                    break next;
                }
                node = t.parent_of(node);
            }
        };

        t.link_at(current)
    }
}
