//! # World Matrix Propagation
//!
//! `world(n) = world(parent(n)) * local(n)`, evaluated parent before child.
//! Two strategies give identical results:
//!
//! - **Recursive**: one call per tree level, following the sibling chain
//! - **Worklist**: an explicit stack of `(slot, parent world)` pairs reused
//!   across calls, so deep trees cannot exhaust the call stack
//!
//! A node without parent and children takes its local matrix as is.

use glam::Mat4;

use super::{TransformComponent, TransformInstance};
use crate::config::Propagation;

impl TransformComponent {
    /// Recomputes the world matrices of `instance` and its subtree from the
    /// parent's current world matrix.
    ///
    /// Only needed after writing through one of the `*_mut_unchecked`
    /// references; every other mutation refreshes on its own.
    ///
    /// # Panics
    ///
    /// Panics if `instance` is not live.
    pub fn refresh(&mut self, instance: TransformInstance) {
        let c = self.columns;
        let slot = self.live_slot(instance);
        let parent = self.store.get(c.parent, slot);

        if parent == 0 && self.store.get(c.first_child, slot) == 0 {
            let local = self.store.get(c.local_matrix, slot);
            self.store.set(c.world_matrix, slot, local);
            return;
        }

        let parent_world = if parent == 0 {
            Mat4::IDENTITY
        } else {
            self.store.get(c.world_matrix, parent as usize)
        };

        match self.config.propagation {
            Propagation::Recursive => self.apply_parent_transform(parent_world, slot as u32),
            Propagation::Worklist => self.propagate_worklist(parent_world, slot as u32),
        }
    }

    /// Recomputes every world matrix, root by root.
    pub fn refresh_all(&mut self) {
        let roots: Vec<_> = self.roots().collect();
        for root in roots {
            self.refresh(root);
        }
    }

    fn apply_parent_transform(&mut self, parent_world: Mat4, index: u32) {
        let c = self.columns;
        let slot = index as usize;
        let world = parent_world * self.store.get(c.local_matrix, slot);
        self.store.set(c.world_matrix, slot, world);

        let mut child = self.first_child_of(index);
        while child != 0 {
            self.apply_parent_transform(world, child);
            child = self.next_of(child);
        }
    }

    fn propagate_worklist(&mut self, parent_world: Mat4, index: u32) {
        let c = self.columns;
        let mut stack = std::mem::take(&mut self.stack);
        stack.clear();
        stack.push((index, parent_world));

        while let Some((index, parent_world)) = stack.pop() {
            let slot = index as usize;
            let world = parent_world * self.store.get(c.local_matrix, slot);
            self.store.set(c.world_matrix, slot, world);

            // Pushed in reverse so the first child is popped first.
            let start = stack.len();
            let mut child = self.first_child_of(index);
            while child != 0 {
                stack.push((child, world));
                child = self.next_of(child);
            }
            stack[start..].reverse();
        }

        self.stack = stack;
    }
}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use super::*;
    use crate::config::TransformConfig;
    use crate::transform::TransformDescriptor;
    use glam::{Quat, Vec3};
    use strata_core::Entities;

    fn chain(propagation: Propagation) -> (TransformComponent, Vec<TransformInstance>) {
        let config = TransformConfig::default().with_propagation(propagation);
        let mut transforms = TransformComponent::with_config(config).unwrap();
        let mut entities = Entities::new();

        let root = transforms
            .create(entities.spawn(), Some(&TransformDescriptor::at(Vec3::X)), None)
            .unwrap();
        let a = transforms
            .create(
                entities.spawn(),
                Some(&TransformDescriptor::at(Vec3::Y).with_rotation(Quat::from_rotation_z(0.4))),
                Some(root),
            )
            .unwrap();
        let b = transforms
            .create(
                entities.spawn(),
                Some(&TransformDescriptor::at(Vec3::Z).with_scale(Vec3::splat(3.0))),
                Some(a),
            )
            .unwrap();
        (transforms, vec![root, a, b])
    }

    #[test]
    fn test_composition() {
        for propagation in [Propagation::Recursive, Propagation::Worklist] {
            let (transforms, n) = chain(propagation);
            let expected = transforms.local_matrix(n[0])
                * transforms.local_matrix(n[1])
                * transforms.local_matrix(n[2]);
            assert!(transforms.world_matrix(n[2]).abs_diff_eq(expected, 1e-6));
        }
    }

    #[test]
    fn test_escape_hatch_then_refresh() {
        let (mut transforms, n) = chain(Propagation::Worklist);
        // SAFETY: the subtree is refreshed right below.
        unsafe {
            *transforms.local_matrix_mut_unchecked(n[0]) = Mat4::from_translation(Vec3::ZERO);
        }
        assert_eq!(transforms.world_matrix(n[0]), Mat4::from_translation(Vec3::X));

        transforms.refresh(n[0]);
        assert_eq!(transforms.world_matrix(n[0]), Mat4::IDENTITY);
        assert_eq!(transforms.world_matrix(n[1]), transforms.local_matrix(n[1]));
    }

    #[test]
    fn test_refresh_all() {
        let (mut transforms, n) = chain(Propagation::Recursive);
        let before: Vec<_> = n.iter().map(|&i| transforms.world_matrix(i)).collect();

        // SAFETY: every world matrix is recomputed by refresh_all.
        unsafe {
            for &i in &n {
                *transforms.world_matrix_mut_unchecked(i) = Mat4::ZERO;
            }
        }
        transforms.refresh_all();

        let after: Vec<_> = n.iter().map(|&i| transforms.world_matrix(i)).collect();
        assert_eq!(before, after);
    }
}
