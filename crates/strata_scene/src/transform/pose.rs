//! Local and world pose accessors and mutators.
//!
//! Every mutator rebuilds the local matrix and re-derives the world matrices
//! of the instance and its subtree before returning. All methods panic on a
//! handle that is not live.

use glam::{EulerRot, Mat4, Quat, Vec3};
use strata_core::EntityId;

use super::{TransformComponent, TransformInstance};

impl TransformComponent {
    /// The entity owning `instance`.
    #[inline]
    #[must_use]
    pub fn entity(&self, instance: TransformInstance) -> EntityId {
        self.store.get(self.columns.entity, self.live_slot(instance))
    }

    /// Local position.
    #[inline]
    #[must_use]
    pub fn local_position(&self, instance: TransformInstance) -> Vec3 {
        self.store.get(self.columns.local_position, self.live_slot(instance))
    }

    /// Local rotation.
    #[inline]
    #[must_use]
    pub fn local_rotation(&self, instance: TransformInstance) -> Quat {
        self.store.get(self.columns.local_rotation, self.live_slot(instance))
    }

    /// Local scale.
    #[inline]
    #[must_use]
    pub fn local_scale(&self, instance: TransformInstance) -> Vec3 {
        self.store.get(self.columns.local_scale, self.live_slot(instance))
    }

    /// Local matrix. After [`TransformComponent::set_local_matrix`] it may
    /// disagree with the local position, rotation and scale.
    #[inline]
    #[must_use]
    pub fn local_matrix(&self, instance: TransformInstance) -> Mat4 {
        self.store.get(self.columns.local_matrix, self.live_slot(instance))
    }

    /// World matrix.
    #[inline]
    #[must_use]
    pub fn world_matrix(&self, instance: TransformInstance) -> Mat4 {
        self.store.get(self.columns.world_matrix, self.live_slot(instance))
    }

    /// Translation column of the world matrix.
    #[inline]
    #[must_use]
    pub fn world_position(&self, instance: TransformInstance) -> Vec3 {
        let slot = self.live_slot(instance);
        self.store.slice(self.columns.world_matrix)[slot].w_axis.truncate()
    }

    /// Rotation decomposed from the world matrix.
    #[must_use]
    pub fn world_rotation(&self, instance: TransformInstance) -> Quat {
        self.world_matrix(instance).to_scale_rotation_translation().1
    }

    /// Scale decomposed from the world matrix.
    #[must_use]
    pub fn world_scale(&self, instance: TransformInstance) -> Vec3 {
        self.world_matrix(instance).to_scale_rotation_translation().0
    }

    /// Mutable reference to the stored local matrix.
    ///
    /// # Safety
    ///
    /// Writes through the reference bypass propagation. The caller must call
    /// [`TransformComponent::refresh`] on the instance before any world
    /// matrix of its subtree is read again; until then those world matrices
    /// are stale.
    #[allow(unsafe_code)]
    #[inline]
    pub unsafe fn local_matrix_mut_unchecked(
        &mut self,
        instance: TransformInstance,
    ) -> &mut Mat4 {
        let slot = self.live_slot(instance);
        &mut self.store.slice_mut(self.columns.local_matrix)[slot]
    }

    /// Mutable reference to the stored world matrix.
    ///
    /// # Safety
    ///
    /// Writes through the reference bypass propagation, so the world matrices
    /// of the subtree no longer match. The caller must call
    /// [`TransformComponent::refresh`] (or overwrite the subtree consistently)
    /// before relying on them again. The next mutation of the instance or an
    /// ancestor recomputes the value from the local matrix.
    #[allow(unsafe_code)]
    #[inline]
    pub unsafe fn world_matrix_mut_unchecked(
        &mut self,
        instance: TransformInstance,
    ) -> &mut Mat4 {
        let slot = self.live_slot(instance);
        &mut self.store.slice_mut(self.columns.world_matrix)[slot]
    }

    /// Sets the local position.
    pub fn set_position(&mut self, instance: TransformInstance, position: Vec3) {
        let slot = self.live_slot(instance);
        self.store.set(self.columns.local_position, slot, position);
        self.commit(instance);
    }

    /// Sets the local rotation.
    pub fn set_rotation(&mut self, instance: TransformInstance, rotation: Quat) {
        let slot = self.live_slot(instance);
        self.store.set(self.columns.local_rotation, slot, rotation);
        self.commit(instance);
    }

    /// Sets the local scale.
    pub fn set_scale(&mut self, instance: TransformInstance, scale: Vec3) {
        let slot = self.live_slot(instance);
        self.store.set(self.columns.local_scale, slot, scale);
        self.commit(instance);
    }

    /// Sets local position and rotation with a single propagation.
    pub fn set_position_and_rotation(
        &mut self,
        instance: TransformInstance,
        position: Vec3,
        rotation: Quat,
    ) {
        let slot = self.live_slot(instance);
        self.store.set(self.columns.local_position, slot, position);
        self.store.set(self.columns.local_rotation, slot, rotation);
        self.commit(instance);
    }

    /// Sets the whole local pose with a single propagation.
    pub fn set_position_rotation_scale(
        &mut self,
        instance: TransformInstance,
        position: Vec3,
        rotation: Quat,
        scale: Vec3,
    ) {
        let slot = self.live_slot(instance);
        self.store.set(self.columns.local_position, slot, position);
        self.store.set(self.columns.local_rotation, slot, rotation);
        self.store.set(self.columns.local_scale, slot, scale);
        self.commit(instance);
    }

    /// Stores `matrix` as the local matrix verbatim and propagates it.
    ///
    /// Local position, rotation and scale are left untouched and no longer
    /// describe the matrix. The next TRS mutator rebuilds the matrix from them.
    pub fn set_local_matrix(&mut self, instance: TransformInstance, matrix: Mat4) {
        let slot = self.live_slot(instance);
        self.store.set(self.columns.local_matrix, slot, matrix);
        self.refresh(instance);
    }

    /// Moves the instance by `delta` in its parent's space.
    pub fn translate(&mut self, instance: TransformInstance, delta: Vec3) {
        let position = self.local_position(instance) + delta;
        self.set_position(instance, position);
    }

    /// Rotates by `delta` in the instance's own space (`rotation * delta`).
    pub fn rotate(&mut self, instance: TransformInstance, delta: Quat) {
        let rotation = self.local_rotation(instance) * delta;
        self.set_rotation(instance, rotation);
    }

    /// Rotates by `delta` applied after the current rotation
    /// (`delta * rotation`).
    pub fn rotate_rel_world(&mut self, instance: TransformInstance, delta: Quat) {
        let rotation = delta * self.local_rotation(instance);
        self.set_rotation(instance, rotation);
    }

    /// Rotates by XYZ Euler angles (radians) in the instance's own space.
    pub fn rotate_by_angles(&mut self, instance: TransformInstance, angles: Vec3) {
        let delta = Quat::from_euler(EulerRot::XYZ, angles.x, angles.y, angles.z);
        self.rotate(instance, delta);
    }

    pub(super) fn rebuild_local(&mut self, slot: usize) {
        let c = self.columns;
        let matrix = Mat4::from_scale_rotation_translation(
            self.store.get(c.local_scale, slot),
            self.store.get(c.local_rotation, slot),
            self.store.get(c.local_position, slot),
        );
        self.store.set(c.local_matrix, slot, matrix);
    }

    fn commit(&mut self, instance: TransformInstance) {
        self.rebuild_local(instance.slot());
        self.refresh(instance);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::TransformDescriptor;
    use std::f32::consts::FRAC_PI_2;

    fn near(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    fn single(descriptor: &TransformDescriptor) -> (TransformComponent, TransformInstance) {
        let mut transforms = TransformComponent::new().unwrap();
        let instance = transforms
            .create(EntityId::new(1, 0), Some(descriptor), None)
            .unwrap();
        (transforms, instance)
    }

    #[test]
    fn test_descriptor_applied() {
        let descriptor = TransformDescriptor::at(Vec3::new(1.0, 2.0, 3.0))
            .with_rotation(Quat::from_rotation_z(FRAC_PI_2))
            .with_scale(Vec3::splat(2.0));
        let (transforms, instance) = single(&descriptor);

        assert_eq!(transforms.local_position(instance), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(transforms.local_scale(instance), Vec3::splat(2.0));
        assert_eq!(
            transforms.local_matrix(instance),
            Mat4::from_scale_rotation_translation(
                Vec3::splat(2.0),
                Quat::from_rotation_z(FRAC_PI_2),
                Vec3::new(1.0, 2.0, 3.0),
            )
        );
        assert_eq!(transforms.world_matrix(instance), transforms.local_matrix(instance));
        assert_eq!(transforms.entity(instance), EntityId::new(1, 0));
    }

    #[test]
    fn test_setters_rebuild_matrix() {
        let (mut transforms, instance) = single(&TransformDescriptor::default());
        transforms.set_position_rotation_scale(
            instance,
            Vec3::X,
            Quat::from_rotation_y(0.5),
            Vec3::new(1.0, 2.0, 3.0),
        );
        let expected = Mat4::from_scale_rotation_translation(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_rotation_y(0.5),
            Vec3::X,
        );
        assert_eq!(transforms.local_matrix(instance), expected);
        assert_eq!(transforms.world_matrix(instance), expected);

        transforms.set_scale(instance, Vec3::ONE);
        assert!(near(transforms.world_scale(instance), Vec3::ONE));
        assert!(near(transforms.world_position(instance), Vec3::X));
    }

    #[test]
    fn test_translate() {
        let (mut transforms, instance) = single(&TransformDescriptor::at(Vec3::X));
        transforms.translate(instance, Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(transforms.local_position(instance), Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(transforms.world_position(instance), Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_rotate_composition_order() {
        let base = Quat::from_rotation_x(0.3);
        let delta = Quat::from_rotation_y(0.7);
        let (mut transforms, instance) =
            single(&TransformDescriptor::default().with_rotation(base));

        transforms.rotate(instance, delta);
        assert_eq!(transforms.local_rotation(instance), base * delta);

        transforms.set_rotation(instance, base);
        transforms.rotate_rel_world(instance, delta);
        assert_eq!(transforms.local_rotation(instance), delta * base);
    }

    #[test]
    fn test_rotate_by_angles() {
        let (mut transforms, instance) = single(&TransformDescriptor::default());
        transforms.rotate_by_angles(instance, Vec3::new(0.0, 0.0, FRAC_PI_2));

        let rotated = transforms.world_matrix(instance).transform_vector3(Vec3::X);
        assert!(near(rotated, Vec3::Y));
    }

    #[test]
    fn test_set_local_matrix_verbatim() {
        let (mut transforms, instance) = single(&TransformDescriptor::at(Vec3::Z));
        let skew = Mat4::from_cols_array(&[
            1.0, 0.5, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            4.0, 5.0, 6.0, 1.0,
        ]);
        transforms.set_local_matrix(instance, skew);

        assert_eq!(transforms.local_matrix(instance), skew);
        assert_eq!(transforms.world_matrix(instance), skew);
        assert_eq!(transforms.local_position(instance), Vec3::Z);
        assert_eq!(transforms.world_position(instance), Vec3::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn test_world_position_reads_its_own_slot() {
        let mut transforms = TransformComponent::new().unwrap();
        let placed: Vec<_> = (0..4u8)
            .map(|i| {
                let at = TransformDescriptor::at(Vec3::splat(f32::from(i)));
                let instance = transforms
                    .create(EntityId::new(u32::from(i) + 1, 0), Some(&at), None)
                    .unwrap();
                (i, instance)
            })
            .collect();

        for &(i, instance) in placed.iter().rev() {
            let expected = transforms.world_matrix(instance).w_axis.truncate();
            assert_eq!(transforms.world_position(instance), expected);
            assert_eq!(expected, Vec3::splat(f32::from(i)));
        }
    }
}
