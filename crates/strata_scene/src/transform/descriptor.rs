//! Initial local transform for `create`.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Initial local transform of a new instance.
///
/// Position is required; rotation defaults to identity and scale to one.
/// Descriptors deserialize from TOML/JSON-like documents:
///
/// ```toml
/// position = [1.0, 0.0, 0.0]
/// scale = [2.0, 2.0, 2.0]
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformDescriptor {
    /// Local position.
    pub position: Vec3,
    /// Local rotation (identity when absent).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Quat>,
    /// Local scale (one when absent).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Vec3>,
}

impl TransformDescriptor {
    /// A descriptor at `position` with default rotation and scale.
    #[must_use]
    pub const fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: None,
            scale: None,
        }
    }

    /// Sets the rotation.
    #[must_use]
    pub const fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = Some(rotation);
        self
    }

    /// Sets the scale.
    #[must_use]
    pub const fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Position, rotation and scale with defaults filled in.
    #[must_use]
    pub fn resolve(&self) -> (Vec3, Quat, Vec3) {
        (
            self.position,
            self.rotation.unwrap_or(Quat::IDENTITY),
            self.scale.unwrap_or(Vec3::ONE),
        )
    }
}
