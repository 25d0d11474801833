//! # Scene Error Types
//!
//! All errors that can occur in the transform component.

use strata_core::{ConfigError, EntityId, StoreError};
use thiserror::Error;

/// Errors that can occur in the transform component.
///
/// Broken tree invariants are not reported here: they are programmer errors
/// and panic at the point of detection.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// The entity has no transform. Expected in normal operation.
    #[error("entity {0:?} has no transform")]
    NoInstance(EntityId),

    /// The entity is null or uses index 0, which is the sentinel slot.
    #[error("entity {0:?} cannot own a transform: index 0 and null are reserved")]
    ReservedEntity(EntityId),

    /// The entity's slot already holds a live transform.
    #[error("cannot create transform for {entity:?}: slot is held by {existing:?}")]
    AlreadyPresent {
        /// The entity passed to `create`.
        entity: EntityId,
        /// The entity currently owning the slot.
        existing: EntityId,
    },

    /// A handle refers to a destroyed or replaced instance.
    #[error("instance of {0:?} is no longer alive")]
    StaleInstance(EntityId),

    /// The backing store failed to build or resize.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for scene operations.
pub type SceneResult<T> = Result<T, SceneError>;
