//! # STRATA Scene
//!
//! The hierarchical transform component: position, rotation, scale and
//! world matrices for every entity that has a transform, with the
//! parent/child tree stored as plain indices inside a
//! [`strata_core::FieldStore`].
//!
//! ## Architecture Rules
//!
//! 1. **No node objects** - links are slot indices, 0 means none
//! 2. **Eager world matrices** - every mutation propagates down the subtree
//! 3. **Single owner** - no internal locking; all edits go through `&mut`
//!
//! ## Example
//!
//! ```rust
//! use glam::Vec3;
//! use strata_core::Entities;
//! use strata_scene::{TransformComponent, TransformDescriptor};
//!
//! let mut entities = Entities::new();
//! let mut transforms = TransformComponent::new()?;
//!
//! let body = transforms.create(entities.spawn(), None, None)?;
//! let arm = transforms.create(
//!     entities.spawn(),
//!     Some(&TransformDescriptor::at(Vec3::Y)),
//!     Some(body),
//! )?;
//!
//! transforms.translate(body, Vec3::X);
//! assert_eq!(transforms.world_position(arm), Vec3::new(1.0, 1.0, 0.0));
//! # Ok::<(), strata_scene::SceneError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod transform;

pub use config::{Propagation, TransformConfig};
pub use error::{SceneError, SceneResult};
pub use transform::{
    Ancestors, Children, Descendants, Transform, TransformComponent, TransformDescriptor,
    TransformInstance,
};
