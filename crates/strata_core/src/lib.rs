//! # STRATA Core
//!
//! Field-packed struct-of-arrays storage shared by every component store:
//! transforms, lights, materials and colliders all keep their per-instance
//! data in one [`FieldStore`] addressed by dense [`Instance`] handles.
//!
//! ## Architecture Rules
//!
//! 1. **One buffer per store** - every field lives in a sub-range of it
//! 2. **Dense handles** - an instance index is the owning entity's index
//! 3. **No `unsafe`** - typed views are `bytemuck` casts of aligned ranges
//!
//! ## Example
//!
//! ```rust
//! use strata_core::{FieldDesc, FieldStore, NumericKind};
//!
//! let fields = [
//!     FieldDesc::new(NumericKind::U32, 1),
//!     FieldDesc::new(NumericKind::F32, 16),
//! ];
//! let mut store = FieldStore::new(&fields, 4)?;
//! assert!(store.resize(32)?);
//! # Ok::<(), strata_core::StoreError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod entity;
pub mod error;
pub mod handle;
pub mod storage;

pub use config::StoreConfig;
pub use entity::{entity_index, Entities, EntityId};
pub use error::{ConfigError, ConfigResult, StoreError, StoreResult};
pub use handle::Instance;
pub use storage::{Column, FieldDesc, FieldStore, NumericKind, PositionedField, FIELD_ALIGN};
