//! # Field-Packed Storage
//!
//! A component store keeps every per-instance property in its own column
//! ("field"), and all columns share one buffer.
//!
//! ## Design Philosophy
//!
//! - One allocation per store, regardless of how many fields it has
//! - Columns are independently aligned to 8 bytes
//! - Instance `i` lives in slot `i` of every column; slot 0 is never live
//! - Growing the store copies each column separately

mod field;
mod store;

pub use field::{align_up, layout_fields, FieldDesc, NumericKind, PositionedField, FIELD_ALIGN};
pub use store::{Column, FieldStore};
