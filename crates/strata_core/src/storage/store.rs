//! # Field Store
//!
//! One contiguous buffer holding every field of a component store.
//!
//! The buffer is kept as `u64` words, which gives the 8-byte base alignment
//! that [`FIELD_ALIGN`] relies on without any `unsafe`. Typed access is a
//! `bytemuck` cast of a field's byte range, so any [`Pod`] type whose size
//! matches the field descriptor (and whose alignment is at most 8) can be
//! used as the element type.
//!
//! ## Rebase
//!
//! Slices returned by [`FieldStore::slice`] and friends borrow the store, so
//! the borrow checker rejects a [`FieldStore::resize`] while any of them is
//! alive. [`Column`] keys only carry a field index and stay valid across
//! resizes. Code that caches raw byte offsets from [`FieldStore::layout`]
//! must compare [`FieldStore::generation`] before reusing them.

use std::fmt;
use std::marker::PhantomData;

use bytemuck::Pod;

use super::field::{layout_fields, FieldDesc, PositionedField, FIELD_ALIGN};
use crate::error::{StoreError, StoreResult};

/// Memory behind the store.
enum Backing {
    /// Allocated by the store.
    Owned(Box<[u64]>),
    /// Handed over by the caller (checked for size and alignment).
    Supplied(Box<[u8]>),
}

impl Backing {
    fn zeroed(byte_len: usize) -> Self {
        Self::Owned(vec![0u64; byte_len.div_ceil(FIELD_ALIGN)].into_boxed_slice())
    }

    fn supplied(mut buffer: Box<[u8]>, required: usize) -> StoreResult<Self> {
        check_buffer(buffer.as_ptr() as usize, buffer.len(), required)?;
        buffer.fill(0);
        Ok(Self::Supplied(buffer))
    }

    #[inline]
    fn bytes(&self) -> &[u8] {
        match self {
            Self::Owned(words) => bytemuck::cast_slice(&words[..]),
            Self::Supplied(bytes) => bytes,
        }
    }

    #[inline]
    fn bytes_mut(&mut self) -> &mut [u8] {
        match self {
            Self::Owned(words) => bytemuck::cast_slice_mut(&mut words[..]),
            Self::Supplied(bytes) => bytes,
        }
    }
}

/// Typed key for one field of a [`FieldStore`].
///
/// Obtained from [`FieldStore::column`], which checks the element type once.
/// A column belongs to the store that created it.
pub struct Column<T> {
    field: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Column<T> {
    /// Index of the field this column reads.
    #[inline]
    #[must_use]
    pub const fn field(self) -> usize {
        self.field
    }
}

impl<T> Clone for Column<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Column<T> {}

impl<T> PartialEq for Column<T> {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field
    }
}

impl<T> Eq for Column<T> {}

impl<T> fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("field", &self.field)
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

/// Field-packed struct-of-arrays storage.
///
/// Slot `i` of every field belongs to instance `i`. The store knows nothing
/// about which slots are live; that is the owning component's business.
///
/// # Example
///
/// ```rust
/// use strata_core::storage::{FieldDesc, FieldStore, NumericKind};
///
/// let fields = [FieldDesc::new(NumericKind::F32, 3), FieldDesc::new(NumericKind::U32, 1)];
/// let mut store = FieldStore::new(&fields, 16)?;
/// let position = store.column::<[f32; 3]>(0)?;
///
/// store.set(position, 3, [1.0, 2.0, 3.0]);
/// assert_eq!(store.get(position, 3), [1.0, 2.0, 3.0]);
/// # Ok::<(), strata_core::StoreError>(())
/// ```
pub struct FieldStore {
    fields: Vec<PositionedField>,
    backing: Backing,
    capacity: usize,
    generation: u32,
}

impl FieldStore {
    /// Creates a zeroed store for `capacity` slots of every field.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidConfig`] if `fields` is empty, a field has zero
    /// width, `capacity` is zero, or the layout does not fit in `usize`.
    pub fn new(fields: &[FieldDesc], capacity: usize) -> StoreResult<Self> {
        validate(fields, capacity)?;
        let (positioned, byte_len) = plan(fields, capacity)?;

        tracing::trace!(
            fields = fields.len(),
            capacity,
            byte_len,
            "field store allocated"
        );

        Ok(Self {
            fields: positioned,
            backing: Backing::zeroed(byte_len),
            capacity,
            generation: 0,
        })
    }

    /// Creates a store on top of a caller-owned buffer.
    ///
    /// The buffer is cleared. It may be larger than [`FieldStore::required_bytes`].
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidConfig`] as for [`FieldStore::new`];
    /// [`StoreError::InvalidBuffer`] if the buffer is too small or not
    /// 8-byte aligned.
    pub fn with_buffer(
        fields: &[FieldDesc],
        capacity: usize,
        buffer: Box<[u8]>,
    ) -> StoreResult<Self> {
        validate(fields, capacity)?;
        let (positioned, byte_len) = plan(fields, capacity)?;
        let backing = Backing::supplied(buffer, byte_len)?;

        Ok(Self {
            fields: positioned,
            backing,
            capacity,
            generation: 0,
        })
    }

    /// Bytes a buffer must hold for `fields` at `capacity`.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidConfig`] if the size does not fit in `usize`.
    pub fn required_bytes(fields: &[FieldDesc], capacity: usize) -> StoreResult<usize> {
        plan(fields, capacity).map(|(_, byte_len)| byte_len)
    }

    /// Number of slots in every field.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of fields.
    #[inline]
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Current placement of every field.
    #[inline]
    #[must_use]
    pub fn layout(&self) -> &[PositionedField] {
        &self.fields
    }

    /// Incremented by every resize that moved the buffer.
    #[inline]
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    /// The whole backing buffer.
    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        self.backing.bytes()
    }

    /// Creates a typed key for `field`.
    ///
    /// # Errors
    ///
    /// [`StoreError::FieldOutOfRange`] for an unknown field;
    /// [`StoreError::FieldTypeMismatch`] if `T` is not exactly one slot wide
    /// or needs more than 8-byte alignment.
    pub fn column<T: Pod>(&self, field: usize) -> StoreResult<Column<T>> {
        let positioned = self.positioned(field)?;
        let size = std::mem::size_of::<T>();
        let align = std::mem::align_of::<T>();

        if size != positioned.desc.element_size() || align > FIELD_ALIGN {
            return Err(StoreError::FieldTypeMismatch {
                field,
                expected: positioned.desc.element_size(),
                actual: size,
                align,
            });
        }

        Ok(Column {
            field,
            _marker: PhantomData,
        })
    }

    /// Typed view of `field` across all slots. Index `i` is instance `i`.
    ///
    /// # Errors
    ///
    /// As for [`FieldStore::column`].
    pub fn field_view<T: Pod>(&self, field: usize) -> StoreResult<&[T]> {
        let column = self.column::<T>(field)?;
        Ok(self.slice(column))
    }

    /// Mutable typed view of `field` across all slots.
    ///
    /// # Errors
    ///
    /// As for [`FieldStore::column`].
    pub fn field_view_mut<T: Pod>(&mut self, field: usize) -> StoreResult<&mut [T]> {
        let column = self.column::<T>(field)?;
        Ok(self.slice_mut(column))
    }

    /// Raw bytes of one field (without trailing padding).
    ///
    /// # Errors
    ///
    /// [`StoreError::FieldOutOfRange`] for an unknown field.
    pub fn field_bytes(&self, field: usize) -> StoreResult<&[u8]> {
        let positioned = *self.positioned(field)?;
        let start = positioned.byte_offset;
        Ok(&self.bytes()[start..start + positioned.used_bytes(self.capacity)])
    }

    /// Mutable raw bytes of one field (without trailing padding).
    ///
    /// # Errors
    ///
    /// [`StoreError::FieldOutOfRange`] for an unknown field.
    pub fn field_bytes_mut(&mut self, field: usize) -> StoreResult<&mut [u8]> {
        let positioned = *self.positioned(field)?;
        let start = positioned.byte_offset;
        let end = start + positioned.used_bytes(self.capacity);
        Ok(&mut self.backing.bytes_mut()[start..end])
    }

    /// Typed slice of a column.
    #[inline]
    #[must_use]
    pub fn slice<T: Pod>(&self, column: Column<T>) -> &[T] {
        let (start, end) = self.range(column);
        bytemuck::cast_slice(&self.backing.bytes()[start..end])
    }

    /// Mutable typed slice of a column.
    #[inline]
    pub fn slice_mut<T: Pod>(&mut self, column: Column<T>) -> &mut [T] {
        let (start, end) = self.range(column);
        bytemuck::cast_slice_mut(&mut self.backing.bytes_mut()[start..end])
    }

    /// Copies the element at `index` out of a column.
    ///
    /// # Panics
    ///
    /// Panics if `index >= capacity`.
    #[inline]
    #[must_use]
    pub fn get<T: Pod>(&self, column: Column<T>, index: usize) -> T {
        self.slice(column)[index]
    }

    /// Overwrites the element at `index` of a column.
    ///
    /// # Panics
    ///
    /// Panics if `index >= capacity`.
    #[inline]
    pub fn set<T: Pod>(&mut self, column: Column<T>, index: usize, value: T) {
        self.slice_mut(column)[index] = value;
    }

    /// Zeroes slot `index` in every field.
    ///
    /// # Panics
    ///
    /// Panics if `index >= capacity`.
    pub fn zero_slot(&mut self, index: usize) {
        assert!(index < self.capacity, "slot {index} out of range");

        let capacity = self.capacity;
        let bytes = self.backing.bytes_mut();
        for field in &self.fields {
            let size = field.desc.element_size();
            let start = field.byte_offset + index * size;
            debug_assert!(start + size <= field.byte_offset + field.used_bytes(capacity));
            bytes[start..start + size].fill(0);
        }
    }

    /// Copies slot `from` over slot `to` in every field.
    ///
    /// # Panics
    ///
    /// Panics if either index is `>= capacity`.
    pub fn copy_slot(&mut self, from: usize, to: usize) {
        assert!(
            from < self.capacity && to < self.capacity,
            "slot {from} or {to} out of range"
        );
        if from == to {
            return;
        }

        let bytes = self.backing.bytes_mut();
        for field in &self.fields {
            let size = field.desc.element_size();
            let src = field.byte_offset + from * size;
            let dst = field.byte_offset + to * size;
            bytes.copy_within(src..src + size, dst);
        }
    }

    /// Changes the number of slots, keeping the first `min(old, new)` slots of
    /// every field.
    ///
    /// Returns `true` when the buffer was replaced; every previously computed
    /// byte offset is stale and must be reacquired. Resizing to the current
    /// capacity does nothing and returns `false`.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidConfig`] if `new_capacity` is zero or the layout
    /// does not fit in `usize`.
    pub fn resize(&mut self, new_capacity: usize) -> StoreResult<bool> {
        if new_capacity == self.capacity {
            return Ok(false);
        }
        if new_capacity == 0 {
            return Err(StoreError::InvalidConfig("capacity must be greater than zero".into()));
        }

        let (positioned, byte_len) = plan(&self.descs(), new_capacity)?;
        let backing = Backing::zeroed(byte_len);
        self.rebase(positioned, backing, new_capacity);
        Ok(true)
    }

    /// Like [`FieldStore::resize`] but moves the data into a caller-owned buffer.
    ///
    /// Resizing to the current capacity does nothing, returns `false` and
    /// drops `buffer`.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidConfig`] if `new_capacity` is zero or the layout
    /// does not fit in `usize`; [`StoreError::InvalidBuffer`] if the buffer is
    /// too small or misaligned.
    pub fn resize_with_buffer(
        &mut self,
        new_capacity: usize,
        buffer: Box<[u8]>,
    ) -> StoreResult<bool> {
        if new_capacity == self.capacity {
            return Ok(false);
        }
        if new_capacity == 0 {
            return Err(StoreError::InvalidConfig("capacity must be greater than zero".into()));
        }

        let (positioned, byte_len) = plan(&self.descs(), new_capacity)?;
        let backing = Backing::supplied(buffer, byte_len)?;
        self.rebase(positioned, backing, new_capacity);
        Ok(true)
    }

    fn rebase(&mut self, positioned: Vec<PositionedField>, mut backing: Backing, new_capacity: usize) {
        let keep = self.capacity.min(new_capacity);

        {
            let src = self.backing.bytes();
            let dst = backing.bytes_mut();
            // Fields are not interleaved, so each one moves with its own offsets.
            for (old, new) in self.fields.iter().zip(&positioned) {
                let len = old.desc.element_size() * keep;
                dst[new.byte_offset..new.byte_offset + len]
                    .copy_from_slice(&src[old.byte_offset..old.byte_offset + len]);
            }
        }

        tracing::debug!(
            from = self.capacity,
            to = new_capacity,
            generation = self.generation + 1,
            "field store resized"
        );

        self.fields = positioned;
        self.backing = backing;
        self.capacity = new_capacity;
        self.generation = self.generation.wrapping_add(1);
    }

    fn descs(&self) -> Vec<FieldDesc> {
        self.fields.iter().map(|f| f.desc).collect()
    }

    fn positioned(&self, field: usize) -> StoreResult<&PositionedField> {
        self.fields.get(field).ok_or(StoreError::FieldOutOfRange {
            field,
            count: self.fields.len(),
        })
    }

    #[inline]
    fn range<T>(&self, column: Column<T>) -> (usize, usize) {
        let positioned = &self.fields[column.field];
        debug_assert_eq!(std::mem::size_of::<T>(), positioned.desc.element_size());
        let start = positioned.byte_offset;
        (start, start + positioned.used_bytes(self.capacity))
    }
}

impl fmt::Debug for FieldStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldStore")
            .field("fields", &self.fields)
            .field("capacity", &self.capacity)
            .field("generation", &self.generation)
            .field("byte_len", &self.bytes().len())
            .finish()
    }
}

fn plan(fields: &[FieldDesc], capacity: usize) -> StoreResult<(Vec<PositionedField>, usize)> {
    layout_fields(fields, capacity).ok_or_else(|| {
        StoreError::InvalidConfig(format!(
            "{} fields at capacity {capacity} exceed the addressable size",
            fields.len()
        ))
    })
}

fn check_buffer(address: usize, len: usize, required: usize) -> StoreResult<()> {
    let misalignment = address % FIELD_ALIGN;
    if len < required || misalignment != 0 {
        return Err(StoreError::InvalidBuffer {
            required,
            provided: len,
            align: FIELD_ALIGN,
            misalignment,
        });
    }
    Ok(())
}

fn validate(fields: &[FieldDesc], capacity: usize) -> StoreResult<()> {
    if fields.is_empty() {
        return Err(StoreError::InvalidConfig("field list is empty".into()));
    }
    if capacity == 0 {
        return Err(StoreError::InvalidConfig("capacity must be greater than zero".into()));
    }
    if let Some(index) = fields.iter().position(|f| f.width == 0) {
        return Err(StoreError::InvalidConfig(format!("field {index} has zero width")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::field::NumericKind;

    fn mixed_fields() -> [FieldDesc; 4] {
        [
            FieldDesc::new(NumericKind::U32, 1),
            FieldDesc::new(NumericKind::F32, 3),
            FieldDesc::new(NumericKind::U8, 1),
            FieldDesc::new(NumericKind::F64, 2),
        ]
    }

    #[test]
    fn test_store_creation() {
        let store = FieldStore::new(&mixed_fields(), 10).unwrap();
        assert_eq!(store.capacity(), 10);
        assert_eq!(store.field_count(), 4);
        assert_eq!(store.generation(), 0);
        assert!(store.bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            FieldStore::new(&[], 4),
            Err(StoreError::InvalidConfig(_))
        ));
        assert!(matches!(
            FieldStore::new(&mixed_fields(), 0),
            Err(StoreError::InvalidConfig(_))
        ));
        assert!(matches!(
            FieldStore::new(&[FieldDesc::new(NumericKind::F32, 0)], 4),
            Err(StoreError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_unaddressable_capacity() {
        let matrix = [FieldDesc::new(NumericKind::F32, 16)];
        assert!(matches!(
            FieldStore::new(&matrix, 1 << 60),
            Err(StoreError::InvalidConfig(_))
        ));
        assert!(matches!(
            FieldStore::required_bytes(&matrix, 1 << 60),
            Err(StoreError::InvalidConfig(_))
        ));
        assert!(matches!(
            FieldStore::with_buffer(&matrix, 1 << 60, vec![0u8; 64].into_boxed_slice()),
            Err(StoreError::InvalidConfig(_))
        ));

        let mut store = FieldStore::new(&matrix, 4).unwrap();
        let matrices = store.column::<[f32; 16]>(0).unwrap();
        store.set(matrices, 3, [1.0; 16]);
        assert!(matches!(
            store.resize(1 << 60),
            Err(StoreError::InvalidConfig(_))
        ));
        assert!(matches!(
            store.resize_with_buffer(1 << 60, vec![0u8; 64].into_boxed_slice()),
            Err(StoreError::InvalidConfig(_))
        ));

        // A failed resize leaves the store untouched.
        assert_eq!(store.capacity(), 4);
        assert_eq!(store.generation(), 0);
        assert_eq!(store.get(matrices, 3), [1.0; 16]);
    }

    #[test]
    fn test_resize_with_buffer_same_capacity_is_noop() {
        let mut store = FieldStore::new(&mixed_fields(), 4).unwrap();
        let ids = store.column::<u32>(0).unwrap();
        store.set(ids, 2, 11);

        let required = FieldStore::required_bytes(&mixed_fields(), 4).unwrap();
        let buffer = vec![0u8; required].into_boxed_slice();
        assert!(!store.resize_with_buffer(4, buffer).unwrap());
        assert_eq!(store.generation(), 0);
        assert_eq!(store.get(ids, 2), 11);
    }

    #[test]
    fn test_column_type_checks() {
        let store = FieldStore::new(&mixed_fields(), 4).unwrap();
        assert!(store.column::<u32>(0).is_ok());
        assert!(store.column::<[f32; 3]>(1).is_ok());
        assert!(matches!(
            store.column::<[f32; 4]>(1),
            Err(StoreError::FieldTypeMismatch { field: 1, expected: 12, actual: 16, .. })
        ));
        assert!(matches!(
            store.column::<u32>(9),
            Err(StoreError::FieldOutOfRange { field: 9, count: 4 })
        ));
    }

    #[test]
    fn test_fields_do_not_overlap() {
        let mut store = FieldStore::new(&mixed_fields(), 5).unwrap();
        let ids = store.column::<u32>(0).unwrap();
        let flags = store.column::<u8>(2).unwrap();

        for i in 0..5 {
            store.set(ids, i, u32::MAX);
        }
        assert!(store.slice(flags).iter().all(|&f| f == 0));

        store.set(flags, 4, 7);
        assert_eq!(store.get(ids, 4), u32::MAX);
        assert_eq!(store.get(flags, 4), 7);
    }

    #[test]
    fn test_resize_same_capacity_is_noop() {
        let mut store = FieldStore::new(&mixed_fields(), 8).unwrap();
        assert!(!store.resize(8).unwrap());
        assert_eq!(store.generation(), 0);
    }

    #[test]
    fn test_resize_preserves_every_field() {
        let mut store = FieldStore::new(&mixed_fields(), 3).unwrap();
        let ids = store.column::<u32>(0).unwrap();
        let positions = store.column::<[f32; 3]>(1).unwrap();
        let flags = store.column::<u8>(2).unwrap();
        let pairs = store.column::<[f64; 2]>(3).unwrap();

        for i in 0..3 {
            let f = i as f32;
            store.set(ids, i, 100 + i as u32);
            store.set(positions, i, [f, f + 0.5, -f]);
            store.set(flags, i, i as u8 + 1);
            store.set(pairs, i, [f64::from(f), 2.0]);
        }

        assert!(store.resize(11).unwrap());
        assert_eq!(store.generation(), 1);

        for i in 0..3 {
            let f = i as f32;
            assert_eq!(store.get(ids, i), 100 + i as u32);
            assert_eq!(store.get(positions, i), [f, f + 0.5, -f]);
            assert_eq!(store.get(flags, i), i as u8 + 1);
            assert_eq!(store.get(pairs, i), [f64::from(f), 2.0]);
        }
        for i in 3..11 {
            assert_eq!(store.get(ids, i), 0);
            assert_eq!(store.get(flags, i), 0);
        }
    }

    #[test]
    fn test_shrink_keeps_prefix() {
        let mut store = FieldStore::new(&mixed_fields(), 6).unwrap();
        let ids = store.column::<u32>(0).unwrap();
        for i in 0..6 {
            store.set(ids, i, i as u32 * 3);
        }

        assert!(store.resize(2).unwrap());
        assert_eq!(store.slice(ids), &[0, 3]);
    }

    #[test]
    fn test_supplied_buffer() {
        let fields = mixed_fields();
        let required = FieldStore::required_bytes(&fields, 4).unwrap();

        let too_small = vec![0u8; required - 1].into_boxed_slice();
        assert!(matches!(
            FieldStore::with_buffer(&fields, 4, too_small),
            Err(StoreError::InvalidBuffer { .. })
        ));

        let buffer = vec![0xAAu8; required + 16].into_boxed_slice();
        // The allocator decides the address; only an aligned block is accepted.
        if buffer.as_ptr() as usize % FIELD_ALIGN == 0 {
            let mut store = FieldStore::with_buffer(&fields, 4, buffer).unwrap();
            assert_eq!(store.capacity(), 4);
            assert!(store.bytes().iter().all(|&b| b == 0));

            let ids = store.column::<u32>(0).unwrap();
            store.set(ids, 3, 42);
            assert!(store.resize(9).unwrap());
            assert_eq!(store.get(ids, 3), 42);
        }
    }

    #[test]
    fn test_misaligned_buffer_rejected() {
        assert!(check_buffer(0x1000, 64, 64).is_ok());
        assert!(matches!(
            check_buffer(0x1003, 64, 64),
            Err(StoreError::InvalidBuffer { misalignment: 3, .. })
        ));
        assert!(matches!(
            check_buffer(0x1000, 63, 64),
            Err(StoreError::InvalidBuffer { required: 64, provided: 63, .. })
        ));
    }

    #[test]
    fn test_zero_slot() {
        let mut store = FieldStore::new(&mixed_fields(), 4).unwrap();
        let ids = store.column::<u32>(0).unwrap();
        let positions = store.column::<[f32; 3]>(1).unwrap();
        store.set(ids, 2, 9);
        store.set(ids, 3, 9);
        store.set(positions, 2, [1.0, 1.0, 1.0]);

        store.zero_slot(2);
        assert_eq!(store.get(ids, 2), 0);
        assert_eq!(store.get(positions, 2), [0.0; 3]);
        assert_eq!(store.get(ids, 3), 9);
    }

    #[test]
    fn test_copy_slot() {
        let mut store = FieldStore::new(&mixed_fields(), 4).unwrap();
        let ids = store.column::<u32>(0).unwrap();
        let pairs = store.column::<[f64; 2]>(3).unwrap();
        store.set(ids, 1, 5);
        store.set(pairs, 1, [1.5, -2.0]);

        store.copy_slot(1, 3);
        assert_eq!(store.get(ids, 3), 5);
        assert_eq!(store.get(pairs, 3), [1.5, -2.0]);
        assert_eq!(store.get(ids, 2), 0);
    }
}
