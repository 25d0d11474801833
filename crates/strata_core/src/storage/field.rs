//! # Field Descriptors and Layout
//!
//! A field is one fixed-width column of the store. The layout places every
//! field in its own sub-range of the shared buffer:
//!
//! ```text
//! | parent: u32 x cap | pad | position: f32x3 x cap | pad | matrix: f32x16 x cap |
//! ^ 0                       ^ 8k                           ^ 8m
//! ```
//!
//! Each sub-range is padded up to [`FIELD_ALIGN`] so that every field starts
//! on an 8-byte boundary no matter how wide its neighbours are.

/// Alignment of every field's sub-range inside the buffer.
pub const FIELD_ALIGN: usize = 8;

/// Rounds `value` up to the next multiple of [`FIELD_ALIGN`].
#[inline]
#[must_use]
pub const fn align_up(value: usize) -> usize {
    (value + FIELD_ALIGN - 1) & !(FIELD_ALIGN - 1)
}

/// Scalar type of one field component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NumericKind {
    /// Unsigned 8-bit integer.
    U8,
    /// Signed 8-bit integer.
    I8,
    /// Unsigned 16-bit integer.
    U16,
    /// Signed 16-bit integer.
    I16,
    /// Unsigned 32-bit integer.
    U32,
    /// Signed 32-bit integer.
    I32,
    /// 32-bit float.
    F32,
    /// Unsigned 64-bit integer.
    U64,
    /// Signed 64-bit integer.
    I64,
    /// 64-bit float.
    F64,
}

impl NumericKind {
    /// Size of one scalar in bytes.
    #[inline]
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
        }
    }
}

/// Describes one column: scalar kind and number of scalars per slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldDesc {
    /// Scalar kind.
    pub kind: NumericKind,
    /// Scalars per slot (3 for a position, 16 for a matrix).
    pub width: usize,
}

impl FieldDesc {
    /// Creates a field descriptor.
    #[inline]
    #[must_use]
    pub const fn new(kind: NumericKind, width: usize) -> Self {
        Self { kind, width }
    }

    /// Bytes occupied by one slot of this field.
    #[inline]
    #[must_use]
    pub const fn element_size(&self) -> usize {
        self.kind.size() * self.width
    }
}

/// A field placed inside a buffer of known capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PositionedField {
    /// The column description.
    pub desc: FieldDesc,
    /// Start of the field inside the buffer. Always a multiple of [`FIELD_ALIGN`].
    pub byte_offset: usize,
    /// Padded length of the field's sub-range.
    pub byte_length: usize,
}

impl PositionedField {
    /// Bytes of the sub-range actually covered by `capacity` slots (without padding).
    #[inline]
    #[must_use]
    pub const fn used_bytes(&self, capacity: usize) -> usize {
        self.desc.element_size() * capacity
    }
}

/// Places `fields` for `capacity` slots.
///
/// Returns the positioned fields and the total buffer size in bytes, or
/// `None` if the layout does not fit in `usize`.
#[must_use]
pub fn layout_fields(
    fields: &[FieldDesc],
    capacity: usize,
) -> Option<(Vec<PositionedField>, usize)> {
    let mut offset = 0usize;
    let mut positioned = Vec::with_capacity(fields.len());

    for &desc in fields {
        let used = desc.element_size().checked_mul(capacity)?;
        let byte_length = used.checked_add(FIELD_ALIGN - 1)? & !(FIELD_ALIGN - 1);
        positioned.push(PositionedField {
            desc,
            byte_offset: offset,
            byte_length,
        });
        offset = offset.checked_add(byte_length)?;
    }

    Some((positioned, offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0), 0);
        assert_eq!(align_up(1), 8);
        assert_eq!(align_up(8), 8);
        assert_eq!(align_up(12), 16);
    }

    #[test]
    fn test_odd_widths_stay_aligned() {
        let fields = [
            FieldDesc::new(NumericKind::U8, 1),
            FieldDesc::new(NumericKind::F32, 3),
            FieldDesc::new(NumericKind::U16, 3),
            FieldDesc::new(NumericKind::F64, 1),
        ];

        for capacity in [1, 2, 3, 7, 33] {
            let (positioned, total) = layout_fields(&fields, capacity).unwrap();
            for field in &positioned {
                assert_eq!(field.byte_offset % FIELD_ALIGN, 0);
                assert!(field.byte_length >= field.used_bytes(capacity));
            }
            let last = positioned.last().unwrap();
            assert_eq!(total, last.byte_offset + last.byte_length);
        }
    }

    #[test]
    fn test_layout_overflow() {
        let matrix = [FieldDesc::new(NumericKind::F32, 16)];
        assert!(layout_fields(&matrix, 1 << 60).is_none());
        assert!(layout_fields(&matrix, usize::MAX / 64 + 1).is_none());
        assert!(layout_fields(&[FieldDesc::new(NumericKind::U8, 1)], usize::MAX - 3).is_none());

        // Each field fits on its own, but their sum does not.
        let pair = [
            FieldDesc::new(NumericKind::U8, 1),
            FieldDesc::new(NumericKind::U8, 1),
        ];
        assert!(layout_fields(&pair, usize::MAX / 2 + 1).is_none());
        assert!(layout_fields(&pair, 1 << 20).is_some());
    }

    #[test]
    fn test_element_size() {
        assert_eq!(FieldDesc::new(NumericKind::F32, 16).element_size(), 64);
        assert_eq!(FieldDesc::new(NumericKind::U64, 1).element_size(), 8);
    }
}
