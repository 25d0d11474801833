//! Field layout of the transform store.

use glam::{Mat4, Quat, Vec3};
use strata_core::{Column, EntityId, FieldDesc, FieldStore, NumericKind, StoreResult};

const ENTITY: usize = 0;
const PARENT: usize = 1;
const FIRST_CHILD: usize = 2;
const PREV_SIBLING: usize = 3;
const NEXT_SIBLING: usize = 4;
const LOCAL_POSITION: usize = 5;
const LOCAL_ROTATION: usize = 6;
const LOCAL_SCALE: usize = 7;
const LOCAL_MATRIX: usize = 8;
const WORLD_MATRIX: usize = 9;

/// One descriptor per transform field, indexed by the constants above.
pub(crate) const FIELDS: [FieldDesc; 10] = [
    FieldDesc::new(NumericKind::U64, 1),
    FieldDesc::new(NumericKind::U32, 1),
    FieldDesc::new(NumericKind::U32, 1),
    FieldDesc::new(NumericKind::U32, 1),
    FieldDesc::new(NumericKind::U32, 1),
    FieldDesc::new(NumericKind::F32, 3),
    FieldDesc::new(NumericKind::F32, 4),
    FieldDesc::new(NumericKind::F32, 3),
    FieldDesc::new(NumericKind::F32, 16),
    FieldDesc::new(NumericKind::F32, 16),
];

/// Typed keys for every transform field.
///
/// Keys hold field indices only, so they stay valid when the store grows.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Columns {
    pub entity: Column<EntityId>,
    pub parent: Column<u32>,
    pub first_child: Column<u32>,
    pub prev_sibling: Column<u32>,
    pub next_sibling: Column<u32>,
    pub local_position: Column<Vec3>,
    pub local_rotation: Column<Quat>,
    pub local_scale: Column<Vec3>,
    pub local_matrix: Column<Mat4>,
    pub world_matrix: Column<Mat4>,
}

impl Columns {
    pub fn resolve(store: &FieldStore) -> StoreResult<Self> {
        Ok(Self {
            entity: store.column(ENTITY)?,
            parent: store.column(PARENT)?,
            first_child: store.column(FIRST_CHILD)?,
            prev_sibling: store.column(PREV_SIBLING)?,
            next_sibling: store.column(NEXT_SIBLING)?,
            local_position: store.column(LOCAL_POSITION)?,
            local_rotation: store.column(LOCAL_ROTATION)?,
            local_scale: store.column(LOCAL_SCALE)?,
            local_matrix: store.column(LOCAL_MATRIX)?,
            world_matrix: store.column(WORLD_MATRIX)?,
        })
    }
}
