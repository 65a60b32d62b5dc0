use crate::unit::Unit;
use crate::variant::{COLUMN_COUNT, COLUMN_STRIDE};

/// Find where the unit table starts, i.e. the first occurrence of the player's type byte.
pub(crate) fn find_unit_table(raw: &[u8], sentinel: u8) -> Option<usize> {
    memchr::memchr(sentinel, raw)
}

/// Gather `count` units from the attribute columns starting at `offset`.
///
/// Columns are always `COLUMN_STRIDE` apart, so when `count` is larger than
/// the stride the last slots of a column read the start of the next one.
/// The caller guarantees that `raw` holds every byte read.
pub(crate) fn read_columns(raw: &[u8], offset: usize, count: usize) -> Vec<Unit> {
    (0..count)
        .map(|slot| {
            let mut row = [0; COLUMN_COUNT];
            for (column, byte) in row.iter_mut().enumerate() {
                *byte = raw[offset + column * COLUMN_STRIDE + slot];
            }
            Unit::from_columns(row)
        })
        .collect()
}

/// Number of bytes `read_columns` needs after `offset`.
pub(crate) fn columns_span(count: usize) -> usize {
    (COLUMN_COUNT - 1) * COLUMN_STRIDE + count
}
