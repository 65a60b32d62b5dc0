use crate::unit::Unit;
use crate::variant::{Variant, COLUMN_COUNT, COLUMN_STRIDE};

/// Build the header for `target` out of the header a level was read with.
///
/// The given bytes are laid over the canonical header right-aligned,
/// so the bytes next to the unit table are the ones that survive.
pub(crate) fn fit_header(header: &[u8], target: &Variant) -> Vec<u8> {
    let mut fitted = target.canonical_header();
    let kept = header.len().min(fitted.len());
    let start = fitted.len() - kept;
    fitted[start..].copy_from_slice(&header[header.len() - kept..]);
    fitted
}

/// Scatter `units` into the attribute columns starting at `offset`.
///
/// Exactly `count` slots are written per column, missing units are written as zeros.
/// Columns are written in order, so a column's overflow slots are
/// overwritten by the next column.
pub(crate) fn write_columns(buf: &mut [u8], offset: usize, units: &[Unit], count: usize) {
    for column in 0..COLUMN_COUNT {
        let start = offset + column * COLUMN_STRIDE;
        for (slot, byte) in buf[start..start + count].iter_mut().enumerate() {
            *byte = units
                .get(slot)
                .map_or(0, |unit| unit.to_columns()[column]);
        }
    }
}
