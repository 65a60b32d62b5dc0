#![allow(dead_code)]

use robots_level::{Format, COLUMN_STRIDE, DOOR, KEY, PLAYER};

/// Byte used for the fill region of generated levels.
pub const FILL: u8 = 0xAA;

/// A level in the given layout with a player, a few robots, a door, a key,
/// a patterned map and a fill region of [`FILL`].
pub fn level(format: Format) -> Vec<u8> {
    let variant = format.variant();
    let mut raw = vec![0; variant.total_file_size];
    raw[..variant.header_length].copy_from_slice(&variant.canonical_header());

    let table = variant.header_length;
    let mut put = |slot: usize, columns: [u8; 8]| {
        for (column, byte) in columns.into_iter().enumerate() {
            raw[table + column * COLUMN_STRIDE + slot] = byte;
        }
    };
    put(0, [PLAYER, 5, 7, 0, 0, 0, 0, 12]);
    for slot in 1..20 {
        let n = slot as u8;
        put(slot, [9, n * 3, n, 0, 2, 0, 0, 10]);
    }
    put(32, [DOOR, 40, 20, 1, 5, 2, 0, 0]);
    put(48, [KEY, 60, 30, 2, 0, 0, 0, 0]);

    for byte in &mut raw[variant.units_end()..variant.map_offset()] {
        *byte = FILL;
    }
    for (i, byte) in raw[variant.map_offset()..].iter_mut().enumerate() {
        *byte = (i % 251) as u8;
    }
    raw
}
