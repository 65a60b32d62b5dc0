use crate::{LevelImage, MapModel, TileGrid, MAP_WIDTH};
use fmt::Debug;
use std::fmt;
use std::fmt::{Formatter, Write};

/// Writes bytes as `[00, 5D]`.
fn write_bytes(f: &mut impl Write, bytes: &[u8]) -> fmt::Result {
    f.write_char('[')?;
    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{byte:02X}")?;
    }
    f.write_char(']')
}

impl Debug for TileGrid {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            f.write_str("TileGrid [")?;
            for (i, tile) in self.data.iter().enumerate() {
                if i % MAP_WIDTH == 0 {
                    // Write newline and padding
                    f.write_str("\n    ")?;
                } else {
                    f.write_char(' ')?;
                }
                match tile {
                    Some(tile) => write!(f, "{tile:02X}")?,
                    None => f.write_str("..")?,
                }
            }
            f.write_str("\n]")
        } else {
            let filled = self.data.iter().filter(|tile| tile.is_some()).count();
            write!(f, "TileGrid {{ filled: {filled} }}")
        }
    }
}

impl Debug for LevelImage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "LevelImage {{")?;
            let mut buf = String::new();
            writeln!(buf, "format: {},", self.format)?;
            buf.write_str("header_bytes: ")?;
            write_bytes(&mut buf, &self.header_bytes)?;
            writeln!(buf, ",")?;
            writeln!(buf, "unit_slot_offset: 0x{:04X},", self.unit_slot_offset)?;
            writeln!(buf, "units: [")?;
            // Empty slots are left out
            for (slot, unit) in self.units.iter().enumerate() {
                if !unit.is_empty() {
                    writeln!(buf, "    {slot:2}: {unit:?},")?;
                }
            }
            writeln!(buf, "],")?;
            match self.fill_byte() {
                Some(byte) => writeln!(
                    buf,
                    "fill_bytes: {} x {byte:02X},",
                    self.fill_bytes.len()
                )?,
                None => writeln!(buf, "fill_bytes: [],")?,
            }
            writeln!(buf, "tiles: {:#?}", self.tiles)?;
            // Pad lines
            for line in buf.lines() {
                writeln!(f, "    {line}")?;
            }
            write!(f, "}}")
        } else {
            write!(f, "LevelImage {{ format: {}, header_bytes: ", self.format)?;
            write_bytes(f, &self.header_bytes)?;
            write!(
                f,
                ", units: {}, fill_bytes: {}, tiles: {:?} }}",
                self.units.iter().filter(|unit| !unit.is_empty()).count(),
                self.fill_bytes.len(),
                self.tiles
            )
        }
    }
}

impl Debug for MapModel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapModel")
            .field("image", self.image())
            .field("can_undo", &self.can_undo())
            .field("can_redo", &self.can_redo())
            .finish()
    }
}
