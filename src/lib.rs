#![warn(missing_docs)]
#![warn(clippy::pedantic, clippy::perf, clippy::cargo)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::too_many_lines,
    clippy::cast_lossless,
    clippy::module_name_repetitions
)]

/*!
Library to read, convert and edit level files of *Attack of the PETSCII Robots*.

Three layouts exist for the same level content: PET/C64/C128, MS-DOS/Amiga and the X16 port.
Every layout is a unit table of 8 attribute columns, an optional fill region,
and a 128×64 tile grid at the very end of the file.

```rust
# use robots_level::{Format, LevelImage};
# fn main() -> Result<(), robots_level::Error> {
let mut raw = vec![0; 8960];
raw[0] = 0x01; // the player
let mut level = LevelImage::decode(&raw, None)?;
assert_eq!(level.format(), Format::Msd);

level.tiles[(5, 3)] = Some(42);
level.units_mut()[1].kind = 9;

let pet = level.encode(Format::Pet);
assert_eq!(pet.len(), 8962);
assert_eq!(pet[..3], [0x00, 0x5D, 0x01]);
# Ok(())
# }
```
 */

use std::fmt::{Display, Formatter};
use std::{
    fs, io,
    io::{Read, Write},
    ops::{Index, IndexMut},
    path::Path,
};

mod convert;
mod detect;
mod formatting;
mod map_model;
mod read_helper;
pub mod tiled;
mod unit;
mod variant;
mod write_helper;

pub use convert::{convert, convert_file, ConversionReport};
pub use detect::{detect, Detection};
pub use map_model::MapModel;
pub use unit::{attribute_labels, type_name, Unit, UnitGroup, DOOR, KEY, PLAYER};
pub use variant::{
    Format, UnknownFormatName, Variant, COLUMN_COUNT, COLUMN_STRIDE, MAP_HEIGHT, MAP_SIZE,
    MAP_WIDTH, UNIT_TABLE_SIZE,
};

/// A reason why reading, converting or editing a level failed.
pub enum Error {
    /// IO error.
    Io(io::Error),
    /// The data matches none of the known level layouts.
    UnrecognizedFormat {
        /// Size of the rejected data.
        size: usize,
    },
    /// The unit table or the map could not be located in the data.
    TruncatedFile(String),
    /// A Tiled map does not have the expected shape.
    StructuralMismatch {
        /// The part of the map that was checked.
        what: String,
        /// How many entries it should have.
        expected: usize,
        /// How many entries were found.
        found: usize,
    },
    /// A level rebuilt from a Tiled map does not have the recorded file size.
    SizeMismatch {
        /// The recorded file size.
        expected: usize,
        /// The size of the rebuilt level.
        found: usize,
    },
    /// A Tiled map could not be read as a level.
    MalformedDocument(String),
    /// There is no unit slot with this index.
    SlotOutOfRange(usize),
    /// This unit slot cannot be removed.
    ReservedSlot(usize),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err) => write!(f, "{err}"),
            Error::UnrecognizedFormat { size } => {
                write!(f, "unknown level architecture ({size} bytes)")
            }
            Error::TruncatedFile(why) => write!(f, "truncated level file: {why}"),
            Error::StructuralMismatch {
                what,
                expected,
                found,
            } => write!(f, "{what} count is {found}, must be {expected}"),
            Error::SizeMismatch { expected, found } => write!(
                f,
                "calculated file size {found} is different from expected file size {expected}"
            ),
            Error::MalformedDocument(why) => write!(f, "malformed Tiled map: {why}"),
            Error::SlotOutOfRange(slot) => write!(f, "there is no unit slot {slot}"),
            Error::ReservedSlot(slot) => write!(f, "unit slot {slot} cannot be removed"),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

/// A decoded level.
#[derive(Clone, PartialEq, Eq)]
pub struct LevelImage {
    /// The bytes in front of the unit table.
    pub header_bytes: Vec<u8>,
    pub(crate) units: Vec<Unit>,
    /// The bytes between the unit table and the map, kept as they were read.
    pub fill_bytes: Vec<u8>,
    /// The map.
    pub tiles: TileGrid,
    pub(crate) unit_slot_offset: usize,
    pub(crate) format: Format,
}

impl LevelImage {
    /// Decode a level.
    ///
    /// If `format` is `None`, the layout is detected from the data.
    /// The unit table is always located by searching for the player,
    /// since real files disagree on the length of their header.
    ///
    /// # Errors
    /// Errors if the layout is unknown, or the unit table or map can't be found.
    pub fn decode(raw: &[u8], format: Option<Format>) -> Result<Self, Error> {
        let format = match format {
            Some(format) => format,
            None => {
                detect(raw)
                    .ok_or(Error::UnrecognizedFormat { size: raw.len() })?
                    .format
            }
        };
        let sentinel = format.variant().player_sentinel_byte;
        let offset = read_helper::find_unit_table(raw, sentinel).ok_or_else(|| {
            Error::TruncatedFile(format!("no player unit (0x{sentinel:02X}) found"))
        })?;
        Self::decode_at(raw, format, offset)
    }

    /// Decode a level whose unit table starts at `offset`.
    pub(crate) fn decode_at(raw: &[u8], format: Format, offset: usize) -> Result<Self, Error> {
        let map_offset = raw.len().checked_sub(MAP_SIZE).ok_or_else(|| {
            Error::TruncatedFile(format!(
                "{} bytes cannot hold a map of {MAP_SIZE} bytes",
                raw.len()
            ))
        })?;
        let units_end = offset + UNIT_TABLE_SIZE;
        if units_end > map_offset {
            return Err(Error::TruncatedFile(format!(
                "unit table at 0x{offset:04X} runs into the map at 0x{map_offset:04X}"
            )));
        }
        let block_size = format.variant().unit_block_size;
        if offset + read_helper::columns_span(block_size) > raw.len() {
            return Err(Error::TruncatedFile(format!(
                "{block_size} unit slots at 0x{offset:04X} run past the end of the file"
            )));
        }
        tracing::debug!(%format, offset, map_offset, "decoding level");
        Ok(LevelImage {
            header_bytes: raw[..offset].to_vec(),
            units: read_helper::read_columns(raw, offset, block_size),
            fill_bytes: raw[units_end..map_offset].to_vec(),
            tiles: TileGrid::from_bytes(&raw[map_offset..]),
            unit_slot_offset: offset,
            format,
        })
    }

    /// Encode the level in the layout of `target`.
    ///
    /// The result is always exactly [`Variant::total_file_size`] bytes long.
    /// The header read from the source is only kept when `target` is the
    /// layout the level was read in, other layouts get their canonical header.
    #[must_use]
    pub fn encode(&self, target: Format) -> Vec<u8> {
        let variant = target.variant();
        let fill_byte = self.fill_byte().unwrap_or(0);
        let mut buf = vec![fill_byte; variant.total_file_size];

        // Other layouts only load with their own marker.
        let header = if target == self.format {
            write_helper::fit_header(&self.header_bytes, variant)
        } else {
            variant.canonical_header()
        };
        buf[..header.len()].copy_from_slice(&header);
        write_helper::write_columns(
            &mut buf,
            variant.header_length,
            &self.units,
            variant.unit_block_size,
        );

        let fill = &mut buf[variant.units_end()..variant.map_offset()];
        if fill.len() == self.fill_bytes.len() {
            fill.copy_from_slice(&self.fill_bytes);
        } else {
            if !fill.is_empty() && !self.fill_bytes.is_empty() {
                tracing::warn!(
                    from = self.fill_bytes.len(),
                    to = fill.len(),
                    "fill region resized, filling with 0x{fill_byte:02X}"
                );
            }
            fill.fill(fill_byte);
        }

        buf[variant.map_offset()..].copy_from_slice(&self.tiles.to_bytes());
        debug_assert_eq!(buf.len(), variant.total_file_size);
        buf
    }

    /// Read and decode a level from a readable.
    ///
    /// # Errors
    /// Errors if reading fails or the data can't be decoded, see [`LevelImage::decode`].
    pub fn read(mut reader: impl Read, format: Option<Format>) -> Result<Self, Error> {
        let mut raw = Vec::new();
        reader.read_to_end(&mut raw)?;
        Self::decode(&raw, format)
    }

    /// Encode the level and write it to a writable.
    ///
    /// # Errors
    /// The data failed to be written.
    pub fn write(&self, mut writer: impl Write, target: Format) -> Result<(), io::Error> {
        writer.write_all(&self.encode(target))
    }

    /// Load a level file, detecting its layout.
    ///
    /// # Errors
    /// Errors if the file can't be read or decoded.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let raw = fs::read(path)?;
        tracing::info!(path = %path.display(), size = raw.len(), "loaded level file");
        Self::decode(&raw, None)
    }

    /// Save the level to a file in the layout of `target`.
    ///
    /// # Errors
    /// The file failed to be written.
    pub fn save(&self, path: impl AsRef<Path>, target: Format) -> Result<(), Error> {
        let path = path.as_ref();
        fs::write(path, self.encode(target))?;
        tracing::info!(path = %path.display(), format = %target, "saved level file");
        Ok(())
    }

    /// An empty level in the given layout, holding nothing but the player.
    #[must_use]
    pub fn blank(format: Format) -> Self {
        let variant = format.variant();
        let mut units = vec![Unit::default(); variant.unit_block_size];
        units[0].kind = variant.player_sentinel_byte;
        LevelImage {
            header_bytes: variant.canonical_header(),
            units,
            fill_bytes: vec![0; variant.fill_region_size],
            tiles: TileGrid::new(),
            unit_slot_offset: variant.header_length,
            format,
        }
    }

    /// The layout this level was read in.
    #[inline]
    #[must_use]
    pub fn format(&self) -> Format {
        self.format
    }

    /// Offset of the unit table in the data this level was read from.
    #[inline]
    #[must_use]
    pub fn unit_slot_offset(&self) -> usize {
        self.unit_slot_offset
    }

    /// Offset of the map in the data this level was read from.
    #[inline]
    #[must_use]
    pub fn map_offset(&self) -> usize {
        self.unit_slot_offset + UNIT_TABLE_SIZE + self.fill_bytes.len()
    }

    /// Size of the data this level was read from.
    #[inline]
    #[must_use]
    pub fn file_size(&self) -> usize {
        self.map_offset() + MAP_SIZE
    }

    /// The byte the fill region is padded with, if there is one.
    #[inline]
    #[must_use]
    pub fn fill_byte(&self) -> Option<u8> {
        self.fill_bytes.first().copied()
    }

    /// Returns the unit slots.
    #[inline]
    #[must_use]
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Returns the unit slots, mutably. The number of slots is fixed.
    #[inline]
    #[must_use]
    pub fn units_mut(&mut self) -> &mut [Unit] {
        &mut self.units
    }
}

/// The 128×64 tile map of a level.
///
/// Empty cells (`None`) are saved as tile 0.
#[derive(Clone, PartialEq, Eq)]
pub struct TileGrid {
    pub(crate) data: Vec<Option<u8>>,
}

impl Default for TileGrid {
    fn default() -> Self {
        TileGrid {
            data: vec![None; MAP_SIZE],
        }
    }
}

impl TileGrid {
    /// Constructs a grid where every cell is empty.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a grid from row-major tile bytes.
    ///
    /// # Panics
    /// Panics if `bytes` is not exactly [`MAP_SIZE`] long.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        assert_eq!(bytes.len(), MAP_SIZE, "a map is {MAP_SIZE} bytes");
        TileGrid {
            data: bytes.iter().copied().map(Some).collect(),
        }
    }

    /// Returns the row-major tile bytes of this grid.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.data.iter().map(|tile| tile.unwrap_or(0)).collect()
    }

    /// Returns all cells, row-major.
    #[inline]
    #[must_use]
    pub fn cells(&self) -> &[Option<u8>] {
        &self.data
    }

    /// Get a cell by position.
    /// Returns None if out of bounds.
    #[must_use]
    pub fn get(&self, (x, y): (usize, usize)) -> Option<&Option<u8>> {
        if x >= MAP_WIDTH || y >= MAP_HEIGHT {
            return None;
        }
        self.data.get(y * MAP_WIDTH + x)
    }

    /// Get a cell by position, mutably.
    /// Returns None if out of bounds.
    pub fn get_mut(&mut self, (x, y): (usize, usize)) -> Option<&mut Option<u8>> {
        if x >= MAP_WIDTH || y >= MAP_HEIGHT {
            return None;
        }
        self.data.get_mut(y * MAP_WIDTH + x)
    }
}

impl Index<(usize, usize)> for TileGrid {
    type Output = Option<u8>;

    /// Index by position and return a reference.
    ///
    /// # Panics
    /// Panics if index is out of bounds.
    fn index(&self, (x, y): (usize, usize)) -> &Self::Output {
        assert!(x < MAP_WIDTH, "x {x} is out of bounds");
        assert!(y < MAP_HEIGHT, "y {y} is out of bounds");
        &self.data[y * MAP_WIDTH + x]
    }
}

impl IndexMut<(usize, usize)> for TileGrid {
    /// Index by position and return a mutable reference.
    ///
    /// # Panics
    /// Panics if index is out of bounds.
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut Self::Output {
        assert!(x < MAP_WIDTH, "x {x} is out of bounds");
        assert!(y < MAP_HEIGHT, "y {y} is out of bounds");
        &mut self.data[y * MAP_WIDTH + x]
    }
}
