//! The registry of known level layouts.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Width of the tile grid, in tiles.
pub const MAP_WIDTH: usize = 128;
/// Height of the tile grid, in tiles.
pub const MAP_HEIGHT: usize = 64;
/// Number of bytes in the tile grid. The grid is always the tail of a level file.
pub const MAP_SIZE: usize = MAP_WIDTH * MAP_HEIGHT;

/// Distance between two attribute columns of the unit table.
///
/// This never changes with [`Variant::unit_block_size`].
pub const COLUMN_STRIDE: usize = 0x40;
/// Number of attribute columns (type, x, y, a, b, c, d, health).
pub const COLUMN_COUNT: usize = 8;
/// Span of the unit table from its first slot to the end of the health column.
pub const UNIT_TABLE_SIZE: usize = COLUMN_STRIDE * COLUMN_COUNT;

/// The platform family a level file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// PET, C64 and C128.
    Pet,
    /// MS-DOS and Amiga.
    Msd,
    /// The Commander X16 port.
    X16,
}

/// Byte-level parameters of one [`Format`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    /// Which format these parameters describe.
    pub name: Format,
    /// Number of header bytes written in front of the unit table.
    pub header_length: usize,
    /// Canonical header, read big-endian. Only the last `header_length` bytes are used.
    pub header_marker: u16,
    /// Number of slots read from each attribute column.
    pub unit_block_size: usize,
    /// Size of the padding region between the unit table and the tile grid.
    pub fill_region_size: usize,
    /// Exact size of a file in this format.
    pub total_file_size: usize,
    /// Type byte of the player, which is always the first unit.
    pub player_sentinel_byte: u8,
}

static PET: Variant = Variant {
    name: Format::Pet,
    header_length: 2,
    header_marker: 0x005D,
    unit_block_size: 66,
    fill_region_size: 256,
    total_file_size: 8962,
    player_sentinel_byte: 0x01,
};

static MSD: Variant = Variant {
    name: Format::Msd,
    header_length: 0,
    header_marker: 0x0000,
    unit_block_size: 64,
    fill_region_size: 256,
    total_file_size: 8960,
    player_sentinel_byte: 0x01,
};

// The header marker varies between download sources (0x5D or 0x7D),
// so only the canonical one is recorded.
static X16: Variant = Variant {
    name: Format::X16,
    header_length: 2,
    header_marker: 0x005D,
    unit_block_size: 66,
    fill_region_size: 0,
    total_file_size: 8706,
    player_sentinel_byte: 0x01,
};

impl Format {
    /// Every known format, in detection priority order.
    pub const ALL: [Format; 3] = [Format::Msd, Format::Pet, Format::X16];

    /// Returns the layout parameters of this format.
    #[must_use]
    pub fn variant(self) -> &'static Variant {
        match self {
            Format::Pet => &PET,
            Format::Msd => &MSD,
            Format::X16 => &X16,
        }
    }

    /// Finds the format whose files have exactly `size` bytes.
    #[must_use]
    pub fn from_file_size(size: usize) -> Option<Format> {
        Format::ALL
            .into_iter()
            .find(|format| format.variant().total_file_size == size)
    }

    /// The short name used for file extensions and on the command line.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Format::Pet => "PET",
            Format::Msd => "MSD",
            Format::X16 => "X16",
        }
    }
}

impl Variant {
    /// The canonical header bytes for this layout.
    #[must_use]
    pub fn canonical_header(&self) -> Vec<u8> {
        let marker = self.header_marker.to_be_bytes();
        marker[marker.len() - self.header_length..].to_vec()
    }

    /// Offset of the first fill byte (and of the first map byte when there is no fill region).
    #[inline]
    #[must_use]
    pub fn units_end(&self) -> usize {
        self.header_length + UNIT_TABLE_SIZE
    }

    /// Offset at which the tile grid starts.
    #[inline]
    #[must_use]
    pub fn map_offset(&self) -> usize {
        self.total_file_size - MAP_SIZE
    }
}

impl Display for Format {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The name given to [`Format::from_str`] did not match any format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFormatName(pub String);

impl Display for UnknownFormatName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "unknown level format \"{}\", expected PET, MSD or X16", self.0)
    }
}

impl std::error::Error for UnknownFormatName {}

impl FromStr for Format {
    type Err = UnknownFormatName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Format::ALL
            .into_iter()
            .find(|format| format.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownFormatName(s.to_owned()))
    }
}
