//! Recognizes the layout of a level file from its size and first bytes.

use crate::variant::Format;
use byteorder::{BigEndian, ReadBytesExt};

/// The outcome of a successful [`detect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    /// The matched layout.
    pub format: Format,
    /// The byte right after the unit table, for layouts that have a fill region.
    pub fill_byte: Option<u8>,
}

/// Detect the layout of a raw level file.
///
/// The file size is checked first, since headers alone cannot tell the
/// layouts apart. Returns `None` if the file matches no known layout.
#[must_use]
pub fn detect(raw: &[u8]) -> Option<Detection> {
    let format = if is_msd(raw) {
        Format::Msd
    } else if is_pet(raw) {
        Format::Pet
    } else if raw.len() == Format::X16.variant().total_file_size {
        // No header check here, X16 files ship with either 0x5D or 0x7D.
        Format::X16
    } else {
        tracing::debug!(size = raw.len(), "no level layout matches");
        return None;
    };
    let variant = format.variant();
    let fill_byte = if variant.fill_region_size > 0 {
        raw.get(variant.units_end()).copied()
    } else {
        None
    };
    tracing::debug!(%format, ?fill_byte, "detected level layout");
    Some(Detection { format, fill_byte })
}

fn is_msd(raw: &[u8]) -> bool {
    let msd = Format::Msd.variant();
    raw.len() == msd.total_file_size && raw[0] == msd.player_sentinel_byte
}

fn is_pet(mut raw: &[u8]) -> bool {
    let pet = Format::Pet.variant();
    raw.len() == pet.total_file_size
        && raw
            .read_u16::<BigEndian>()
            .is_ok_and(|marker| marker == pet.header_marker)
}
