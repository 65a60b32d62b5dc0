mod common;

use const_str::concat_bytes;
use robots_level::{
    convert, detect, Detection, Format, LevelImage, TileGrid, Unit, COLUMN_STRIDE, MAP_SIZE,
    PLAYER,
};

#[test]
fn decode_encode_is_identity() -> Result<(), Box<dyn std::error::Error>> {
    for format in Format::ALL {
        let raw = common::level(format);
        let level = LevelImage::decode(&raw, None)?;
        assert_eq!(level.format(), format);
        assert_eq!(level.unit_slot_offset(), format.variant().header_length);
        assert_eq!(level.units().len(), format.variant().unit_block_size);
        assert_eq!(level.encode(format), raw, "{format} round trip");
    }
    Ok(())
}

#[test]
fn columns_are_a_fixed_stride_apart() -> Result<(), Box<dyn std::error::Error>> {
    let raw = common::level(Format::Pet);
    let level = LevelImage::decode(&raw, Some(Format::Pet))?;
    let units = level.units();
    assert_eq!(units.len(), 66);
    assert_eq!(units[0], Unit::from_columns([PLAYER, 5, 7, 0, 0, 0, 0, 12]));
    assert_eq!(units[3].x, 9);

    // The two slots past each column read the start of the next column.
    assert_eq!(units[64].kind, raw[2 + COLUMN_STRIDE]);
    assert_eq!(units[64].kind, 5);
    assert_eq!(units[65].y, raw[2 + 3 * COLUMN_STRIDE + 1]);
    // The last column runs into the fill region.
    assert_eq!(units[64].health, common::FILL);
    Ok(())
}

#[test]
fn bare_msd_level() -> Result<(), Box<dyn std::error::Error>> {
    let mut raw = vec![0; 8960];
    raw[0] = 0x01;
    assert_eq!(
        detect(&raw),
        Some(Detection {
            format: Format::Msd,
            fill_byte: Some(0)
        })
    );

    let level = LevelImage::decode(&raw, None)?;
    assert_eq!(level.unit_slot_offset(), 0);
    assert!(level.header_bytes.is_empty());
    assert_eq!(level.units().len(), 64);
    assert_eq!(level.units()[0].kind, PLAYER);
    assert!(level.units()[1..].iter().all(Unit::is_empty));
    assert_eq!(level.fill_bytes, [raw[0x200]; 256]);
    assert!(level.tiles.cells().iter().all(|tile| *tile == Some(0)));
    assert_eq!(level.map_offset(), 8960 - MAP_SIZE);
    Ok(())
}

#[test]
fn pet_to_x16() -> Result<(), Box<dyn std::error::Error>> {
    const PREFIX: &[u8] = concat_bytes!(
        b"\x00\x5D", // Header
        1,           // Player
    );
    let mut raw = PREFIX.to_vec();
    raw.resize(8962, 0);
    raw[8962 - MAP_SIZE..].fill(0x33);

    let x16 = convert(&raw, Format::X16)?;
    assert_eq!(x16.len(), 8706);
    assert_eq!(x16[..3], *PREFIX);
    assert_eq!(detect(&x16).map(|found| found.fill_byte), Some(None));
    assert_eq!(x16[8706 - MAP_SIZE..], raw[8962 - MAP_SIZE..]);
    Ok(())
}

#[test]
fn conversion_keeps_content() -> Result<(), Box<dyn std::error::Error>> {
    for source in Format::ALL {
        let raw = common::level(source);
        let decoded = LevelImage::decode(&raw, None)?;
        for target in Format::ALL {
            let converted = convert(&raw, target)?;
            assert_eq!(converted.len(), target.variant().total_file_size);

            let level = LevelImage::decode(&converted, None)?;
            assert_eq!(level.format(), target);
            assert_eq!(level.tiles, decoded.tiles);
            assert_eq!(level.units()[..64], decoded.units()[..64]);
        }
    }
    Ok(())
}

#[test]
fn fill_region_is_padded_when_resized() -> Result<(), Box<dyn std::error::Error>> {
    let msd = common::level(Format::Msd);
    let pet = convert(&msd, Format::Pet)?;
    let variant = Format::Pet.variant();
    assert_eq!(pet[..2], [0x00, 0x5D]);
    assert!(pet[variant.units_end()..variant.map_offset()]
        .iter()
        .all(|byte| *byte == common::FILL));

    // X16 has no fill region, so nothing is known about the fill byte.
    let x16 = common::level(Format::X16);
    let pet = convert(&x16, Format::Pet)?;
    assert!(pet[variant.units_end()..variant.map_offset()]
        .iter()
        .all(|byte| *byte == 0));
    Ok(())
}

#[test]
fn x16_header_is_kept_only_for_x16() -> Result<(), Box<dyn std::error::Error>> {
    let mut raw = common::level(Format::X16);
    raw[1] = 0x7D;
    let level = LevelImage::decode(&raw, None)?;
    assert_eq!(level.format(), Format::X16);
    assert_eq!(level.header_bytes, [0x00, 0x7D]);
    assert_eq!(level.encode(Format::X16), raw);
    assert!(level.encode(Format::Msd).starts_with(&[PLAYER]));

    let pet = convert(&raw, Format::Pet)?;
    assert_eq!(pet[..2], [0x00, 0x5D]);
    assert_eq!(detect(&pet).map(|found| found.format), Some(Format::Pet));
    // And back again.
    let x16 = convert(&pet, Format::X16)?;
    assert_eq!(x16[..2], [0x00, 0x5D]);
    assert_eq!(x16[2..], raw[2..]);
    Ok(())
}

#[test]
fn edits_survive_encoding() -> Result<(), Box<dyn std::error::Error>> {
    let mut level = LevelImage::blank(Format::Pet);
    level.tiles[(127, 63)] = Some(0xF0);
    level.units_mut()[20] = Unit {
        kind: 17,
        x: 100,
        y: 50,
        health: 8,
        ..Unit::new()
    };
    let raw = level.encode(Format::Pet);
    assert_eq!(raw[raw.len() - 1], 0xF0);

    let read = LevelImage::read(raw.as_slice(), None)?;
    assert_eq!(read.units()[20], level.units()[20]);
    assert_eq!(read.tiles[(127, 63)], Some(0xF0));
    assert_eq!(read.tiles[(0, 0)], Some(0), "empty cells are saved as tile 0");

    let mut written = Vec::new();
    read.write(&mut written, Format::Pet)?;
    assert_eq!(written, raw);
    Ok(())
}

#[test]
#[should_panic(expected = "y 64 is out of bounds")]
fn tile_index_checks_rows() {
    let grid = TileGrid::new();
    let tile = grid[(0, 64)];
    assert!(tile.is_none());
}

#[test]
fn tile_lookup_outside_the_map() {
    let mut grid = TileGrid::new();
    assert!(grid.get((0, 64)).is_none());
    assert!(grid.get_mut((0, usize::MAX / 2)).is_none());
    assert!(grid.get((127, 63)).is_some());
}
