use super::{Animation, Frame, Image, Tileset};
use crate::{DOOR, KEY};

/// Milliseconds each animation frame is shown.
pub(crate) const FRAME_DURATION: u32 = 250;

/// First gid of the key icons.
const KEYS_GID: u32 = 501;

/// The gid shown for a unit in Tiled.
pub(crate) fn unit_gid(kind: u8, a: u8, c: u8) -> u32 {
    match (kind, a, c) {
        (KEY, 0..=2, _) => KEYS_GID + a as u32,
        (DOOR, _, 1..=3) => KEYS_GID + c as u32 - 1,
        (DOOR, 0, _) => 82,
        (DOOR, 1, _) => 73,
        _ => default_gid(kind),
    }
}

fn default_gid(kind: u8) -> u32 {
    match kind {
        0 => 1,
        1 => 301,
        2..=4 => 350,
        7 => 31,
        9 => 358,
        DOOR => 254,
        16 => 149,
        17 | 18 => 354,
        19 => 82,
        22 => 242,
        KEY => KEYS_GID,
        129 => 406,
        130 => 404,
        131 => 401,
        132 => 402,
        133 => 403,
        134 => 405,
        _ => 0,
    }
}

fn animation(tile_id: u32, frames: std::ops::RangeInclusive<u32>) -> Animation {
    Animation {
        tile_id,
        frames: frames
            .map(|tile_id| Frame {
                tile_id,
                duration: FRAME_DURATION,
            })
            .collect(),
    }
}

/// The four tilesets every level map refers to.
pub(crate) fn tilesets() -> Vec<Tileset> {
    vec![
        Tileset {
            first_gid: 1,
            name: "tiles".into(),
            tile_width: 24,
            tile_height: 24,
            tile_count: 277,
            columns: 1,
            fill_mode: None,
            image: Image {
                source: "tiles/merged_tiles.png".into(),
                width: 32,
                height: 6448,
                trans: None,
            },
            animations: vec![
                animation(66, 253..=256),  // flag
                animation(143, 269..=272), // server
                animation(148, 257..=260), // trash compactor
                animation(196, 261..=262), // fans
                animation(197, 263..=264),
                animation(200, 265..=266),
                animation(201, 267..=268),
                animation(204, 273..=276), // water
            ],
        },
        Tileset {
            first_gid: 301,
            name: "sprites".into(),
            tile_width: 24,
            tile_height: 24,
            tile_count: 83,
            columns: 1,
            fill_mode: None,
            image: Image {
                source: "tiles/spritesalpha.png".into(),
                width: 24,
                height: 1992,
                trans: Some("FF00FF".into()),
            },
            animations: vec![
                animation(0, 0..=15),   // player
                animation(49, 49..=52), // hover bot
                animation(53, 53..=56), // roller bot
                animation(57, 57..=72), // evil bot
            ],
        },
        Tileset {
            first_gid: 401,
            name: "secrets".into(),
            tile_width: 48,
            tile_height: 21,
            tile_count: 6,
            columns: 1,
            fill_mode: Some("preserve-aspect-fit".into()),
            image: Image {
                source: "tiles/items.png".into(),
                width: 48,
                height: 126,
                trans: Some("000000".into()),
            },
            animations: Vec::new(),
        },
        Tileset {
            first_gid: KEYS_GID,
            name: "keys".into(),
            tile_width: 16,
            tile_height: 14,
            tile_count: 3,
            columns: 1,
            fill_mode: None,
            image: Image {
                source: "tiles/keys.png".into(),
                width: 42,
                height: 16,
                trans: Some("000000".into()),
            },
            animations: Vec::new(),
        },
    ]
}
