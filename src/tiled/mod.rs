//! Conversion between levels and [Tiled](https://www.mapeditor.org/) maps.
//!
//! A level becomes a map with one tile layer and five object groups, one per
//! [`UnitGroup`]. The map properties keep everything else needed to rebuild
//! the exact level file: its header, fill region, and size.
//!
//! Tiled numbers tiles from 1 and uses 0 for "no tile", so every tile is
//! shifted by one on the way out and back.

use crate::{
    attribute_labels, type_name, Error, Format, LevelImage, Unit, UnitGroup, COLUMN_COUNT,
    COLUMN_STRIDE, MAP_HEIGHT, MAP_SIZE, MAP_WIDTH,
};

mod tables;
mod xml;

pub use xml::DataEncoding;

/// Size of a tile in pixels.
pub const TILE_SIZE: u32 = 24;

/// Objects are anchored at their bottom edge, one tile below the unit's cell.
const OBJECT_Y_OFFSET: f64 = TILE_SIZE as f64;

/// A Tiled map of a level.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Map properties.
    pub properties: Vec<(String, Property)>,
    /// The tilesets, in gid order.
    pub tilesets: Vec<Tileset>,
    /// The tile layer holding the level map.
    pub layer: Layer,
    /// The object groups holding the units.
    pub object_groups: Vec<ObjectGroup>,
}

/// A value of a custom property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Property {
    /// Integer.
    Integer(i64),
    /// Text.
    String(String),
}

impl From<i64> for Property {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u8> for Property {
    fn from(value: u8) -> Self {
        Self::Integer(value.into())
    }
}

impl From<usize> for Property {
    fn from(value: usize) -> Self {
        Self::Integer(value as i64)
    }
}

impl From<String> for Property {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for Property {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl Property {
    /// The value as an integer, parsing text if needed.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Property::Integer(i) => Some(*i),
            Property::String(s) => s.trim().parse().ok(),
        }
    }
}

/// A tileset image atlas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tileset {
    /// Gid of the first tile.
    pub first_gid: u32,
    /// Name of the tileset.
    pub name: String,
    /// Width of a tile.
    pub tile_width: u32,
    /// Height of a tile.
    pub tile_height: u32,
    /// Number of tiles.
    pub tile_count: u32,
    /// Number of tile columns in the image.
    pub columns: u32,
    /// How tiles are scaled when used as objects.
    pub fill_mode: Option<String>,
    /// The atlas image.
    pub image: Image,
    /// Animated tiles.
    pub animations: Vec<Animation>,
}

/// The image of a [`Tileset`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    /// Path of the image, relative to the map.
    pub source: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Color treated as transparent, as hex RGB.
    pub trans: Option<String>,
}

/// The frames of an animated tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Animation {
    /// Local id of the animated tile.
    pub tile_id: u32,
    /// Frames, in order.
    pub frames: Vec<Frame>,
}

/// One frame of an [`Animation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Local id of the tile shown.
    pub tile_id: u32,
    /// Milliseconds the frame is shown.
    pub duration: u32,
}

/// A tile layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    /// Layer id.
    pub id: u32,
    /// Layer name.
    pub name: String,
    /// Width in tiles.
    pub width: u32,
    /// Height in tiles.
    pub height: u32,
    /// Row-major gids, 0 for no tile.
    pub data: Vec<u32>,
}

/// A group of objects.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectGroup {
    /// Layer id.
    pub id: u32,
    /// Group name.
    pub name: String,
    /// Whether Tiled shows the group.
    pub visible: bool,
    /// The objects.
    pub objects: Vec<Object>,
}

/// A tile object.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    /// Object id.
    pub id: u32,
    /// Object name.
    pub name: String,
    /// Gid of the tile shown.
    pub gid: u32,
    /// Left edge in pixels.
    pub x: f64,
    /// Bottom edge in pixels.
    pub y: f64,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Custom properties.
    pub properties: Vec<(String, Property)>,
}

impl Object {
    /// Returns the first property whose name satisfies `matches`.
    fn property(&self, matches: impl Fn(&str) -> bool) -> Option<&Property> {
        self.properties
            .iter()
            .find(|(name, _)| matches(name.as_str()))
            .map(|(_, value)| value)
    }
}

/// The name of the object group holding a [`UnitGroup`].
#[must_use]
pub fn group_name(group: UnitGroup) -> &'static str {
    match group {
        UnitGroup::Player => "Player (1)",
        UnitGroup::Robots => "Robots (27)",
        UnitGroup::Reserved => "Do not edit (4)",
        UnitGroup::DoorsAndTransport => "Doors and Transport (16)",
        UnitGroup::HiddenObjects => "Hidden Objects (16)",
    }
}

const FILE_NAME: &str = "File Name";
const FILE_SIZE: &str = "File Size";
const HEADER_BYTES: &str = "Header bytes";
const FILL_BYTES: &str = "Fill bytes";
const UNIT_OFFSET: &str = "Unit offset";
const MAP_OFFSET: &str = "Map offset";
const UNIT_TYPE: &str = "Unit type";

/// Build the Tiled map of a level. `name` names the tile layer and is
/// recorded as the file name to rebuild the level under.
#[must_use]
pub fn to_document(image: &LevelImage, name: &str) -> Document {
    let properties = vec![
        (FILE_NAME.to_owned(), name.into()),
        (FILE_SIZE.to_owned(), image.file_size().into()),
        (HEADER_BYTES.to_owned(), format_bytes(&image.header_bytes).into()),
        (FILL_BYTES.to_owned(), format_bytes(&image.fill_bytes).into()),
        (UNIT_OFFSET.to_owned(), image.unit_slot_offset().into()),
        (MAP_OFFSET.to_owned(), image.map_offset().into()),
    ];
    let layer = Layer {
        id: 1,
        name: name.to_owned(),
        width: MAP_WIDTH as u32,
        height: MAP_HEIGHT as u32,
        data: image
            .tiles
            .cells()
            .iter()
            .map(|tile| tile.map_or(0, |tile| tile as u32 + 1))
            .collect(),
    };
    let object_groups = UnitGroup::ALL
        .into_iter()
        .zip(2..)
        .map(|(group, id)| ObjectGroup {
            id,
            name: group_name(group).to_owned(),
            visible: group != UnitGroup::Reserved,
            objects: group
                .slots()
                .map(|slot| unit_object(slot, image.units().get(slot).copied().unwrap_or_default()))
                .collect(),
        })
        .collect();
    Document {
        properties,
        tilesets: tables::tilesets(),
        layer,
        object_groups,
    }
}

fn unit_object(slot: usize, unit: Unit) -> Object {
    let [a, b, c, d, h] = attribute_labels(unit.kind);
    let properties = vec![
        (UNIT_TYPE.to_owned(), unit.kind.into()),
        ("X".to_owned(), unit.x.into()),
        ("Y".to_owned(), unit.y.into()),
        (a.to_owned(), unit.a.into()),
        (b.to_owned(), unit.b.into()),
        (c.to_owned(), unit.c.into()),
        (d.to_owned(), unit.d.into()),
        (h.to_owned(), unit.health.into()),
    ];
    Object {
        id: slot as u32 + 1,
        name: type_name(unit.kind).map_or_else(|| format!("Type {}", unit.kind), str::to_owned),
        gid: tables::unit_gid(unit.kind, unit.a, unit.c),
        x: f64::from(unit.x) * f64::from(TILE_SIZE),
        y: f64::from(unit.y) * f64::from(TILE_SIZE) + OBJECT_Y_OFFSET,
        width: TILE_SIZE,
        height: TILE_SIZE,
        properties,
    }
}

/// Rebuild a level from its Tiled map.
///
/// # Errors
/// Errors if an object group is missing or doesn't hold exactly as many
/// units as it should, if the rebuilt level doesn't have the recorded
/// file size, or if a property or tile doesn't fit in a byte.
pub fn from_document(doc: &Document) -> Result<LevelImage, Error> {
    let (raw, format, offset) = rebuild(doc)?;
    LevelImage::decode_at(&raw, format, offset)
}

/// Rebuild the exact bytes of the level file a Tiled map was made from.
///
/// # Errors
/// Errors as [`from_document`] does.
pub fn to_level_bytes(doc: &Document) -> Result<Vec<u8>, Error> {
    let (raw, _, _) = rebuild(doc)?;
    Ok(raw)
}

/// Returns the level bytes, their layout and the offset of the unit table.
fn rebuild(doc: &Document) -> Result<(Vec<u8>, Format, usize), Error> {
    let mut units = Vec::with_capacity(COLUMN_STRIDE);
    for group in UnitGroup::ALL {
        let name = group_name(group);
        let objects = doc
            .object_groups
            .iter()
            .find(|candidate| candidate.name == name)
            .map_or(&[][..], |found| found.objects.as_slice());
        if objects.len() != group.slot_count() {
            return Err(Error::StructuralMismatch {
                what: name.to_owned(),
                expected: group.slot_count(),
                found: objects.len(),
            });
        }
        tracing::debug!(group = name, count = objects.len(), "object group checked");
        for object in objects {
            units.push(object_unit(object)?);
        }
    }

    if doc.layer.data.len() != MAP_SIZE {
        return Err(Error::StructuralMismatch {
            what: format!("tile layer \"{}\"", doc.layer.name),
            expected: MAP_SIZE,
            found: doc.layer.data.len(),
        });
    }

    let header = parse_bytes(HEADER_BYTES, map_property(doc, HEADER_BYTES)?)?;
    let fill = parse_bytes(FILL_BYTES, map_property(doc, FILL_BYTES)?)?;
    let file_size = integer(FILE_SIZE, map_property(doc, FILE_SIZE)?)?;
    if let Some(offset) = doc
        .properties
        .iter()
        .find(|(name, _)| name == UNIT_OFFSET)
        .and_then(|(_, value)| value.as_integer())
    {
        if offset != header.len() as i64 {
            return Err(Error::MalformedDocument(format!(
                "unit offset {offset} does not follow {} header bytes",
                header.len()
            )));
        }
    }

    let mut raw = Vec::with_capacity(header.len() + COLUMN_COUNT * units.len() + fill.len() + MAP_SIZE);
    raw.extend_from_slice(&header);
    for column in 0..COLUMN_COUNT {
        raw.extend(units.iter().map(|unit| unit.to_columns()[column]));
    }
    raw.extend_from_slice(&fill);
    for &gid in &doc.layer.data {
        let tile = u8::try_from(gid.saturating_sub(1)).map_err(|_| {
            Error::MalformedDocument(format!("tile gid {gid} is not a map tile"))
        })?;
        raw.push(tile);
    }

    if raw.len() as i64 != file_size {
        return Err(Error::SizeMismatch {
            expected: usize::try_from(file_size).unwrap_or_default(),
            found: raw.len(),
        });
    }
    let format =
        Format::from_file_size(raw.len()).ok_or(Error::UnrecognizedFormat { size: raw.len() })?;
    tracing::info!(%format, size = raw.len(), "rebuilt level from Tiled map");
    Ok((raw, format, header.len()))
}

fn object_unit(object: &Object) -> Result<Unit, Error> {
    let attribute = |letter: char| -> Result<u8, Error> {
        let value = object
            .property(|name| name.starts_with(letter))
            .ok_or_else(|| {
                Error::MalformedDocument(format!(
                    "object {} has no attribute {letter}",
                    object.id
                ))
            })?;
        byte(&format!("attribute {letter} of object {}", object.id), value)
    };
    let kind = object
        .property(|name| name == UNIT_TYPE)
        .ok_or_else(|| {
            Error::MalformedDocument(format!("object {} has no unit type", object.id))
        })?;
    let tile = f64::from(TILE_SIZE);
    Ok(Unit {
        kind: byte(&format!("unit type of object {}", object.id), kind)?,
        x: pixel_to_cell(object.id, object.x / tile)?,
        y: pixel_to_cell(object.id, ((object.y - OBJECT_Y_OFFSET) / tile).max(0.0))?,
        a: attribute('A')?,
        b: attribute('B')?,
        c: attribute('C')?,
        d: attribute('D')?,
        health: attribute('H')?,
    })
}

fn pixel_to_cell(id: u32, cell: f64) -> Result<u8, Error> {
    let cell = cell.floor();
    if (0.0..=255.0).contains(&cell) {
        Ok(cell as u8)
    } else {
        Err(Error::MalformedDocument(format!(
            "object {id} is outside the map"
        )))
    }
}

fn map_property<'a>(doc: &'a Document, name: &str) -> Result<&'a Property, Error> {
    doc.properties
        .iter()
        .find(|(candidate, _)| candidate == name)
        .map(|(_, value)| value)
        .ok_or_else(|| Error::MalformedDocument(format!("map property \"{name}\" is missing")))
}

fn integer(what: &str, value: &Property) -> Result<i64, Error> {
    value
        .as_integer()
        .ok_or_else(|| Error::MalformedDocument(format!("{what} is not a number: {value:?}")))
}

fn byte(what: &str, value: &Property) -> Result<u8, Error> {
    let value = integer(what, value)?;
    u8::try_from(value)
        .map_err(|_| Error::MalformedDocument(format!("{what} is {value}, which is not a byte")))
}

/// Formats bytes as a list, e.g. `[0, 93]`.
fn format_bytes(bytes: &[u8]) -> String {
    let items: Vec<String> = bytes.iter().map(u8::to_string).collect();
    format!("[{}]", items.join(", "))
}

fn parse_bytes(what: &str, value: &Property) -> Result<Vec<u8>, Error> {
    let Property::String(list) = value else {
        return Err(Error::MalformedDocument(format!("{what} is not a list")));
    };
    let inner = list
        .trim()
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| Error::MalformedDocument(format!("{what} is not a list: {list}")))?;
    inner
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| byte(what, &Property::from(item)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_lists() {
        assert_eq!(format_bytes(&[0, 93]), "[0, 93]");
        assert_eq!(format_bytes(&[]), "[]");
        let parsed = parse_bytes("test", &Property::from("[0, 93]")).expect("valid list");
        assert_eq!(parsed, [0, 93]);
        assert!(parse_bytes("test", &Property::from("[]")).expect("valid list").is_empty());
        assert!(parse_bytes("test", &Property::from("[256]")).is_err());
        assert!(parse_bytes("test", &Property::from("0, 93")).is_err());
    }

    #[test]
    fn objects_are_placed_one_tile_low() {
        let unit = Unit {
            kind: crate::KEY,
            x: 3,
            y: 0,
            a: 2,
            ..Unit::default()
        };
        let object = unit_object(48, unit);
        assert_eq!((object.x, object.y), (72.0, 24.0));
        assert_eq!(object.gid, 503);
        assert_eq!(object.name, "Key");
        assert_eq!(object_unit(&object).expect("valid object"), unit);
    }
}
