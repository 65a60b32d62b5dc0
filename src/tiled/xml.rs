//! Reading and writing Tiled maps as TMX.

use super::{
    Animation, Document, Frame, Image, Layer, Object, ObjectGroup, Property, Tileset, TILE_SIZE,
};
use crate::{Error, MAP_HEIGHT, MAP_WIDTH};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use byteorder::{ByteOrder, LittleEndian};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::{self, Read, Write};
use std::str::FromStr;

/// The upper four bits of a gid flip and rotate the tile.
const GID_MASK: u32 = 0x0FFF_FFFF;

const MAP_VERSION: &str = "1.10";
const TILED_VERSION: &str = "1.11.2";

/// How the tile layer of a map is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataEncoding {
    /// Comma separated gids, one map row per line.
    #[default]
    Csv,
    /// Base64 of little-endian gids.
    Base64,
    /// Base64 of zlib compressed little-endian gids.
    Base64Zlib,
    /// Base64 of gzip compressed little-endian gids.
    Base64Gzip,
}

/// A bare XML element.
#[derive(Debug, Clone, Default)]
struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    fn new(name: &str) -> Self {
        Element {
            name: name.to_owned(),
            ..Element::default()
        }
    }

    fn attr(mut self, key: &str, value: impl ToString) -> Self {
        self.attrs.push((key.to_owned(), value.to_string()));
        self
    }

    fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, value)| value.as_str())
    }

    /// Parses an attribute, or returns `default` if it is missing.
    fn parse_or<T: FromStr>(&self, key: &str, default: T) -> Result<T, Error> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => value.trim().parse().map_err(|_| {
                Error::MalformedDocument(format!(
                    "attribute {key}=\"{value}\" of <{}> is invalid",
                    self.name
                ))
            }),
        }
    }

    fn first(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    fn all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }
}

fn xml_error(err: impl std::fmt::Display) -> Error {
    Error::MalformedDocument(err.to_string())
}

fn write_error(err: impl std::fmt::Display) -> Error {
    Error::Io(io::Error::new(io::ErrorKind::Other, err.to_string()))
}

fn parse_element(start: &BytesStart<'_>) -> Result<Element, Error> {
    let qname = start.name();
    let name = std::str::from_utf8(qname.as_ref()).map_err(xml_error)?;
    let mut element = Element::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(xml_error)?;
        let key = std::str::from_utf8(attr.key.as_ref()).map_err(xml_error)?;
        let value = attr.unescape_value().map_err(xml_error)?;
        element.attrs.push((key.to_owned(), value.into_owned()));
    }
    Ok(element)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

fn parse_tree(text: &str) -> Result<Element, Error> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;
    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(start) => stack.push(parse_element(&start)?),
            Event::Empty(start) => {
                let element = parse_element(&start)?;
                attach(&mut stack, &mut root, element);
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| Error::MalformedDocument("unbalanced closing tag".into()))?;
                attach(&mut stack, &mut root, element);
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text.unescape().map_err(xml_error)?);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(std::str::from_utf8(&data).map_err(xml_error)?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    if let Some(open) = stack.last() {
        return Err(Error::MalformedDocument(format!(
            "<{}> is never closed",
            open.name
        )));
    }
    root.ok_or_else(|| Error::MalformedDocument("no root element".into()))
}

fn write_tree<W: Write>(writer: &mut Writer<W>, element: &Element) -> Result<(), Error> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attrs {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    if element.children.is_empty() && element.text.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(write_error);
    }
    writer.write_event(Event::Start(start)).map_err(write_error)?;
    if !element.text.is_empty() {
        writer
            .write_event(Event::Text(BytesText::new(&element.text)))
            .map_err(write_error)?;
    }
    for child in &element.children {
        write_tree(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(write_error)
}

impl Document {
    /// Parse a map from TMX text.
    ///
    /// # Errors
    /// Errors if the text isn't XML, or isn't a Tiled map.
    pub fn from_xml(text: &str) -> Result<Self, Error> {
        let root = parse_tree(text)?;
        if root.name != "map" {
            return Err(Error::MalformedDocument(format!(
                "root element is <{}>, not <map>",
                root.name
            )));
        }
        let layer = root
            .first("layer")
            .ok_or_else(|| Error::MalformedDocument("the map has no tile layer".into()))?;
        Ok(Document {
            properties: read_properties(&root)?,
            tilesets: root.all("tileset").map(read_tileset).collect::<Result<_, _>>()?,
            layer: read_layer(layer)?,
            object_groups: root
                .all("objectgroup")
                .map(read_object_group)
                .collect::<Result<_, _>>()?,
        })
    }

    /// Read and parse a map from a TMX file.
    ///
    /// # Errors
    /// Errors if reading fails, or the data isn't a Tiled map.
    pub fn read(mut reader: impl Read) -> Result<Self, Error> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Self::from_xml(&text)
    }

    /// Write the map as TMX text, with a CSV tile layer.
    ///
    /// # Errors
    /// Errors if the XML can't be written.
    pub fn to_xml(&self) -> Result<String, Error> {
        self.to_xml_with(DataEncoding::Csv)
    }

    /// Write the map as TMX text, with the tile layer in the given encoding.
    ///
    /// # Errors
    /// Errors if the XML can't be written or compressed.
    pub fn to_xml_with(&self, encoding: DataEncoding) -> Result<String, Error> {
        let root = self.to_element(encoding)?;
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 1);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(write_error)?;
        write_tree(&mut writer, &root)?;
        let mut buf = writer.into_inner();
        buf.push(b'\n');
        String::from_utf8(buf).map_err(write_error)
    }

    /// Write the map as TMX to a writable.
    ///
    /// # Errors
    /// The data failed to be written.
    pub fn write(&self, mut writer: impl Write) -> Result<(), Error> {
        writer.write_all(self.to_xml()?.as_bytes())?;
        Ok(())
    }

    fn to_element(&self, encoding: DataEncoding) -> Result<Element, Error> {
        let next_layer_id = self
            .object_groups
            .iter()
            .map(|group| group.id)
            .chain([self.layer.id])
            .max()
            .unwrap_or(0)
            + 1;
        let next_object_id = self
            .object_groups
            .iter()
            .flat_map(|group| &group.objects)
            .map(|object| object.id)
            .max()
            .unwrap_or(0)
            + 1;
        let mut root = Element::new("map")
            .attr("version", MAP_VERSION)
            .attr("tiledversion", TILED_VERSION)
            .attr("orientation", "orthogonal")
            .attr("renderorder", "right-down")
            .attr("width", MAP_WIDTH)
            .attr("height", MAP_HEIGHT)
            .attr("tilewidth", TILE_SIZE)
            .attr("tileheight", TILE_SIZE)
            .attr("infinite", 0)
            .attr("nextlayerid", next_layer_id)
            .attr("nextobjectid", next_object_id);
        if !self.properties.is_empty() {
            root = root.child(properties_element(&self.properties));
        }
        for tileset in &self.tilesets {
            root = root.child(tileset_element(tileset));
        }
        root = root.child(layer_element(&self.layer, encoding)?);
        for group in &self.object_groups {
            root = root.child(object_group_element(group));
        }
        Ok(root)
    }
}

fn properties_element(properties: &[(String, Property)]) -> Element {
    properties
        .iter()
        .fold(Element::new("properties"), |parent, (name, value)| {
            let property = Element::new("property").attr("name", name);
            let property = match value {
                Property::Integer(i) => property.attr("type", "int").attr("value", i),
                Property::String(s) => property.attr("value", s),
            };
            parent.child(property)
        })
}

fn read_properties(element: &Element) -> Result<Vec<(String, Property)>, Error> {
    let Some(properties) = element.first("properties") else {
        return Ok(Vec::new());
    };
    properties
        .all("property")
        .map(|property| {
            let name = property.get("name").unwrap_or_default().to_owned();
            // Multi-line string values are stored as text.
            let value = property.get("value").unwrap_or(&property.text);
            let value = match property.get("type") {
                Some("int") => Property::Integer(value.trim().parse().map_err(|_| {
                    Error::MalformedDocument(format!(
                        "property \"{name}\" is not an integer: {value}"
                    ))
                })?),
                _ => Property::from(value),
            };
            Ok::<_, Error>((name, value))
        })
        .collect()
}

fn tileset_element(tileset: &Tileset) -> Element {
    let mut element = Element::new("tileset")
        .attr("firstgid", tileset.first_gid)
        .attr("name", &tileset.name)
        .attr("tilewidth", tileset.tile_width)
        .attr("tileheight", tileset.tile_height)
        .attr("tilecount", tileset.tile_count)
        .attr("columns", tileset.columns);
    if let Some(fill_mode) = &tileset.fill_mode {
        element = element.attr("fillmode", fill_mode);
    }
    let mut image = Element::new("image").attr("source", &tileset.image.source);
    if let Some(trans) = &tileset.image.trans {
        image = image.attr("trans", trans);
    }
    element = element.child(
        image
            .attr("width", tileset.image.width)
            .attr("height", tileset.image.height),
    );
    for animation in &tileset.animations {
        let frames = animation
            .frames
            .iter()
            .fold(Element::new("animation"), |parent, frame| {
                parent.child(
                    Element::new("frame")
                        .attr("tileid", frame.tile_id)
                        .attr("duration", frame.duration),
                )
            });
        element = element.child(Element::new("tile").attr("id", animation.tile_id).child(frames));
    }
    element
}

fn read_tileset(element: &Element) -> Result<Tileset, Error> {
    let image = match element.first("image") {
        Some(image) => Image {
            source: image.get("source").unwrap_or_default().to_owned(),
            width: image.parse_or("width", 0)?,
            height: image.parse_or("height", 0)?,
            trans: image.get("trans").map(str::to_owned),
        },
        // External tilesets only name their file.
        None => Image {
            source: element.get("source").unwrap_or_default().to_owned(),
            width: 0,
            height: 0,
            trans: None,
        },
    };
    let mut animations = Vec::new();
    for tile in element.all("tile") {
        let Some(animation) = tile.first("animation") else {
            continue;
        };
        animations.push(Animation {
            tile_id: tile.parse_or("id", 0)?,
            frames: animation
                .all("frame")
                .map(|frame| {
                    Ok::<_, Error>(Frame {
                        tile_id: frame.parse_or("tileid", 0)?,
                        duration: frame.parse_or("duration", 0)?,
                    })
                })
                .collect::<Result<_, Error>>()?,
        });
    }
    Ok(Tileset {
        first_gid: element.parse_or("firstgid", 1)?,
        name: element.get("name").unwrap_or_default().to_owned(),
        tile_width: element.parse_or("tilewidth", 0)?,
        tile_height: element.parse_or("tileheight", 0)?,
        tile_count: element.parse_or("tilecount", 0)?,
        columns: element.parse_or("columns", 0)?,
        fill_mode: element.get("fillmode").map(str::to_owned),
        image,
        animations,
    })
}

fn layer_element(layer: &Layer, encoding: DataEncoding) -> Result<Element, Error> {
    let mut data = Element::new("data");
    data.text = match encoding {
        DataEncoding::Csv => {
            let width = (layer.width as usize).max(1);
            let rows: Vec<String> = layer
                .data
                .chunks(width)
                .map(|row| {
                    row.iter()
                        .map(u32::to_string)
                        .collect::<Vec<_>>()
                        .join(",")
                })
                .collect();
            format!("\n{}\n", rows.join(",\n"))
        }
        DataEncoding::Base64 | DataEncoding::Base64Zlib | DataEncoding::Base64Gzip => {
            let mut bytes = vec![0; layer.data.len() * 4];
            LittleEndian::write_u32_into(&layer.data, &mut bytes);
            let bytes = match encoding {
                DataEncoding::Base64Zlib => {
                    let mut encoder = libflate::zlib::Encoder::new(Vec::new())?;
                    encoder.write_all(&bytes)?;
                    encoder.finish().into_result()?
                }
                DataEncoding::Base64Gzip => {
                    let mut encoder = libflate::gzip::Encoder::new(Vec::new())?;
                    encoder.write_all(&bytes)?;
                    encoder.finish().into_result()?
                }
                _ => bytes,
            };
            STANDARD.encode(bytes)
        }
    };
    data = match encoding {
        DataEncoding::Csv => data.attr("encoding", "csv"),
        DataEncoding::Base64 => data.attr("encoding", "base64"),
        DataEncoding::Base64Zlib => data.attr("encoding", "base64").attr("compression", "zlib"),
        DataEncoding::Base64Gzip => data.attr("encoding", "base64").attr("compression", "gzip"),
    };
    Ok(Element::new("layer")
        .attr("id", layer.id)
        .attr("name", &layer.name)
        .attr("width", layer.width)
        .attr("height", layer.height)
        .child(data))
}

fn read_layer(element: &Element) -> Result<Layer, Error> {
    let data = match element.first("data") {
        Some(data) => read_layer_data(data)?,
        None => Vec::new(),
    };
    Ok(Layer {
        id: element.parse_or("id", 1)?,
        name: element.get("name").unwrap_or_default().to_owned(),
        width: element.parse_or("width", MAP_WIDTH as u32)?,
        height: element.parse_or("height", MAP_HEIGHT as u32)?,
        data,
    })
}

fn read_layer_data(data: &Element) -> Result<Vec<u32>, Error> {
    if data.first("chunk").is_some() {
        return Err(Error::MalformedDocument(
            "infinite maps are not supported".into(),
        ));
    }
    let gids = match data.get("encoding") {
        None => data
            .all("tile")
            .map(|tile| tile.parse_or("gid", 0))
            .collect::<Result<Vec<u32>, _>>()?,
        Some("csv") => data
            .text
            .split(',')
            .map(str::trim)
            .filter(|gid| !gid.is_empty())
            .map(|gid| {
                gid.parse::<u32>()
                    .map_err(|_| Error::MalformedDocument(format!("tile gid \"{gid}\" is invalid")))
            })
            .collect::<Result<_, _>>()?,
        Some("base64") => {
            let text: String = data.text.split_whitespace().collect();
            let bytes = STANDARD.decode(text).map_err(xml_error)?;
            let bytes = match data.get("compression") {
                None | Some("") => bytes,
                Some("zlib") => {
                    let mut decoded = Vec::new();
                    libflate::zlib::Decoder::new(bytes.as_slice())?.read_to_end(&mut decoded)?;
                    decoded
                }
                Some("gzip") => {
                    let mut decoded = Vec::new();
                    libflate::gzip::Decoder::new(bytes.as_slice())?.read_to_end(&mut decoded)?;
                    decoded
                }
                Some(other) => {
                    return Err(Error::MalformedDocument(format!(
                        "layer compression \"{other}\" is not supported"
                    )))
                }
            };
            if bytes.len() % 4 != 0 {
                return Err(Error::MalformedDocument(format!(
                    "layer data of {} bytes is not a list of gids",
                    bytes.len()
                )));
            }
            let mut gids = vec![0; bytes.len() / 4];
            LittleEndian::read_u32_into(&bytes, &mut gids);
            gids
        }
        Some(other) => {
            return Err(Error::MalformedDocument(format!(
                "layer encoding \"{other}\" is not supported"
            )))
        }
    };
    Ok(gids.into_iter().map(|gid| gid & GID_MASK).collect())
}

fn object_group_element(group: &ObjectGroup) -> Element {
    let mut element = Element::new("objectgroup")
        .attr("id", group.id)
        .attr("name", &group.name);
    if !group.visible {
        element = element.attr("visible", 0);
    }
    for object in &group.objects {
        let mut child = Element::new("object")
            .attr("id", object.id)
            .attr("name", &object.name)
            .attr("gid", object.gid)
            .attr("x", object.x)
            .attr("y", object.y)
            .attr("width", object.width)
            .attr("height", object.height);
        if !object.properties.is_empty() {
            child = child.child(properties_element(&object.properties));
        }
        element = element.child(child);
    }
    element
}

fn read_object_group(element: &Element) -> Result<ObjectGroup, Error> {
    Ok(ObjectGroup {
        id: element.parse_or("id", 0)?,
        name: element.get("name").unwrap_or_default().to_owned(),
        visible: element.get("visible") != Some("0"),
        objects: element
            .all("object")
            .map(|object| {
                Ok::<_, Error>(Object {
                    id: object.parse_or("id", 0)?,
                    name: object.get("name").unwrap_or_default().to_owned(),
                    gid: object.parse_or::<u32>("gid", 0)? & GID_MASK,
                    x: object.parse_or("x", 0.0)?,
                    y: object.parse_or("y", 0.0)?,
                    width: object.parse_or("width", TILE_SIZE)?,
                    height: object.parse_or("height", TILE_SIZE)?,
                    properties: read_properties(object)?,
                })
            })
            .collect::<Result<_, Error>>()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_elements() {
        let root = parse_tree(
            r#"<?xml version="1.0"?>
<map a="1"><!-- note --><b x="&lt;2&gt;"/><c>one &amp; two</c></map>"#,
        )
        .expect("valid xml");
        assert_eq!(root.name, "map");
        assert_eq!(root.get("a"), Some("1"));
        assert_eq!(root.first("b").and_then(|b| b.get("x")), Some("<2>"));
        assert_eq!(root.first("c").map(|c| c.text.as_str()), Some("one & two"));
    }

    #[test]
    fn element_names_are_kept() {
        let root = parse_tree("<map><objectgroup/><layer></layer></map>").expect("valid xml");
        let names: Vec<&str> = root.children.iter().map(|child| child.name.as_str()).collect();
        assert_eq!(names, ["objectgroup", "layer"]);
    }

    #[test]
    fn rejects_broken_xml() {
        assert!(matches!(
            parse_tree("<map><layer></map>"),
            Err(Error::MalformedDocument(_))
        ));
        assert!(matches!(parse_tree("<map>"), Err(Error::MalformedDocument(_))));
        assert!(matches!(parse_tree(""), Err(Error::MalformedDocument(_))));
    }

    #[test]
    fn layer_data_encodings() {
        let mut data = Element::new("data").attr("encoding", "csv");
        data.text = "\n1,2,\n3,2147483652\n".into();
        assert_eq!(read_layer_data(&data).expect("valid csv"), [1, 2, 3, 4]);

        let mut data = Element::new("data").attr("encoding", "base64");
        // 1, 2 as little-endian u32s
        data.text = "\n   AQAAAAIAAAA=\n".into();
        assert_eq!(read_layer_data(&data).expect("valid base64"), [1, 2]);

        let data = Element::new("data")
            .child(Element::new("tile").attr("gid", 7))
            .child(Element::new("tile"));
        assert_eq!(read_layer_data(&data).expect("valid tiles"), [7, 0]);

        let data = Element::new("data")
            .attr("encoding", "base64")
            .attr("compression", "zstd");
        assert!(read_layer_data(&data).is_err());
    }

    #[test]
    fn compressed_layers_read_back() {
        let layer = Layer {
            id: 1,
            name: "test".into(),
            width: 2,
            height: 2,
            data: vec![1, 0, 300, 5],
        };
        for encoding in [
            DataEncoding::Csv,
            DataEncoding::Base64,
            DataEncoding::Base64Zlib,
            DataEncoding::Base64Gzip,
        ] {
            let element = layer_element(&layer, encoding).expect("encodable");
            let read = read_layer(&element).expect("decodable");
            assert_eq!(read, layer, "{encoding:?}");
        }
    }
}
