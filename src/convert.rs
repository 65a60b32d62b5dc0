//! Conversion between level layouts.

use crate::{detect, Detection, Error, Format, LevelImage};
use std::fmt::{self, Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

/// Convert a raw level file into the layout of `target`.
///
/// The source layout is always detected, there is no way to force it.
/// Converting into the same layout still decodes and re-encodes.
///
/// # Errors
/// Errors if the source layout is unknown or the level can't be decoded.
pub fn convert(raw: &[u8], target: Format) -> Result<Vec<u8>, Error> {
    convert_detected(raw, target).map(|(_, converted)| converted)
}

/// Detect, decode and re-encode, returning what was detected along with the result.
fn convert_detected(raw: &[u8], target: Format) -> Result<(Detection, Vec<u8>), Error> {
    let detection = detect(raw).ok_or(Error::UnrecognizedFormat { size: raw.len() })?;
    tracing::info!(
        source = %detection.format,
        %target,
        fill_byte = ?detection.fill_byte,
        "converting level"
    );
    let image = LevelImage::decode(raw, Some(detection.format))?;
    Ok((detection, image.encode(target)))
}

/// Convert the level file at `path` and write it next to it as `<path>.<FORMAT>`.
///
/// # Errors
/// Errors if either file can't be accessed, or the conversion fails.
pub fn convert_file(path: impl AsRef<Path>, target: Format) -> Result<ConversionReport, Error> {
    let path = path.as_ref();
    let raw = fs::read(path)?;
    let (detection, converted) = convert_detected(&raw, target)?;

    let mut output = path.as_os_str().to_owned();
    output.push(".");
    output.push(target.name());
    let output = PathBuf::from(output);
    fs::write(&output, &converted)?;

    Ok(ConversionReport::new(
        detection.format,
        target,
        &converted,
        output,
    ))
}

/// What a conversion produced, for the user to check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionReport {
    /// The detected layout of the input.
    pub source: Format,
    /// The layout of the output.
    pub target: Format,
    /// Size of the output.
    pub size: usize,
    /// The first two bytes of the output.
    pub first_bytes: Vec<u8>,
    /// The fill byte of the output, if its layout has a fill region.
    pub fill_byte: Option<u8>,
    /// Where the output was written.
    pub output: PathBuf,
}

impl ConversionReport {
    /// Describe the converted data `converted`.
    #[must_use]
    pub fn new(source: Format, target: Format, converted: &[u8], output: PathBuf) -> Self {
        let variant = target.variant();
        let fill_byte = if variant.fill_region_size > 0 {
            converted.get(variant.units_end()).copied()
        } else {
            None
        };
        ConversionReport {
            source,
            target,
            size: converted.len(),
            first_bytes: converted.iter().take(2).copied().collect(),
            fill_byte,
            output,
        }
    }
}

impl Display for ConversionReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "Source: {}", self.source)?;
        writeln!(f, "Target: {}", self.target)?;
        f.write_str("First Bytes: ")?;
        for byte in &self.first_bytes {
            write!(f, "{byte:02X}")?;
        }
        writeln!(f)?;
        writeln!(f, "Size: {}", self.size)?;
        match self.fill_byte {
            Some(byte) => writeln!(f, "Fill Byte: {byte:02X}")?,
            None => writeln!(f, "Fill Byte: None")?,
        }
        write!(f, "{} written.", self.output.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_the_detected_source() {
        let mut raw = vec![0; 8960];
        raw[0] = 0x01;
        raw[0x200] = 0x42;
        let (detection, converted) = convert_detected(&raw, Format::X16).expect("an MSD level");
        assert_eq!(detection.format, Format::Msd);
        assert_eq!(detection.fill_byte, Some(0x42));
        assert_eq!(converted.len(), 8706);
        assert_eq!(convert(&raw, Format::X16).expect("an MSD level"), converted);
    }
}
