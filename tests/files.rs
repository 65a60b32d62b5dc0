mod common;

use robots_level::{convert_file, Format, LevelImage, MapModel, Unit};
use std::fs;

#[test]
fn convert_writes_next_to_the_source() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("level-a");
    fs::write(&path, common::level(Format::Msd))?;

    let report = convert_file(&path, Format::Pet)?;
    assert_eq!(report.source, Format::Msd);
    assert_eq!(report.output, dir.path().join("level-a.PET"));
    assert_eq!(report.first_bytes, [0x00, 0x5D]);
    assert_eq!(report.size, 8962);
    assert_eq!(report.fill_byte, Some(common::FILL));
    assert_eq!(fs::read(&report.output)?, common::level(Format::Pet));

    let text = report.to_string();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines[..5],
        [
            "Source: MSD",
            "Target: PET",
            "First Bytes: 005D",
            "Size: 8962",
            "Fill Byte: AA"
        ]
    );
    assert!(lines[5].ends_with("level-a.PET written."));

    let report = convert_file(&path, Format::X16)?;
    assert_eq!(report.fill_byte, None);
    assert!(report.to_string().contains("Fill Byte: None"));
    Ok(())
}

#[test]
fn save_and_load() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("level-b");
    let raw = common::level(Format::X16);
    fs::write(&path, &raw)?;

    let level = LevelImage::load(&path)?;
    assert_eq!(level.format(), Format::X16);
    level.save(&path, Format::X16)?;
    assert_eq!(fs::read(&path)?, raw);

    level.save(&path, Format::Msd)?;
    let msd = LevelImage::load(&path)?;
    assert_eq!(msd.format(), Format::Msd);
    assert_eq!(msd.tiles, level.tiles);
    Ok(())
}

#[test]
fn edit_a_level_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("level-c");
    fs::write(&path, common::level(Format::Pet))?;

    let mut model = MapModel::load(&path)?;
    assert_eq!(model.get_tile(1, 0), Some(1));
    assert!(model.set_tile(1, 0, Some(200)));
    let hover_bot = Unit {
        kind: 2,
        x: 11,
        y: 12,
        health: 10,
        ..Unit::new()
    };
    model.set_unit(25, hover_bot)?;
    model.delete_unit(3)?;
    assert!(model.undo());
    assert_eq!(model.get_unit(3).map(|unit| unit.kind), Some(9));
    model.save(&path, Format::Pet)?;

    let saved = LevelImage::load(&path)?;
    assert_eq!(saved.tiles[(1, 0)], Some(200));
    assert_eq!(saved.units()[25], hover_bot);
    assert_eq!(saved.units()[3].kind, 9);
    Ok(())
}
