//! Rebuild a level file from a Tiled map made by `level-to-tiled`.
//!
//! The level is written as `<File Name>.lvl`, using the file name recorded
//! in the map properties.

use anyhow::{Context, Result};
use clap::Parser;
use robots_level::tiled::{self, Document, Property};
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tiled-to-level")]
#[command(about = "Rebuild a PETSCII Robots level from a Tiled TMX map")]
struct Args {
    /// TMX file to convert, e.g. level-a.tmx
    filename: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let text = fs::read_to_string(&args.filename)
        .with_context(|| format!("Error loading TMX file '{}'", args.filename.display()))?;
    let document = Document::from_xml(&text)
        .with_context(|| format!("Error reading TMX file '{}'", args.filename.display()))?;
    let raw = tiled::to_level_bytes(&document)
        .with_context(|| format!("Error converting '{}'", args.filename.display()))?;

    let name = document
        .properties
        .iter()
        .find_map(|(name, value)| match value {
            Property::String(file_name) if name == "File Name" => Some(file_name.clone()),
            _ => None,
        })
        .context("The map has no \"File Name\" property")?;
    let output = PathBuf::from(format!("{name}.lvl"));
    fs::write(&output, &raw)
        .with_context(|| format!("Error writing binary map file '{}'", output.display()))?;
    println!("File size: {}", raw.len());
    println!("{} saved.", output.display());
    Ok(())
}
