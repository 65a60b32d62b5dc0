//! Print a level file as a Tiled map.
//!
//! The TMX goes to stdout, so redirect it into a `.tmx` file next to the
//! `tiles/` directory holding the tileset images.

use anyhow::{Context, Result};
use clap::Parser;
use robots_level::{tiled, LevelImage};
use std::io::{self, Write};

#[derive(Parser, Debug)]
#[command(name = "level-to-tiled")]
#[command(about = "Print a PETSCII Robots level as a Tiled TMX map")]
struct Args {
    /// Level file to convert, e.g. level-a
    filename: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let level = LevelImage::load(&args.filename)
        .with_context(|| format!("Error loading binary map file '{}'", args.filename))?;
    let xml = tiled::to_document(&level, &args.filename)
        .to_xml()
        .context("Failed to write TMX")?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(xml.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
