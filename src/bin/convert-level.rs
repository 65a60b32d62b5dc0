//! Convert a level file to the layout of another platform.
//!
//! Writes the result next to the input, as `<filename>.<FORMAT>`.

use anyhow::{Context, Result};
use clap::Parser;
use robots_level::{convert_file, Format};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "convert-level")]
#[command(about = "Convert a PETSCII Robots level between PET, MSD and X16 layouts")]
struct Args {
    /// Level file to convert, e.g. level-a
    filename: PathBuf,

    /// Layout to convert to: PET (PET/C64/C128), MSD (MS-DOS/Amiga) or X16
    format: Format,
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
    let report = convert_file(&args.filename, args.format)
        .with_context(|| format!("Failed to convert {}", args.filename.display()))?;
    println!("{report}");
    Ok(())
}
