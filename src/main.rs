//! Talus CLI - inspect and decode DDS texture files.
//!
//! This is the main entry point for the Talus command-line application.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use talus_dds::{decode_file, parse_header, DecodedImage};

/// Talus - DDS texture inspection and decoding tool
#[derive(Parser)]
#[command(name = "talus")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show DDS header information
    Info {
        /// Path to the DDS file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Decode a DDS file to PNG
    Decode {
        /// Path to the DDS file
        #[arg(short, long)]
        input: PathBuf,

        /// Output PNG file
        #[arg(short, long)]
        output: PathBuf,

        /// Depth slice to export for volume textures
        #[arg(short, long, default_value_t = 0)]
        slice: u32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Info { input } => {
            cmd_info(&input)?;
        }
        Commands::Decode { input, output, slice } => {
            cmd_decode(&input, &output, slice)?;
        }
    }

    Ok(())
}

fn cmd_info(input: &PathBuf) -> Result<()> {
    let data = fs::read(input).context("Failed to read input file")?;
    let (header, dx10) = parse_header(&data).context("Failed to parse DDS header")?;

    // Copy fields out of the packed header before formatting
    let (width, height, depth) = (header.width, header.height, header.depth);
    let (flags, caps) = (header.flags, header.caps);
    let mipmap_count = header.mipmap_count;
    let pf = header.pixel_format;
    let rgb_bit_count = pf.rgb_bit_count;

    println!("{}", input.display());
    println!("  Dimensions: {}x{}x{}", width, height, depth.max(1));
    println!("  Mipmaps: {}", mipmap_count);
    println!("  Format: {}", pf.format());
    if rgb_bit_count != 0 {
        println!("  Bits per pixel: {}", rgb_bit_count);
    }
    println!("  Flags: {:#010x}  Caps: {:#010x}", flags, caps);

    if let Some(dx10) = dx10 {
        let dxgi_format = dx10.dxgi_format;
        let array_size = dx10.array_size;
        println!("  DXGI format: {}  Array size: {}", dxgi_format, array_size);
    }

    Ok(())
}

fn cmd_decode(input: &PathBuf, output: &PathBuf, slice: u32) -> Result<()> {
    println!("Decoding: {} -> {}", input.display(), output.display());

    let start = Instant::now();
    let image = decode_file(input).context("Failed to decode DDS file")?;

    println!(
        "Decoded {}x{}x{} {} in {:?}",
        image.width(),
        image.height(),
        image.depth(),
        image.format(),
        start.elapsed()
    );

    if slice >= image.depth() {
        anyhow::bail!("slice {} out of range (depth {})", slice, image.depth());
    }

    let png = slice_to_png(&image, slice)?;
    png.save(output).context("Failed to write PNG file")?;

    println!("Wrote {}", output.display());

    Ok(())
}

/// Extract one depth slice as a top-down RGBA image.
///
/// The decoder stores scanlines bottom-up, so rows are reversed here to
/// produce a correctly oriented PNG.
fn slice_to_png(image: &DecodedImage, slice: u32) -> Result<image::RgbaImage> {
    let width = image.width() as usize;
    let height = image.height() as usize;
    let row_len = width * 4;
    let slice_len = width * height * 4;
    let base = slice as usize * slice_len;

    let mut buf = Vec::with_capacity(slice_len);
    for y in (0..height).rev() {
        let row = &image.pixels()[base + y * row_len..base + (y + 1) * row_len];
        buf.extend_from_slice(row);
    }

    image::RgbaImage::from_raw(image.width(), image.height(), buf)
        .context("slice buffer does not match image dimensions")
}
