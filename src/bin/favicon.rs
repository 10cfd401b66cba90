//! Offline icon generator: draws the car glyph and writes a multi-size ICO.
//!
//! Usage:
//!   cargo run --bin favicon -- --out public/favicon.ico

use anyhow::{Context, Result};
use clap::Parser;
use image::codecs::ico::{IcoEncoder, IcoFrame};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ExtendedColorType, GrayImage, Luma, RgbImage};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

const SIZES: [u32; 4] = [32, 48, 64, 128];
/// Draw at this multiple of the target size before reducing.
const HIGH_RES: u32 = 32;
/// Glyph height as a fraction of the icon, leaving a margin.
const GLYPH_SCALE: f32 = 0.75;
const THRESHOLD: u8 = 128;
const SUPERSAMPLE: u32 = 4;

/// The car glyph as filled rectangles in a unit em box: (x0, y0, x1, y1).
const CAR_STROKES: [(f32, f32, f32, f32); 8] = [
    (0.10, 0.08, 0.90, 0.15),
    (0.18, 0.26, 0.82, 0.32),
    (0.18, 0.42, 0.82, 0.48),
    (0.18, 0.58, 0.82, 0.64),
    (0.18, 0.26, 0.25, 0.64),
    (0.75, 0.26, 0.82, 0.64),
    (0.04, 0.75, 0.96, 0.82),
    (0.465, 0.00, 0.535, 1.00),
];

#[derive(Parser, Debug)]
#[command(name = "favicon")]
#[command(about = "Render the car glyph into a pixel-crisp multi-resolution .ico")]
struct Args {
    /// Output path
    #[arg(long, default_value = "favicon.ico")]
    out: PathBuf,
}

fn ink_at(u: f32, v: f32) -> bool {
    CAR_STROKES
        .iter()
        .any(|&(x0, y0, x1, y1)| u >= x0 && u < x1 && v >= y0 && v < y1)
}

/// Anti-aliased grayscale render, black glyph on white, centered.
fn rasterize(side: u32) -> GrayImage {
    let margin = (1.0 - GLYPH_SCALE) / 2.0;
    let samples = (SUPERSAMPLE * SUPERSAMPLE) as f32;
    GrayImage::from_fn(side, side, |x, y| {
        let mut hits = 0u32;
        for sy in 0..SUPERSAMPLE {
            for sx in 0..SUPERSAMPLE {
                let fx = (x as f32 + (sx as f32 + 0.5) / SUPERSAMPLE as f32) / side as f32;
                let fy = (y as f32 + (sy as f32 + 0.5) / SUPERSAMPLE as f32) / side as f32;
                let u = (fx - margin) / GLYPH_SCALE;
                let v = (fy - margin) / GLYPH_SCALE;
                if ink_at(u, v) {
                    hits += 1;
                }
            }
        }
        let coverage = hits as f32 / samples;
        Luma([(255.0 * (1.0 - coverage)).round() as u8])
    })
}

/// Force every pixel to pure black or white.
fn threshold(img: &mut GrayImage) {
    for p in img.pixels_mut() {
        p.0[0] = if p.0[0] < THRESHOLD { 0 } else { 255 };
    }
}

fn render_icon(size: u32) -> RgbImage {
    let mut hi = rasterize(size * HIGH_RES);
    threshold(&mut hi);
    // nearest keeps the reduction free of gray fringes
    let small = imageops::resize(&hi, size, size, FilterType::Nearest);
    DynamicImage::ImageLuma8(small).to_rgb8()
}

fn write_ico<W: Write>(out: W, icons: &[RgbImage]) -> Result<()> {
    let frames = icons
        .iter()
        .map(|img| IcoFrame::as_png(img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgb8))
        .collect::<Result<Vec<_>, _>>()
        .context("could not encode icon frame")?;
    IcoEncoder::new(out)
        .encode_images(&frames)
        .context("could not write ico")?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let icons: Vec<RgbImage> = SIZES.iter().map(|&s| render_icon(s)).collect();

    let file = File::create(&args.out)
        .with_context(|| format!("could not create {}", args.out.display()))?;
    write_ico(BufWriter::new(file), &icons)?;

    println!("Favicon created: {}", args.out.display());
    Ok(())
}
