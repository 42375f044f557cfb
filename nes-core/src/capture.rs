//! Headless capture of the video output.
//!
//! The PPU hands out ARGB words; PNG wants byte-planar RGBA. The encoder
//! here is shared by single screenshots and frame-sequence dumps so both
//! agree on the pixel format.

use std::error::Error;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::ppu::{FB_HEIGHT, FB_WIDTH};
use crate::Nes;

/// Encode one ARGB framebuffer as a PNG into `sink`.
fn encode_png<W: Write>(sink: W, argb: &[u32]) -> Result<(), Box<dyn Error>> {
    let mut encoder = png::Encoder::new(sink, FB_WIDTH as u32, FB_HEIGHT as u32);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);

    let pixels: Vec<u8> = argb
        .iter()
        .flat_map(|&p| [(p >> 16) as u8, (p >> 8) as u8, p as u8, 0xFF])
        .collect();

    encoder.write_header()?.write_image_data(&pixels)?;
    Ok(())
}

/// Save the console's current frame as a PNG.
///
/// # Errors
///
/// Returns an error when the file cannot be created or encoded.
pub fn save_screenshot(nes: &Nes, path: &Path) -> Result<(), Box<dyn Error>> {
    let file = File::create(path)?;
    encode_png(BufWriter::new(file), nes.framebuffer())
}

/// Emulate `count` frames, writing each as `frame-NNNNN.png` under `dir`.
/// Returns the paths written.
///
/// # Errors
///
/// Returns an error when a frame file cannot be written.
pub fn record(nes: &mut Nes, dir: &Path, count: u32) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(count as usize);
    for n in 0..count {
        nes.run_frame();
        let path = dir.join(format!("frame-{n:05}.png"));
        save_screenshot(nes, &path)?;
        written.push(path);
    }
    Ok(written)
}
