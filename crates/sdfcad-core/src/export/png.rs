//! Grayscale PNG output

use super::write_atomic;
use crate::error::{Error, Result};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use std::io::Write;
use std::path::Path;

/// 8-bit grayscale image, rows top to bottom
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Raster {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, value: u8) {
        self.pixels[y as usize * self.width as usize + x as usize] = value;
    }
}

/// Write `raster` to `path` atomically
pub fn write_png(raster: &Raster, path: &Path) -> Result<()> {
    write_atomic(path, |w| write_png_to(raster, w))
}

/// Encode `raster` as PNG into any writer
pub fn write_png_to(raster: &Raster, w: &mut dyn Write) -> Result<()> {
    if raster.pixels.len() != raster.width as usize * raster.height as usize {
        return Err(Error::Format(format!(
            "raster of {}x{} has {} pixels",
            raster.width,
            raster.height,
            raster.pixels.len()
        )));
    }
    PngEncoder::new(w).write_image(
        &raster.pixels,
        raster.width,
        raster.height,
        ExtendedColorType::L8,
    )?;
    Ok(())
}
