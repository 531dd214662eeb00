//! PNG export for viewing results in ordinary image tools.
//!
//! Converts the canonical BGR bottom-left buffer into the top-down RGB
//! layout the `image` crate expects, then encodes with its PNG encoder.

use crate::pixels::{BYTES_PER_PIXEL, Channel, PixelBuffer};
use image::{ImageFormat, RgbImage};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("Cannot export an empty image")]
    Empty,
}

/// Reorder into a top-down RGB image.
pub fn to_rgb_image(buffer: &PixelBuffer) -> Result<RgbImage, ExportError> {
    if buffer.dimensions().is_empty() {
        return Err(ExportError::Empty);
    }

    let mut rgb = Vec::with_capacity(buffer.samples().len());
    for row in buffer.rows().rev() {
        for pixel in row.chunks_exact(BYTES_PER_PIXEL) {
            rgb.extend_from_slice(&[
                pixel[Channel::Red.index()],
                pixel[Channel::Green.index()],
                pixel[Channel::Blue.index()],
            ]);
        }
    }
    RgbImage::from_raw(u32::from(buffer.width()), u32::from(buffer.height()), rgb)
        .ok_or(ExportError::Empty)
}

/// Write `buffer` to `path` as PNG, whatever the path's extension.
pub fn export_png(buffer: &PixelBuffer, path: &Path) -> Result<(), ExportError> {
    let image = to_rgb_image(buffer)?;
    image.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}
