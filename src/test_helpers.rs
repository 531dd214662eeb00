//! Shared test utilities for the tgablend test suite.
//!
//! Provides synthetic images, hand-built TGA byte streams (including the
//! top-left origin variant the encoder never produces), and a fixture
//! directory holding the inputs the stock batch config expects.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_stock_inputs();
//! let report = batch::run(&BatchConfig::default(), tmp.path(), false, None).unwrap();
//! ```

use crate::pixels::PixelBuffer;
use crate::tga::{self, FileHeader, Origin};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// =========================================================================
// Synthetic images
// =========================================================================

/// A buffer whose every sample depends on its position, so reordering bugs
/// show up as mismatches.
pub fn gradient(width: u16, height: u16) -> PixelBuffer {
    PixelBuffer::from_fn(width, height, |x, y| {
        [
            (x as u32 * 37 % 256) as u8,
            (y as u32 * 53 % 256) as u8,
            ((x as u32 + y as u32) * 11 % 256) as u8,
        ]
    })
}

/// Serialize `buffer` as a TGA byte stream with the requested origin and
/// image ID.
///
/// For a top-left origin the scanlines are written top row first, so the
/// stream describes the same picture as the bottom-left variant.
pub fn tga_bytes(buffer: &PixelBuffer, origin: Origin, image_id: &[u8]) -> Vec<u8> {
    let mut header = FileHeader::for_dimensions(buffer.dimensions()).with_origin(origin);
    header.id_length = u8::try_from(image_id.len()).expect("image id fits in a byte");

    let mut bytes = header.to_bytes().to_vec();
    bytes.extend_from_slice(image_id);
    match origin {
        Origin::BottomLeft => bytes.extend_from_slice(buffer.samples()),
        Origin::TopLeft => {
            for row in buffer.rows().rev() {
                bytes.extend_from_slice(row);
            }
        }
    }
    bytes
}

/// Encode `buffer` as `dir/name` and return the path.
pub fn write_tga(dir: &Path, name: &str, buffer: &PixelBuffer) -> PathBuf {
    let path = dir.join(name);
    tga::encode(buffer, &path).unwrap();
    path
}

// =========================================================================
// Fixture setup
// =========================================================================

/// Size of every stock input image.
pub const STOCK_WIDTH: u16 = 8;
pub const STOCK_HEIGHT: u16 = 6;

/// Write every input the stock batch config reads into `<tmp>/input`.
///
/// Each file gets its own deterministic pattern so tasks produce distinct
/// results. Tests get an isolated copy they can mutate freely.
pub fn setup_stock_inputs() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("input");
    std::fs::create_dir_all(&input).unwrap();

    let names = [
        "car", "circles", "layer1", "layer2", "layer_blue", "layer_green", "layer_red",
        "pattern1", "pattern2", "text", "text2",
    ];
    for (seed, name) in names.iter().enumerate() {
        let seed = seed as u32 + 1;
        let image = PixelBuffer::from_fn(STOCK_WIDTH, STOCK_HEIGHT, |x, y| {
            let (x, y) = (x as u32, y as u32);
            [
                ((x * 29 + y * 7 + seed * 13) % 256) as u8,
                ((x * 5 + y * 31 + seed * 41) % 256) as u8,
                ((x * y + seed * 67) % 256) as u8,
            ]
        });
        write_tga(&input, &format!("{name}.tga"), &image);
    }
    tmp
}
