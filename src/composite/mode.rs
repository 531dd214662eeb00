//! Blend modes and the whole-image blend.

use super::math;
use super::{CompositeError, ensure_same_size};
use crate::pixels::{BYTES_PER_PIXEL, PixelBuffer};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-channel rule combining a base (bottom) and an overlay (top) sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    /// `base + over`, saturating at 255.
    Add,
    /// `base - over`, floored at 0.
    Subtract,
    /// `base * over / 255`.
    Multiply,
    /// Inverse multiply: `255 - (255-base)(255-over)/255`.
    Screen,
    /// Multiply below a base of 128, screen from 128 up.
    Overlay,
}

impl BlendMode {
    pub const ALL: [BlendMode; 5] = [
        BlendMode::Add,
        BlendMode::Subtract,
        BlendMode::Multiply,
        BlendMode::Screen,
        BlendMode::Overlay,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BlendMode::Add => "add",
            BlendMode::Subtract => "subtract",
            BlendMode::Multiply => "multiply",
            BlendMode::Screen => "screen",
            BlendMode::Overlay => "overlay",
        }
    }

    #[inline]
    pub fn blend_channel(self, base: u8, over: u8) -> u8 {
        match self {
            BlendMode::Add => math::add(base, over),
            BlendMode::Subtract => math::subtract(base, over),
            BlendMode::Multiply => math::multiply(base, over),
            BlendMode::Screen => math::screen(base, over),
            BlendMode::Overlay => math::overlay(base, over),
        }
    }

    pub fn blend_pixel(self, base: [u8; 3], over: [u8; 3]) -> [u8; 3] {
        [
            self.blend_channel(base[0], over[0]),
            self.blend_channel(base[1], over[1]),
            self.blend_channel(base[2], over[2]),
        ]
    }
}

impl fmt::Display for BlendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Blend `top` over `bottom` into a new buffer.
///
/// Both inputs must have the same dimensions. Scanlines are blended in
/// parallel; every output sample depends only on the two input samples at the
/// same offset.
pub fn apply(
    bottom: &PixelBuffer,
    top: &PixelBuffer,
    mode: BlendMode,
) -> Result<PixelBuffer, CompositeError> {
    ensure_same_size(mode.name(), bottom, top)?;

    let mut out = bottom.blank_like();
    let row_bytes = bottom.dimensions().row_bytes().max(BYTES_PER_PIXEL);

    out.samples_mut()
        .par_chunks_mut(row_bytes)
        .zip(bottom.samples().par_chunks(row_bytes))
        .zip(top.samples().par_chunks(row_bytes))
        .for_each(|((dst, base), over)| {
            for ((d, &b), &o) in dst.iter_mut().zip(base).zip(over) {
                *d = mode.blend_channel(b, o);
            }
        });

    Ok(out)
}
