//! In-memory pixel storage shared by the codec and the compositor.
//!
//! A [`PixelBuffer`] is a flat run of BGR triplets in **bottom-left origin**
//! order: the first `width * 3` bytes are the bottom scanline of the picture
//! as viewed. The codec normalizes every file into this layout on decode, so
//! nothing downstream ever needs to know how a source file was oriented.
//!
//! ```text
//! samples: [B G R][B G R] ... [B G R]   ← row 0 (bottom)
//!          [B G R][B G R] ... [B G R]   ← row 1
//!          ...
//!          [B G R][B G R] ... [B G R]   ← row height-1 (top)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Bytes per stored pixel (blue, green, red).
pub const BYTES_PER_PIXEL: usize = 3;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("{dimensions} image needs {expected} sample bytes, got {actual}")]
    LengthMismatch {
        dimensions: Dimensions,
        expected: usize,
        actual: usize,
    },
}

/// Width and height of an image, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u16,
    pub height: u16,
}

impl Dimensions {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }

    /// Length of one scanline in bytes.
    pub fn row_bytes(self) -> usize {
        usize::from(self.width) * BYTES_PER_PIXEL
    }

    /// Total sample bytes for an image of this size.
    pub fn byte_len(self) -> usize {
        self.pixel_count() * BYTES_PER_PIXEL
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// One color channel, named by its byte offset inside a BGR triplet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Blue = 0,
    Green = 1,
    Red = 2,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Blue, Channel::Green, Channel::Red];

    /// Offset of this channel within a pixel.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Channel::Blue => "blue",
            Channel::Green => "green",
            Channel::Red => "red",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded 24-bit image in canonical bottom-left order.
///
/// Buffers are immutable once built. The only in-place mutation goes through
/// [`ChannelAdjustment`](crate::composite::ChannelAdjustment), which takes
/// `&mut PixelBuffer` so callers can see at the call site that their buffer
/// is being changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    dimensions: Dimensions,
    samples: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw BGR samples, checking that the length matches the dimensions.
    pub fn new(width: u16, height: u16, samples: Vec<u8>) -> Result<Self, BufferError> {
        let dimensions = Dimensions::new(width, height);
        let expected = dimensions.byte_len();
        if samples.len() != expected {
            return Err(BufferError::LengthMismatch {
                dimensions,
                expected,
                actual: samples.len(),
            });
        }
        Ok(Self {
            dimensions,
            samples,
        })
    }

    /// A buffer where every pixel has the same BGR value.
    pub fn filled(width: u16, height: u16, bgr: [u8; 3]) -> Self {
        let dimensions = Dimensions::new(width, height);
        let samples = bgr.repeat(dimensions.pixel_count());
        Self {
            dimensions,
            samples,
        }
    }

    /// Build a buffer by evaluating `f(x, y)` for every pixel, `(0, 0)` at
    /// bottom-left.
    pub fn from_fn(width: u16, height: u16, mut f: impl FnMut(u16, u16) -> [u8; 3]) -> Self {
        let dimensions = Dimensions::new(width, height);
        let mut samples = Vec::with_capacity(dimensions.byte_len());
        for y in 0..height {
            for x in 0..width {
                samples.extend_from_slice(&f(x, y));
            }
        }
        Self {
            dimensions,
            samples,
        }
    }

    /// Wrap samples whose length the caller has already checked.
    pub(crate) fn from_exact(dimensions: Dimensions, samples: Vec<u8>) -> Self {
        debug_assert_eq!(samples.len(), dimensions.byte_len());
        Self {
            dimensions,
            samples,
        }
    }

    /// Allocate a zeroed buffer with the same size as `self`.
    pub(crate) fn blank_like(&self) -> Self {
        Self {
            dimensions: self.dimensions,
            samples: vec![0; self.samples.len()],
        }
    }

    pub fn width(&self) -> u16 {
        self.dimensions.width
    }

    pub fn height(&self) -> u16 {
        self.dimensions.height
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn pixel_count(&self) -> usize {
        self.dimensions.pixel_count()
    }

    /// Raw BGR samples, bottom row first.
    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    pub(crate) fn samples_mut(&mut self) -> &mut [u8] {
        &mut self.samples
    }

    pub fn into_samples(self) -> Vec<u8> {
        self.samples
    }

    /// BGR value at `(x, y)`, with `(0, 0)` at bottom-left.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is outside the image.
    pub fn pixel(&self, x: u16, y: u16) -> [u8; 3] {
        assert!(
            x < self.width() && y < self.height(),
            "pixel ({x}, {y}) outside {} image",
            self.dimensions
        );
        let offset = (usize::from(y) * usize::from(self.width()) + usize::from(x)) * BYTES_PER_PIXEL;
        [
            self.samples[offset],
            self.samples[offset + 1],
            self.samples[offset + 2],
        ]
    }

    /// Iterate over pixels in storage order.
    pub fn pixels(&self) -> impl Iterator<Item = [u8; 3]> + '_ {
        self.samples
            .chunks_exact(BYTES_PER_PIXEL)
            .map(|p| [p[0], p[1], p[2]])
    }

    /// Iterate over scanlines, bottom row first.
    pub fn rows(&self) -> impl DoubleEndedIterator<Item = &[u8]> + '_ {
        self.samples.chunks_exact(self.dimensions.row_bytes().max(1))
    }
}
