//! Uncompressed 24-bit TGA codec.
//!
//! | Operation | Function |
//! |---|---|
//! | **Decode** | [`decode`] / [`decode_from`] |
//! | **Encode** | [`encode`] / [`encode_to`] |
//! | **Header only** | [`identify`] |
//!
//! Only one flavor of TGA is accepted: no color map, data type 2
//! (uncompressed true-color), 24 bits per pixel. Everything else is rejected
//! with a distinct [`FormatError`] before any pixel data is read.
//!
//! Decoding normalizes scanline order to bottom-left origin, which is also
//! the only orientation the encoder writes. A decoded buffer can therefore
//! be written straight back out without flipping.

mod decode;
mod encode;
mod header;

pub use decode::{decode, decode_from, identify, identify_from};
pub use encode::{encode, encode_to};
pub use header::{HEADER_LEN, Origin};

pub(crate) use header::FileHeader;

use crate::pixels::Dimensions;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported TGA: {0}")]
    Format(#[from] FormatError),
    #[error("Truncated header: expected {HEADER_LEN} bytes, got {actual}")]
    TruncatedHeader { actual: usize },
    #[error("Truncated payload: expected {expected} bytes, got {actual}")]
    TruncatedPayload { expected: usize, actual: usize },
}

/// Header values this codec cannot handle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("color-mapped images are not supported (color map type {0})")]
    ColorMapped(u8),
    #[error("need uncompressed true-color (type 2), got type {0}")]
    UnsupportedDataType(u8),
    #[error("need 24 bits per pixel, got {0}")]
    UnsupportedBitDepth(u8),
    #[error("image has no pixels ({0})")]
    EmptyImage(Dimensions),
}

/// What a validated header says about a file, without reading its pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeaderInfo {
    pub dimensions: Dimensions,
    pub origin: Origin,
    pub id_length: u8,
}

impl HeaderInfo {
    /// Total file size implied by the header.
    pub fn expected_file_len(&self) -> usize {
        HEADER_LEN + usize::from(self.id_length) + self.dimensions.byte_len()
    }
}
