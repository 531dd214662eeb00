//! The fixed 18-byte TGA file header.
//!
//! Multi-byte fields are little-endian on disk. The header is packed and
//! unpacked field by field with `from_le_bytes`/`to_le_bytes`; nothing here
//! relies on in-memory struct layout.
//!
//! ```text
//! offset  size  field
//!      0     1  id_length          bytes of image ID following the header
//!      1     1  color_map_type     0 = no color map
//!      2     1  data_type_code     2 = uncompressed true-color
//!      3     2  color_map_origin   ignored
//!      5     2  color_map_length   ignored
//!      7     1  color_map_depth    ignored
//!      8     2  x_origin           ignored
//!     10     2  y_origin           ignored
//!     12     2  width
//!     14     2  height
//!     16     1  bits_per_pixel     24
//!     17     1  image_descriptor   bit 0x20 set = row 0 on disk is the top
//! ```

use super::FormatError;
use crate::pixels::Dimensions;
use serde::Serialize;

/// Size of the fixed header record.
pub const HEADER_LEN: usize = 18;

const NO_COLOR_MAP: u8 = 0;
const UNCOMPRESSED_TRUE_COLOR: u8 = 2;
const BITS_PER_PIXEL: u8 = 24;
const TOP_ORIGIN_FLAG: u8 = 0x20;

/// Which scanline comes first in the on-disk payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Origin {
    BottomLeft,
    TopLeft,
}

impl Origin {
    pub fn label(self) -> &'static str {
        match self {
            Origin::BottomLeft => "bottom-left",
            Origin::TopLeft => "top-left",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct FileHeader {
    pub id_length: u8,
    pub color_map_type: u8,
    pub data_type_code: u8,
    pub color_map_origin: u16,
    pub color_map_length: u16,
    pub color_map_depth: u8,
    pub x_origin: u16,
    pub y_origin: u16,
    pub width: u16,
    pub height: u16,
    pub bits_per_pixel: u8,
    pub image_descriptor: u8,
}

impl FileHeader {
    /// Header for writing an image of the given size, bottom-left origin.
    pub fn for_dimensions(dimensions: Dimensions) -> Self {
        Self {
            data_type_code: UNCOMPRESSED_TRUE_COLOR,
            width: dimensions.width,
            height: dimensions.height,
            bits_per_pixel: BITS_PER_PIXEL,
            ..Self::default()
        }
    }

    pub fn parse(bytes: &[u8; HEADER_LEN]) -> Self {
        let u16_at = |offset: usize| u16::from_le_bytes([bytes[offset], bytes[offset + 1]]);
        Self {
            id_length: bytes[0],
            color_map_type: bytes[1],
            data_type_code: bytes[2],
            color_map_origin: u16_at(3),
            color_map_length: u16_at(5),
            color_map_depth: bytes[7],
            x_origin: u16_at(8),
            y_origin: u16_at(10),
            width: u16_at(12),
            height: u16_at(14),
            bits_per_pixel: bytes[16],
            image_descriptor: bytes[17],
        }
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0] = self.id_length;
        bytes[1] = self.color_map_type;
        bytes[2] = self.data_type_code;
        bytes[3..5].copy_from_slice(&self.color_map_origin.to_le_bytes());
        bytes[5..7].copy_from_slice(&self.color_map_length.to_le_bytes());
        bytes[7] = self.color_map_depth;
        bytes[8..10].copy_from_slice(&self.x_origin.to_le_bytes());
        bytes[10..12].copy_from_slice(&self.y_origin.to_le_bytes());
        bytes[12..14].copy_from_slice(&self.width.to_le_bytes());
        bytes[14..16].copy_from_slice(&self.height.to_le_bytes());
        bytes[16] = self.bits_per_pixel;
        bytes[17] = self.image_descriptor;
        bytes
    }

    /// Reject everything except uncompressed, non-empty 24-bit true-color.
    pub fn validate(&self) -> Result<(), FormatError> {
        if self.color_map_type != NO_COLOR_MAP {
            return Err(FormatError::ColorMapped(self.color_map_type));
        }
        if self.data_type_code != UNCOMPRESSED_TRUE_COLOR {
            return Err(FormatError::UnsupportedDataType(self.data_type_code));
        }
        if self.bits_per_pixel != BITS_PER_PIXEL {
            return Err(FormatError::UnsupportedBitDepth(self.bits_per_pixel));
        }
        if self.dimensions().is_empty() {
            return Err(FormatError::EmptyImage(self.dimensions()));
        }
        Ok(())
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    pub fn origin(&self) -> Origin {
        if self.image_descriptor & TOP_ORIGIN_FLAG != 0 {
            Origin::TopLeft
        } else {
            Origin::BottomLeft
        }
    }

    #[cfg(test)]
    pub fn with_origin(mut self, origin: Origin) -> Self {
        match origin {
            Origin::TopLeft => self.image_descriptor |= TOP_ORIGIN_FLAG,
            Origin::BottomLeft => self.image_descriptor &= !TOP_ORIGIN_FLAG,
        }
        self
    }
}
