//! Pixel compositing engine.
//!
//! | Operation | Function | Output |
//! |---|---|---|
//! | **Blend** | [`apply`] with a [`BlendMode`] | new buffer |
//! | **Channel offset** | [`add_to_channel`] | in place |
//! | **Channel scale** | [`scale_channel`] | in place |
//! | **Split** | [`split_rgb`] | three new buffers |
//! | **Combine** | [`combine_rgb`] | new buffer |
//! | **Rotate** | [`rotate180`] | new buffer |
//! | **Grayscale** | [`grayscale`] | new buffer |
//! | **Compare** | [`count_differences`] | count |
//!
//! The module is split into:
//! - **Math**: per-channel arithmetic, pure and exhaustively testable
//! - **Mode**: [`BlendMode`] and the whole-image blend
//! - **Adjust**: the in-place [`ChannelAdjustment`] transforms
//! - **Channels**: split, combine, rotate and friends
//!
//! Nothing here knows about files. Every binary operation checks that its
//! operands have the same dimensions and fails with
//! [`CompositeError::DimensionMismatch`] otherwise; there is no implicit
//! cropping or padding.

mod adjust;
mod channels;
pub mod math;
mod mode;

pub use adjust::{ChannelAdjustment, add_to_channel, scale_channel};
pub use channels::{
    ChannelSplit, combine_rgb, count_differences, grayscale, rotate180, split_rgb,
};
pub use mode::{BlendMode, apply};

use crate::pixels::{Dimensions, PixelBuffer};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompositeError {
    #[error("{operation}: size mismatch, expected {expected} but got {actual}")]
    DimensionMismatch {
        operation: &'static str,
        expected: Dimensions,
        actual: Dimensions,
    },
    #[error("scale factor must be finite and non-negative, got {0}")]
    InvalidFactor(f32),
}

pub(crate) fn ensure_same_size(
    operation: &'static str,
    first: &PixelBuffer,
    second: &PixelBuffer,
) -> Result<(), CompositeError> {
    if first.dimensions() != second.dimensions() {
        return Err(CompositeError::DimensionMismatch {
            operation,
            expected: first.dimensions(),
            actual: second.dimensions(),
        });
    }
    Ok(())
}
