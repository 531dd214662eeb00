//! In-place channel adjustments.
//!
//! These are the only operations that rewrite a buffer instead of allocating
//! a new one. They take `&mut PixelBuffer`, so a caller who still needs the
//! original has to clone it first.

use super::CompositeError;
use super::math;
use crate::pixels::{BYTES_PER_PIXEL, Channel, PixelBuffer};
use serde::{Deserialize, Serialize};

/// A mutating transform on one channel of every pixel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ChannelAdjustment {
    /// `clamp(value + delta, 0, 255)`
    Add { channel: Channel, delta: i32 },
    /// `clamp(round(value * factor), 0, 255)`
    Scale { channel: Channel, factor: f32 },
}

impl ChannelAdjustment {
    pub fn channel(&self) -> Channel {
        match *self {
            ChannelAdjustment::Add { channel, .. } | ChannelAdjustment::Scale { channel, .. } => {
                channel
            }
        }
    }

    /// Check the parameters without touching any pixels.
    pub fn validate(&self) -> Result<(), CompositeError> {
        match *self {
            ChannelAdjustment::Add { .. } => Ok(()),
            ChannelAdjustment::Scale { factor, .. } => check_factor(factor),
        }
    }

    pub fn apply_in_place(&self, buffer: &mut PixelBuffer) -> Result<(), CompositeError> {
        match *self {
            ChannelAdjustment::Add { channel, delta } => {
                add_to_channel(buffer, channel, delta);
                Ok(())
            }
            ChannelAdjustment::Scale { channel, factor } => scale_channel(buffer, channel, factor),
        }
    }
}

/// Add `delta` to one channel of every pixel, clamping to 0–255.
pub fn add_to_channel(buffer: &mut PixelBuffer, channel: Channel, delta: i32) {
    for_each_sample(buffer, channel, |v| math::offset(v, delta));
}

/// Multiply one channel of every pixel by `factor`, rounding and clamping.
///
/// `factor` must be finite and non-negative; `0.0` clears the channel.
pub fn scale_channel(
    buffer: &mut PixelBuffer,
    channel: Channel,
    factor: f32,
) -> Result<(), CompositeError> {
    check_factor(factor)?;
    for_each_sample(buffer, channel, |v| math::scale(v, factor));
    Ok(())
}

fn check_factor(factor: f32) -> Result<(), CompositeError> {
    if factor.is_finite() && factor >= 0.0 {
        Ok(())
    } else {
        Err(CompositeError::InvalidFactor(factor))
    }
}

fn for_each_sample(buffer: &mut PixelBuffer, channel: Channel, f: impl Fn(u8) -> u8) {
    let idx = channel.index();
    for pixel in buffer.samples_mut().chunks_exact_mut(BYTES_PER_PIXEL) {
        pixel[idx] = f(pixel[idx]);
    }
}
