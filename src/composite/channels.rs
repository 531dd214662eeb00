//! Whole-image channel and geometry operations. All of them allocate a new
//! buffer and leave their inputs alone.

use super::math;
use super::{CompositeError, ensure_same_size};
use crate::pixels::{BYTES_PER_PIXEL, Channel, PixelBuffer};

/// The three gray images produced by [`split_rgb`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSplit {
    pub red: PixelBuffer,
    pub green: PixelBuffer,
    pub blue: PixelBuffer,
}

impl ChannelSplit {
    pub fn get(&self, channel: Channel) -> &PixelBuffer {
        match channel {
            Channel::Red => &self.red,
            Channel::Green => &self.green,
            Channel::Blue => &self.blue,
        }
    }
}

/// Split into one gray image per channel.
///
/// Each output broadcasts a single source channel into all three of its own
/// channels, so the red output is a gray picture of the red samples.
pub fn split_rgb(buffer: &PixelBuffer) -> ChannelSplit {
    ChannelSplit {
        red: broadcast(buffer, Channel::Red),
        green: broadcast(buffer, Channel::Green),
        blue: broadcast(buffer, Channel::Blue),
    }
}

fn broadcast(buffer: &PixelBuffer, channel: Channel) -> PixelBuffer {
    let idx = channel.index();
    map_pixels(buffer, |p| [p[idx]; 3])
}

/// Rebuild a color image from per-channel sources.
///
/// Red comes from the red slot of `red`, green from the green slot of
/// `green`, blue from the blue slot of `blue`. With the output of
/// [`split_rgb`] this reproduces the original.
pub fn combine_rgb(
    red: &PixelBuffer,
    green: &PixelBuffer,
    blue: &PixelBuffer,
) -> Result<PixelBuffer, CompositeError> {
    ensure_same_size("combine", red, green)?;
    ensure_same_size("combine", red, blue)?;

    let mut out = red.blank_like();
    let sources = red
        .samples()
        .chunks_exact(BYTES_PER_PIXEL)
        .zip(green.samples().chunks_exact(BYTES_PER_PIXEL))
        .zip(blue.samples().chunks_exact(BYTES_PER_PIXEL));

    for (dst, ((r, g), b)) in out
        .samples_mut()
        .chunks_exact_mut(BYTES_PER_PIXEL)
        .zip(sources)
    {
        dst[Channel::Blue.index()] = b[Channel::Blue.index()];
        dst[Channel::Green.index()] = g[Channel::Green.index()];
        dst[Channel::Red.index()] = r[Channel::Red.index()];
    }
    Ok(out)
}

/// Rotate by 180 degrees: pixel `p` of the output is pixel `n - 1 - p` of
/// the input, moved as a whole BGR triplet.
pub fn rotate180(buffer: &PixelBuffer) -> PixelBuffer {
    let mut out = buffer.blank_like();
    for (dst, src) in out
        .samples_mut()
        .chunks_exact_mut(BYTES_PER_PIXEL)
        .zip(buffer.samples().chunks_exact(BYTES_PER_PIXEL).rev())
    {
        dst.copy_from_slice(src);
    }
    out
}

/// Gray image from Rec. 601 luma.
pub fn grayscale(buffer: &PixelBuffer) -> PixelBuffer {
    map_pixels(buffer, |p| [math::luma([p[0], p[1], p[2]]); 3])
}

/// Count samples that differ between two same-size images.
pub fn count_differences(a: &PixelBuffer, b: &PixelBuffer) -> Result<usize, CompositeError> {
    ensure_same_size("compare", a, b)?;
    Ok(a.samples()
        .iter()
        .zip(b.samples())
        .filter(|(x, y)| x != y)
        .count())
}

fn map_pixels(buffer: &PixelBuffer, f: impl Fn(&[u8]) -> [u8; 3]) -> PixelBuffer {
    let mut out = buffer.blank_like();
    for (dst, src) in out
        .samples_mut()
        .chunks_exact_mut(BYTES_PER_PIXEL)
        .zip(buffer.samples().chunks_exact(BYTES_PER_PIXEL))
    {
        dst.copy_from_slice(&f(src));
    }
    out
}
