//! # tgablend
//!
//! A codec for uncompressed 24-bit TGA files and a compositor that blends,
//! adjusts, splits and reassembles the images it decodes.
//!
//! # Architecture: Decode → Composite → Encode
//!
//! Every operation follows the same shape:
//!
//! ```text
//! 1. Decode     file.tga  →  PixelBuffer     (header checked, rows normalized)
//! 2. Composite  buffers   →  PixelBuffer     (pure per-pixel math)
//! 3. Encode     buffer    →  file.tga        (bottom-left origin, always)
//! ```
//!
//! The compositor never touches the filesystem and the codec never does
//! pixel math, so either side can be tested without the other.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pixels`] | `PixelBuffer`, `Dimensions`, `Channel`: the in-memory BGR image |
//! | [`tga`] | Header parsing, decode, encode, header-only identify |
//! | [`composite`] | Blend modes, channel adjustments, split/combine, rotation |
//! | [`config`] | `tgablend.toml` batch task file: loading, merging, validation |
//! | [`batch`] | Runs a task list, writes outputs, verifies against references |
//! | [`scan`] | Header inspection for a file or a directory tree |
//! | [`export`] | PNG export through the `image` crate |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## One Canonical Orientation
//!
//! TGA files may store scanlines bottom-up or top-down (descriptor bit
//! `0x20`). The decoder flips top-down files on the way in, so a
//! [`PixelBuffer`](pixels::PixelBuffer) is always bottom-left origin and the
//! encoder always writes the descriptor as `0`. Compositing code indexes
//! pixels without ever asking where they came from.
//!
//! ## Integer Blend Math
//!
//! Multiply, screen and overlay work on 0–255 integers using
//! `(a * b + 127) / 255`, which rounds to nearest without going through
//! floating point. Results are bit-for-bit reproducible across platforms,
//! which the batch verifier depends on. See [`composite::math`].
//!
//! ## Mutation Is Explicit
//!
//! Blends and geometric operations return new buffers. Only the channel
//! adjustments rewrite a buffer, and they take `&mut PixelBuffer` so the
//! mutation is visible at every call site.
//!
//! ## Strict Input
//!
//! The codec accepts exactly one TGA flavor and rejects the rest with a
//! specific [`tga::FormatError`]. Empty images, color maps, RLE and other
//! bit depths fail before any pixel data is read.

pub mod batch;
pub mod composite;
pub mod config;
pub mod export;
pub mod output;
pub mod pixels;
pub mod scan;
pub mod tga;

#[cfg(test)]
pub(crate) mod test_helpers;
