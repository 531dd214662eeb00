//! TGA encoding. Always writes bottom-left origin, which matches the
//! in-memory layout, so the payload goes out as a single block.

use super::CodecError;
use super::header::FileHeader;
use crate::pixels::PixelBuffer;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write `buffer` to `path`, replacing any existing file.
///
/// On failure the destination may hold a partial file; treat it as garbage.
pub fn encode(buffer: &PixelBuffer, path: &Path) -> Result<(), CodecError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    encode_to(buffer, &mut writer)?;
    writer.flush()?;
    Ok(())
}

pub fn encode_to(buffer: &PixelBuffer, writer: &mut impl Write) -> Result<(), CodecError> {
    let header = FileHeader::for_dimensions(buffer.dimensions());
    header.validate()?;
    writer.write_all(&header.to_bytes())?;
    writer.write_all(buffer.samples())?;
    Ok(())
}
