//! TGA decoding into a canonical bottom-left [`PixelBuffer`].

use super::header::{FileHeader, HEADER_LEN, Origin};
use super::{CodecError, HeaderInfo};
use crate::pixels::PixelBuffer;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Decode a TGA file from disk.
pub fn decode(path: &Path) -> Result<PixelBuffer, CodecError> {
    let file = File::open(path)?;
    decode_from(BufReader::new(file))
}

/// Decode a TGA stream.
///
/// The whole payload is read before a buffer is built, so any failure leaves
/// nothing behind.
pub fn decode_from(mut reader: impl Read) -> Result<PixelBuffer, CodecError> {
    let header = read_header(&mut reader)?;
    header.validate()?;

    let dimensions = header.dimensions();
    let expected = dimensions.byte_len();

    let skipped = io::copy(
        &mut reader.by_ref().take(u64::from(header.id_length)),
        &mut io::sink(),
    )?;
    if skipped < u64::from(header.id_length) {
        return Err(CodecError::TruncatedPayload {
            expected,
            actual: 0,
        });
    }

    // Grow with the data actually present; the header alone may claim gigabytes.
    let mut samples = Vec::new();
    reader
        .by_ref()
        .take(expected as u64)
        .read_to_end(&mut samples)?;
    if samples.len() < expected {
        return Err(CodecError::TruncatedPayload {
            expected,
            actual: samples.len(),
        });
    }

    if header.origin() == Origin::TopLeft {
        samples = flip_rows(&samples, dimensions.row_bytes());
    }

    Ok(PixelBuffer::from_exact(dimensions, samples))
}

/// Read and validate just the header of a TGA file.
pub fn identify(path: &Path) -> Result<HeaderInfo, CodecError> {
    let file = File::open(path)?;
    identify_from(BufReader::new(file))
}

pub fn identify_from(mut reader: impl Read) -> Result<HeaderInfo, CodecError> {
    let header = read_header(&mut reader)?;
    header.validate()?;
    Ok(HeaderInfo {
        dimensions: header.dimensions(),
        origin: header.origin(),
        id_length: header.id_length,
    })
}

fn read_header(reader: &mut impl Read) -> Result<FileHeader, CodecError> {
    let mut bytes = [0u8; HEADER_LEN];
    let actual = read_up_to(reader, &mut bytes)?;
    if actual < HEADER_LEN {
        return Err(CodecError::TruncatedHeader { actual });
    }
    Ok(FileHeader::parse(&bytes))
}

/// Fill `buf` as far as the stream allows, returning how many bytes landed.
///
/// Unlike `read_exact`, a short stream is not an error here; callers turn it
/// into a truncation error that carries the byte counts.
fn read_up_to(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Reverse scanline order, copying whole rows so pixels keep their
/// left-to-right order.
fn flip_rows(samples: &[u8], row_bytes: usize) -> Vec<u8> {
    let mut flipped = vec![0u8; samples.len()];
    for (dst, src) in flipped
        .chunks_exact_mut(row_bytes)
        .zip(samples.chunks_exact(row_bytes).rev())
    {
        dst.copy_from_slice(src);
    }
    flipped
}
