//! Replay blob decompression.
//!
//! Blobs arrive either gzip- or zlib-framed depending on where they were
//! exported from. The framing is detected from the first bytes.

use flate2::read::{GzDecoder, ZlibDecoder};
use std::io::{self, Read};
use thiserror::Error;

const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

#[derive(Debug, Error)]
pub enum DecompressError {
    #[error("compressed blob is empty")]
    Empty,

    #[error("inflate failed: {0}")]
    Io(#[from] io::Error),
}

/// Decompress a gzip or zlib framed blob.
pub fn inflate(compressed: &[u8]) -> Result<Vec<u8>, DecompressError> {
    if compressed.is_empty() {
        return Err(DecompressError::Empty);
    }

    let mut out = Vec::with_capacity(compressed.len() * 4);
    if compressed.starts_with(&GZIP_MAGIC) {
        GzDecoder::new(compressed).read_to_end(&mut out)?;
    } else {
        ZlibDecoder::new(compressed).read_to_end(&mut out)?;
    }
    Ok(out)
}
