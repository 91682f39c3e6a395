//! One-shot zlib compression of whole containers
//!
//! Compressed containers carry no framing of their own: the file is exactly
//! one zlib stream wrapping the raw buffer.

use crate::error::{Error, Result};

/// Worst-case size of the zlib stream for `source_len` input bytes
pub fn compress_bound(source_len: usize) -> usize {
    let proportional = 128 + source_len * 110 / 100;
    let blockwise = 128 + source_len + (source_len / (31 * 1024) + 1) * 5;
    proportional.max(blockwise)
}

/// Compress a buffer into a zlib stream
#[cfg(feature = "compression")]
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    use flate2::Compression;
    use flate2::write::ZlibEncoder;
    use std::io::Write;

    let bound = compress_bound(data.len());
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(bound), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| Error::Compression(format!("Compression failed: {}", e)))?;
    let compressed = encoder
        .finish()
        .map_err(|e| Error::Compression(format!("Compression failed: {}", e)))?;
    if compressed.len() > bound {
        return Err(Error::Compression(format!(
            "compressed size {} exceeds bound {}",
            compressed.len(),
            bound
        )));
    }
    Ok(compressed)
}

/// Compress a buffer into a zlib stream
#[cfg(not(feature = "compression"))]
pub fn compress(_data: &[u8]) -> Result<Vec<u8>> {
    Err(Error::Unsupported(
        "compressed output requires the 'compression' feature".to_string(),
    ))
}

/// Decompress a zlib stream
#[cfg(feature = "compression")]
pub fn decompress(compressed: &[u8]) -> Result<Vec<u8>> {
    decompress_limited(compressed, crate::validator::MAX_BUFFER_SIZE)
}

/// Decompress a zlib stream whose output must not exceed `limit` bytes
#[cfg(feature = "compression")]
pub(crate) fn decompress_limited(compressed: &[u8], limit: usize) -> Result<Vec<u8>> {
    use flate2::read::ZlibDecoder;
    use std::io::Read;

    let mut decoder = ZlibDecoder::new(compressed).take(limit as u64 + 1);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| Error::Compression(format!("Decompression failed: {}", e)))?;
    if decompressed.len() > limit {
        return Err(Error::Compression(format!(
            "Decompressed data exceeds {} bytes",
            limit
        )));
    }
    Ok(decompressed)
}

/// Decompress a zlib stream
#[cfg(not(feature = "compression"))]
pub fn decompress(_compressed: &[u8]) -> Result<Vec<u8>> {
    Err(Error::Unsupported(
        "compressed input requires the 'compression' feature".to_string(),
    ))
}
