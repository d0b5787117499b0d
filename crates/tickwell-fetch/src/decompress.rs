//! Streaming decompression of bi5 blobs.

use std::io::{BufRead, Write};
use thiserror::Error;

/// Magic bytes at the start of an `.xz` container.
const XZ_MAGIC: [u8; 6] = [0xFD, b'7', b'z', b'X', b'Z', 0x00];

/// Errors that can occur during decompression.
#[derive(Error, Debug)]
pub enum DecompressError {
    /// LZMA decompression failed.
    #[error("LZMA decompression failed: {0}")]
    LzmaError(String),

    /// Reading the compressed source failed.
    #[error("I/O error while decompressing: {0}")]
    Io(#[from] std::io::Error),

    /// Empty input data.
    #[error("Empty input data")]
    EmptyInput,
}

/// Pull-based streaming decoder from a byte source into a byte sink.
pub trait Decompressor: Send + Sync {
    /// Decodes everything readable from `source` into `sink`.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is corrupt or I/O fails.
    fn decode(&self, source: &mut dyn BufRead, sink: &mut dyn Write)
    -> Result<(), DecompressError>;

    /// Decompresses an in-memory blob.
    ///
    /// The output buffer starts at twice the input size and grows
    /// geometrically from there.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or decoding fails.
    fn decompress(&self, compressed: &[u8]) -> Result<Vec<u8>, DecompressError> {
        if compressed.is_empty() {
            return Err(DecompressError::EmptyInput);
        }

        let mut output = Vec::with_capacity(compressed.len().saturating_mul(2));
        let mut source = compressed;
        self.decode(&mut source, &mut output)?;
        Ok(output)
    }
}

/// LZMA decoder for bi5 blobs.
///
/// Dukascopy serves raw `.lzma` streams; `.xz` framed payloads are detected
/// by their magic bytes and decoded as well.
#[derive(Debug, Clone, Copy, Default)]
pub struct LzmaDecompressor;

impl Decompressor for LzmaDecompressor {
    fn decode(
        &self,
        mut source: &mut dyn BufRead,
        mut sink: &mut dyn Write,
    ) -> Result<(), DecompressError> {
        let is_xz = source.fill_buf()?.starts_with(&XZ_MAGIC);

        let result = if is_xz {
            lzma_rs::xz_decompress(&mut source, &mut sink)
        } else {
            lzma_rs::lzma_decompress(&mut source, &mut sink)
        };
        result.map_err(|e| DecompressError::LzmaError(e.to_string()))?;

        sink.flush()?;
        Ok(())
    }
}

/// Decompresses LZMA-compressed bi5 data.
///
/// # Errors
///
/// Returns an error if decompression fails.
///
/// # Example
///
/// ```
/// use tickwell_fetch::decompress_bi5;
///
/// let records = vec![7u8; 40];
/// let mut compressed = Vec::new();
/// lzma_rs::lzma_compress(&mut records.as_slice(), &mut compressed).unwrap();
///
/// assert_eq!(decompress_bi5(&compressed).unwrap(), records);
/// assert!(decompress_bi5(b"not lzma").is_err());
/// ```
pub fn decompress_bi5(compressed: &[u8]) -> Result<Vec<u8>, DecompressError> {
    LzmaDecompressor.decompress(compressed)
}
