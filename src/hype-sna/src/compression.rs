//! Block payload decompression
//!
//! Provides a trait-based interface over the compression methods found in
//! SNA containers:
//! - `Stored`: payload is kept verbatim
//! - `Inflate`: DEFLATE stream (raw, or zlib-wrapped) via `flate2`
//! - `Lzo`: LZO1X stream via `lzokay-native`

use std::fmt;
use std::io::{Cursor, Read};

use flate2::read::{DeflateDecoder, ZlibDecoder};
use serde::{Deserialize, Serialize};

use crate::checksum;
use crate::header::BlockHeader;
use crate::{ChecksumStage, Error, Result};

/// Compression method named by a block header's flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    Stored,
    Inflate,
    Lzo,
}

impl Compression {
    pub const STORED_FLAG: u32 = 0;
    pub const INFLATE_FLAG: u32 = 1;
    pub const LZO_FLAG: u32 = 2;

    /// Map a header flag onto a known method
    pub fn from_flag(flag: u32) -> Result<Self> {
        match flag {
            Self::STORED_FLAG => Ok(Self::Stored),
            Self::INFLATE_FLAG => Ok(Self::Inflate),
            Self::LZO_FLAG => Ok(Self::Lzo),
            other => Err(Error::UnsupportedCompression(other)),
        }
    }

    pub fn flag(self) -> u32 {
        match self {
            Self::Stored => Self::STORED_FLAG,
            Self::Inflate => Self::INFLATE_FLAG,
            Self::Lzo => Self::LZO_FLAG,
        }
    }

    /// Backend that handles this method
    pub fn backend(self) -> &'static dyn Decompressor {
        match self {
            Self::Stored => &StoredBackend,
            Self::Inflate => &InflateBackend,
            Self::Lzo => &LzoBackend,
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.backend().name())
    }
}

/// Trait for block payload decompression
pub trait Decompressor: Send + Sync {
    /// Decompress a single block payload
    ///
    /// # Arguments
    /// * `compressed` - The payload bytes as stored in the container
    /// * `decompressed_size` - Size declared by the block header
    fn decompress(&self, compressed: &[u8], decompressed_size: usize) -> Result<Vec<u8>>;

    /// Backend name for diagnostics
    fn name(&self) -> &'static str;
}

/// Uncompressed payloads
#[derive(Debug, Default, Clone, Copy)]
pub struct StoredBackend;

impl Decompressor for StoredBackend {
    fn decompress(&self, compressed: &[u8], _decompressed_size: usize) -> Result<Vec<u8>> {
        Ok(compressed.to_vec())
    }

    fn name(&self) -> &'static str {
        "stored"
    }
}

/// DEFLATE payloads
///
/// Upper bound on DEFLATE's expansion ratio
const MAX_INFLATE_RATIO: usize = 1032;

/// The boot container stores raw DEFLATE streams; a zlib header is detected
/// and honored when present.
#[derive(Debug, Default, Clone, Copy)]
pub struct InflateBackend;

impl InflateBackend {
    fn has_zlib_header(data: &[u8]) -> bool {
        data.len() >= 2
            && data[0] & 0x0f == 8
            && data[0] >> 4 <= 7
            && (u16::from(data[0]) << 8 | u16::from(data[1])) % 31 == 0
    }

    fn inflate<R: Read>(
        reader: R,
        compressed_len: usize,
        decompressed_size: usize,
    ) -> std::io::Result<Vec<u8>> {
        // Declared sizes are not trusted for the reservation
        let capacity = decompressed_size.min(compressed_len.saturating_mul(MAX_INFLATE_RATIO));
        let mut output = Vec::with_capacity(capacity);
        // Read one byte past the declared size so oversized streams are caught
        reader
            .take(decompressed_size as u64 + 1)
            .read_to_end(&mut output)?;
        Ok(output)
    }
}

impl Decompressor for InflateBackend {
    fn decompress(&self, compressed: &[u8], decompressed_size: usize) -> Result<Vec<u8>> {
        let len = compressed.len();
        let result = if Self::has_zlib_header(compressed) {
            Self::inflate(ZlibDecoder::new(compressed), len, decompressed_size)
                .or_else(|_| Self::inflate(DeflateDecoder::new(compressed), len, decompressed_size))
        } else {
            Self::inflate(DeflateDecoder::new(compressed), len, decompressed_size)
        };

        result.map_err(|e| Error::DecompressionFailure {
            method: Compression::Inflate,
            message: e.to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "inflate"
    }
}

/// LZO1X payloads
#[derive(Debug, Default, Clone, Copy)]
pub struct LzoBackend;

impl Decompressor for LzoBackend {
    fn decompress(&self, compressed: &[u8], decompressed_size: usize) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(compressed);
        lzokay_native::decompress(&mut cursor, Some(decompressed_size)).map_err(|e| {
            Error::DecompressionFailure {
                method: Compression::Lzo,
                message: format!("{:?}", e),
            }
        })
    }

    fn name(&self) -> &'static str {
        "lzo"
    }
}

/// Decompress a payload and enforce the declared size
pub fn decompress(
    compression: Compression,
    compressed: &[u8],
    decompressed_size: usize,
) -> Result<Vec<u8>> {
    let output = compression
        .backend()
        .decompress(compressed, decompressed_size)?;

    if output.len() != decompressed_size {
        return Err(Error::SizeMismatch {
            expected: decompressed_size,
            actual: output.len(),
        });
    }

    Ok(output)
}

/// Validate and decompress one block payload
///
/// Checks the compressed checksum, decompresses with the header's method,
/// enforces the declared size, then checks the decompressed checksum.
/// Checksums are skipped for header layouts that do not carry them.
pub fn unpack(header: &BlockHeader, payload: &[u8]) -> Result<Vec<u8>> {
    if let Some(expected) = header.compressed_checksum {
        checksum::verify(ChecksumStage::Compressed, expected, payload)?;
    }

    let compression = Compression::from_flag(header.compression_flag)?;
    let data = decompress(compression, payload, header.decompressed_size as usize)?;

    if let Some(expected) = header.decompressed_checksum {
        checksum::verify(ChecksumStage::Decompressed, expected, &data)?;
    }

    Ok(data)
}
