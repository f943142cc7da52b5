//! Block header parsing
//!
//! Two header layouts exist: the 20-byte layout used by full game-data
//! containers and the 14-byte layout of the boot container.

use std::fmt;
use std::str::FromStr;

use byteorder::{ByteOrder, LE};
use serde::{Deserialize, Serialize};

use crate::compression::Compression;
use crate::{Error, Result};

/// Full header size in bytes
pub const FULL_HEADER_SIZE: usize = 20;

/// Boot header size in bytes
pub const BOOT_HEADER_SIZE: usize = 14;

/// Which header layout a container uses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderLayout {
    /// 14-byte headers with serialized base and module/block ids, no checksums
    Boot,
    /// 20-byte headers with compression flag and both checksums
    #[default]
    Full,
}

impl HeaderLayout {
    #[inline]
    pub const fn size(self) -> usize {
        match self {
            Self::Boot => BOOT_HEADER_SIZE,
            Self::Full => FULL_HEADER_SIZE,
        }
    }
}

impl fmt::Display for HeaderLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boot => write!(f, "boot"),
            Self::Full => write!(f, "full"),
        }
    }
}

impl FromStr for HeaderLayout {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "boot" => Ok(Self::Boot),
            "full" => Ok(Self::Full),
            other => Err(format!("unknown header layout '{}' (expected boot or full)", other)),
        }
    }
}

/// Identity carried by boot headers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BootOrigin {
    /// Address the block occupied when the container was written
    pub serialized_base: u32,
    pub module: u8,
    pub local_id: u8,
}

/// A parsed block header
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockHeader {
    pub compression_flag: u32,
    pub compressed_size: u32,
    pub decompressed_size: u32,
    /// Adler-32 of the payload as stored (full layout only)
    pub compressed_checksum: Option<u32>,
    /// Adler-32 of the decompressed payload (full layout only)
    pub decompressed_checksum: Option<u32>,
    /// Serialized base and ids (boot layout only)
    pub origin: Option<BootOrigin>,
}

impl BlockHeader {
    /// Parse the header at `offset` in the container bytes
    ///
    /// Fails with `TruncatedContainer` when fewer bytes than a header remain,
    /// and with `MalformedHeader` for a boot header declaring a zero size.
    pub fn read(layout: HeaderLayout, data: &[u8], offset: usize) -> Result<Self> {
        let available = data.len().saturating_sub(offset);
        if available < layout.size() {
            return Err(Error::TruncatedContainer {
                offset,
                needed: layout.size(),
                available,
            });
        }

        let bytes = &data[offset..offset + layout.size()];
        match layout {
            HeaderLayout::Full => Ok(Self {
                compression_flag: LE::read_u32(&bytes[0..4]),
                compressed_size: LE::read_u32(&bytes[4..8]),
                compressed_checksum: Some(LE::read_u32(&bytes[8..12])),
                decompressed_size: LE::read_u32(&bytes[12..16]),
                decompressed_checksum: Some(LE::read_u32(&bytes[16..20])),
                origin: None,
            }),
            HeaderLayout::Boot => {
                let compressed_size = LE::read_u32(&bytes[6..10]);
                let decompressed_size = LE::read_u32(&bytes[10..14]);

                if compressed_size == 0 || decompressed_size == 0 {
                    return Err(Error::MalformedHeader {
                        offset,
                        reason: "boot header declares a zero size",
                    });
                }

                let compression = if compressed_size == decompressed_size {
                    Compression::Stored
                } else {
                    Compression::Inflate
                };

                Ok(Self {
                    compression_flag: compression.flag(),
                    compressed_size,
                    decompressed_size,
                    compressed_checksum: None,
                    decompressed_checksum: None,
                    origin: Some(BootOrigin {
                        serialized_base: LE::read_u32(&bytes[0..4]),
                        module: bytes[4],
                        local_id: bytes[5],
                    }),
                })
            }
        }
    }

    /// Serialize back into the given layout
    pub fn to_bytes(&self, layout: HeaderLayout) -> Vec<u8> {
        let mut out = vec![0u8; layout.size()];
        match layout {
            HeaderLayout::Full => {
                LE::write_u32(&mut out[0..4], self.compression_flag);
                LE::write_u32(&mut out[4..8], self.compressed_size);
                LE::write_u32(&mut out[8..12], self.compressed_checksum.unwrap_or_default());
                LE::write_u32(&mut out[12..16], self.decompressed_size);
                LE::write_u32(&mut out[16..20], self.decompressed_checksum.unwrap_or_default());
            }
            HeaderLayout::Boot => {
                let origin = self.origin.unwrap_or(BootOrigin {
                    serialized_base: 0,
                    module: 0,
                    local_id: 0,
                });
                LE::write_u32(&mut out[0..4], origin.serialized_base);
                out[4] = origin.module;
                out[5] = origin.local_id;
                LE::write_u32(&mut out[6..10], self.compressed_size);
                LE::write_u32(&mut out[10..14], self.decompressed_size);
            }
        }
        out
    }
}
