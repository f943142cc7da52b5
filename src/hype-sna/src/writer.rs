//! Container writer
//!
//! Builds containers in either header layout. Used to produce fixtures and by
//! tooling that repacks extracted blocks.

use std::io::Write;

use flate2::write::DeflateEncoder;

use crate::checksum::adler32;
use crate::compression::Compression;
use crate::header::{BlockHeader, BootOrigin, HeaderLayout};
use crate::Result;

/// Accumulates blocks and serializes them as one container
#[derive(Debug, Clone)]
pub struct ContainerWriter {
    layout: HeaderLayout,
    out: Vec<u8>,
    blocks: usize,
}

impl ContainerWriter {
    pub fn new(layout: HeaderLayout) -> Self {
        Self {
            layout,
            out: Vec::new(),
            blocks: 0,
        }
    }

    /// Number of blocks written so far
    pub fn len(&self) -> usize {
        self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks == 0
    }

    fn deflate(data: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = DeflateEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data)?;
        Ok(encoder.finish()?)
    }

    fn push(&mut self, header: &BlockHeader, payload: &[u8]) {
        self.out.extend_from_slice(&header.to_bytes(self.layout));
        self.out.extend_from_slice(payload);
        self.blocks += 1;
    }

    fn full_header(compression: Compression, payload: &[u8], data: &[u8]) -> BlockHeader {
        BlockHeader {
            compression_flag: compression.flag(),
            compressed_size: payload.len() as u32,
            decompressed_size: data.len() as u32,
            compressed_checksum: Some(adler32(payload)),
            decompressed_checksum: Some(adler32(data)),
            origin: None,
        }
    }

    /// Append an uncompressed block with both checksums
    pub fn push_stored(&mut self, data: &[u8]) -> &mut Self {
        let header = Self::full_header(Compression::Stored, data, data);
        self.push(&header, data);
        self
    }

    /// Append a raw-DEFLATE block with both checksums
    pub fn push_deflated(&mut self, data: &[u8]) -> Result<&mut Self> {
        let payload = Self::deflate(data)?;
        let header = Self::full_header(Compression::Inflate, &payload, data);
        self.push(&header, &payload);
        Ok(self)
    }

    /// Append a boot-layout block
    ///
    /// When `compress` is set the payload is deflated, unless the stream comes
    /// out exactly as long as the input: equal sizes mean "stored" in this
    /// layout, so the raw bytes are written instead.
    pub fn push_boot(
        &mut self,
        serialized_base: u32,
        module: u8,
        local_id: u8,
        data: &[u8],
        compress: bool,
    ) -> Result<&mut Self> {
        let mut payload = if compress {
            Self::deflate(data)?
        } else {
            data.to_vec()
        };
        if payload.len() == data.len() {
            payload = data.to_vec();
        }

        let header = BlockHeader {
            compression_flag: 0,
            compressed_size: payload.len() as u32,
            decompressed_size: data.len() as u32,
            compressed_checksum: None,
            decompressed_checksum: None,
            origin: Some(BootOrigin {
                serialized_base,
                module,
                local_id,
            }),
        };
        self.push(&header, &payload);
        Ok(self)
    }

    /// Serialized container bytes
    pub fn finish(self) -> Vec<u8> {
        self.out
    }
}
