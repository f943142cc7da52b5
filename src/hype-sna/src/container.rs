//! Block container loading
//!
//! Walks the sequential header stream of a container, validating and
//! decompressing each block. Failures local to one block are collected in the
//! report and scanning continues; a header or payload that runs past the end
//! of the file stops the scan since nothing after it can be framed reliably.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::block::Block;
use crate::compression::{self, Compression};
use crate::header::{BlockHeader, HeaderLayout};
use crate::{Error, Result};

/// Options controlling how a container is framed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Header layout used by the container
    pub layout: HeaderLayout,
    /// Module id assigned to blocks whose headers carry none
    pub module: u8,
}

impl LoadOptions {
    pub fn new(layout: HeaderLayout) -> Self {
        Self { layout, module: 0 }
    }

    pub fn with_module(mut self, module: u8) -> Self {
        self.module = module;
        self
    }
}

/// A block that could not be loaded
#[derive(Debug)]
pub struct BlockFailure {
    /// Header index in file order
    pub ordinal: usize,
    /// Offset of the block header in the container
    pub offset: usize,
    pub error: Error,
}

/// Result of scanning a container
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Successfully loaded blocks in file order
    pub blocks: Vec<Block>,
    pub failures: Vec<BlockFailure>,
    /// True when scanning ended before the end of the file
    pub stopped_early: bool,
    /// Bytes consumed by fully framed blocks
    pub consumed: usize,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && !self.stopped_early
    }
}

/// Scan container bytes into blocks
pub fn load(data: &[u8], options: &LoadOptions) -> LoadReport {
    let mut report = LoadReport::default();
    let header_size = options.layout.size();
    let mut offset = 0usize;
    let mut ordinal = 0usize;

    while offset < data.len() {
        let header = match BlockHeader::read(options.layout, data, offset) {
            Ok(h) => h,
            Err(error) => {
                warn!(ordinal, offset, %error, "Stopping container scan");
                report.failures.push(BlockFailure {
                    ordinal,
                    offset,
                    error,
                });
                report.stopped_early = true;
                break;
            }
        };

        let payload_start = offset + header_size;
        let payload_len = header.compressed_size as usize;
        let available = data.len() - payload_start;
        if payload_len > available {
            let error = Error::TruncatedContainer {
                offset: payload_start,
                needed: payload_len,
                available,
            };
            warn!(ordinal, offset, %error, "Stopping container scan");
            report.failures.push(BlockFailure {
                ordinal,
                offset,
                error,
            });
            report.stopped_early = true;
            break;
        }

        let payload = &data[payload_start..payload_start + payload_len];
        match load_block(ordinal, offset, &header, payload, options) {
            Ok(block) => {
                debug!(
                    ordinal,
                    offset,
                    compression = %block.compression,
                    size = block.size(),
                    kind = %block.kind,
                    "Loaded block"
                );
                report.blocks.push(block);
            }
            Err(error) => {
                warn!(ordinal, offset, %error, "Skipping block");
                report.failures.push(BlockFailure {
                    ordinal,
                    offset,
                    error,
                });
            }
        }

        offset = payload_start + payload_len;
        report.consumed = offset;
        ordinal += 1;
    }

    report
}

fn load_block(
    ordinal: usize,
    offset: usize,
    header: &BlockHeader,
    payload: &[u8],
    options: &LoadOptions,
) -> Result<Block> {
    let compression = Compression::from_flag(header.compression_flag)?;
    let data = compression::unpack(header, payload)?;
    Ok(Block::new(
        ordinal,
        offset,
        header,
        compression,
        payload.to_vec(),
        data,
        options.module,
    ))
}

/// Read a container from disk and scan it
pub fn open<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<LoadReport> {
    let data = std::fs::read(path.as_ref())?;
    Ok(load(&data, options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::ContainerWriter;
    use crate::BlockKind;

    #[test]
    fn test_empty_container() {
        let report = load(&[], &LoadOptions::default());
        assert!(report.blocks.is_empty());
        assert!(report.is_clean());
    }

    #[test]
    fn test_load_full_container() {
        let mut writer = ContainerWriter::new(HeaderLayout::Full);
        writer.push_stored(b"SCNE0123456789ab");
        writer.push_deflated(&[0x11u8; 64]).unwrap();
        let bytes = writer.finish();

        let report = load(&bytes, &LoadOptions::default().with_module(3));
        assert!(report.is_clean());
        assert_eq!(report.consumed, bytes.len());
        assert_eq!(report.blocks.len(), 2);

        let first = &report.blocks[0];
        assert_eq!(first.kind, BlockKind::SceneGraph);
        assert_eq!(first.compression, Compression::Stored);
        assert_eq!(first.module, 3);
        assert_eq!(first.data, first.raw);

        let second = &report.blocks[1];
        assert_eq!(second.ordinal, 1);
        assert_eq!(second.compression, Compression::Inflate);
        assert_eq!(second.data, vec![0x11u8; 64]);
        assert_eq!(second.file_offset, 20 + 16);
    }

    #[test]
    fn test_corrupt_block_is_skipped() {
        let mut writer = ContainerWriter::new(HeaderLayout::Full);
        writer.push_stored(&[1u8; 8]);
        writer.push_stored(&[2u8; 8]);
        writer.push_stored(&[3u8; 8]);
        let mut bytes = writer.finish();
        // Flip one payload byte of the middle block
        bytes[28 + 20] ^= 0x80;

        let report = load(&bytes, &LoadOptions::default());
        assert_eq!(report.blocks.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert!(!report.stopped_early);
        assert_eq!(report.failures[0].ordinal, 1);
        assert!(matches!(
            report.failures[0].error,
            Error::ChecksumMismatch { .. }
        ));
        assert_eq!(report.blocks[1].data, vec![3u8; 8]);
        assert_eq!(report.blocks[1].ordinal, 2);
    }

    #[test]
    fn test_trailing_partial_header_stops_scan() {
        let mut writer = ContainerWriter::new(HeaderLayout::Full);
        writer.push_stored(&[9u8; 4]);
        let mut bytes = writer.finish();
        bytes.extend_from_slice(&[0u8; 7]);

        let report = load(&bytes, &LoadOptions::default());
        assert_eq!(report.blocks.len(), 1);
        assert!(report.stopped_early);
        assert!(matches!(
            report.failures[0].error,
            Error::TruncatedContainer { needed: 20, available: 7, .. }
        ));
    }

    #[test]
    fn test_unknown_flag_is_skipped() {
        let mut writer = ContainerWriter::new(HeaderLayout::Full);
        writer.push_stored(&[5u8; 4]);
        let mut bytes = writer.finish();
        bytes[0] = 7;

        let report = load(&bytes, &LoadOptions::default());
        assert!(report.blocks.is_empty());
        assert!(!report.stopped_early);
        assert!(matches!(
            report.failures[0].error,
            Error::UnsupportedCompression(7)
        ));
    }

    #[test]
    fn test_load_boot_container() {
        let mut writer = ContainerWriter::new(HeaderLayout::Boot);
        writer.push_boot(0x0040_0000, 0, 0, &[0u8; 40], false).unwrap();
        writer.push_boot(0x0050_0000, 0, 1, &[0xAB; 256], true).unwrap();
        let bytes = writer.finish();

        let report = load(&bytes, &LoadOptions::new(HeaderLayout::Boot));
        assert!(report.is_clean());
        assert_eq!(report.blocks.len(), 2);
        assert_eq!(report.blocks[0].serialized_base, Some(0x0040_0000));
        assert_eq!(report.blocks[1].local_id, 1);
        assert_eq!(report.blocks[1].compression, Compression::Inflate);
        assert_eq!(report.blocks[1].data, vec![0xAB; 256]);
    }

    #[test]
    fn test_open_missing_file() {
        let err = open("/nonexistent/hype/fix.sna", &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
