//! SNA block container loader for CPA engine game data
//!
//! SNA containers hold a sequence of independently compressed blocks. Once
//! decompressed and laid out back to back, the blocks form one 32-bit
//! virtual address space in which every record links to the others through
//! raw pointer words.
//!
//! # Format Overview
//!
//! ## Full block header (20 bytes)
//!
//! - Bytes 0-3: Compression flag (0 = stored, 1 = inflate, 2 = LZO1X)
//! - Bytes 4-7: Compressed size
//! - Bytes 8-11: Adler-32 of the compressed payload
//! - Bytes 12-15: Decompressed size
//! - Bytes 16-19: Adler-32 of the decompressed payload
//! - Bytes 20+: Payload
//!
//! ## Boot block header (14 bytes, `fix.sna`)
//!
//! - Bytes 0-3: Serialized base address of the block
//! - Byte 4: Module id
//! - Byte 5: Local block id
//! - Bytes 6-9: Compressed size
//! - Bytes 10-13: Decompressed size (inflated when it differs from the compressed size)
//!
//! # Pipeline
//!
//! ```no_run
//! use hype_sna::{container, AddressSpace, FlatTable, LoadOptions, RelocationTable};
//!
//! # fn main() -> hype_sna::Result<()> {
//! let report = container::open("fix.sna", &LoadOptions::default())?;
//! let mut space = AddressSpace::layout(report.blocks)?;
//! space.apply_patches(&FlatTable::parse(&std::fs::read("fix.ptc")?)?);
//! let session = space.seal(&RelocationTable::default());
//! let character: hype_sna::Character = session.decode(0x1000_0040)?;
//! # let _ = character;
//! # Ok(())
//! # }
//! ```

pub mod block;
pub mod checksum;
pub mod compression;
pub mod container;
pub mod header;
pub mod pointer;
pub mod record;
pub mod relocation;
pub mod space;
pub mod walker;
pub mod writer;

#[cfg(test)]
pub(crate) mod testing;

use std::fmt;

use serde::Serialize;

// Re-export main types
pub use block::{Block, BlockKind};
pub use checksum::{adler32, adler_update};
pub use compression::{decompress, unpack, Compression, Decompressor};
pub use container::{load, BlockFailure, LoadOptions, LoadReport};
pub use header::{BlockHeader, BootOrigin, HeaderLayout};
pub use pointer::{is_pointer, Word};
pub use record::{
    ArrayDecode, Behavior, Brain, Character, DsgVarInfo, DsgVarTable, DsgVarType, DsgVarValue,
    DsgVariable, Macro, Mind, Model, NodeKind, Record, RefKind, SceneGraphNode, Script,
    ScriptNode, ScriptTree, Spawner, StandardGame,
};
pub use relocation::{
    FlatTable, PatchEntry, PatchReport, RelocationEntry, RelocationTable, Relocator, SkippedPatch,
};
pub use space::{AddressSource, AddressSpace, Region, Resolved, Session};
pub use walker::{Edge, RecordView, WalkNode, WalkOptions, Walker};
pub use writer::ContainerWriter;

/// First virtual address handed out by the layout
pub const BASE_ADDRESS: u32 = 0x1000_0000;

/// Lowest 32-bit value treated as a pointer (equal to the lowest possible base)
pub const POINTER_THRESHOLD: u32 = BASE_ADDRESS;

/// Which payload a checksum was computed over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecksumStage {
    Compressed,
    Decompressed,
}

impl fmt::Display for ChecksumStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compressed => write!(f, "compressed"),
            Self::Decompressed => write!(f, "decompressed"),
        }
    }
}

/// Errors from SNA loading, relocation, and record decoding
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{method} decompression failed: {message}")]
    DecompressionFailure {
        method: Compression,
        message: String,
    },

    #[error("Unsupported compression flag: {0}")]
    UnsupportedCompression(u32),

    #[error("Decompressed size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("{stage} checksum mismatch: declared 0x{expected:08x}, computed 0x{actual:08x}")]
    ChecksumMismatch {
        stage: ChecksumStage,
        expected: u32,
        actual: u32,
    },

    #[error("Truncated container at offset 0x{offset:x}: need {needed} bytes, {available} available")]
    TruncatedContainer {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Malformed block header at offset 0x{offset:x}: {reason}")]
    MalformedHeader { offset: usize, reason: &'static str },

    #[error("Block {ordinal} ({size} bytes) does not fit in the address space at 0x{base:08x}")]
    LayoutOverflow { ordinal: usize, base: u32, size: usize },

    #[error("No block owns virtual address 0x{0:08x}")]
    UnresolvedAddress(u32),

    #[error("Truncated {kind} at 0x{address:08x}: need {needed} bytes, block has {available}")]
    TruncatedRecord {
        kind: &'static str,
        address: u32,
        needed: usize,
        available: usize,
    },

    #[error("Malformed patch table: {0}")]
    MalformedPatchTable(String),

    #[error("Patch target 0x{0:08x} is not backed by 4 bytes of any block")]
    UnresolvedPatchTarget(u32),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_constants() {
        assert_eq!(BASE_ADDRESS, 0x1000_0000);
        assert_eq!(POINTER_THRESHOLD, BASE_ADDRESS);
    }

    #[test]
    fn test_error_display() {
        let err = Error::UnsupportedCompression(7);
        assert!(err.to_string().contains("Unsupported compression flag: 7"));

        let err = Error::ChecksumMismatch {
            stage: ChecksumStage::Decompressed,
            expected: 1,
            actual: 2,
        };
        assert!(err.to_string().starts_with("decompressed checksum mismatch"));

        let err = Error::TruncatedContainer {
            offset: 0x20,
            needed: 100,
            available: 4,
        };
        assert!(err.to_string().contains("offset 0x20"));

        let err = Error::UnresolvedAddress(0x1000_0000);
        assert_eq!(err.to_string(), "No block owns virtual address 0x10000000");

        let err = Error::TruncatedRecord {
            kind: "Character",
            address: 0x1000_0010,
            needed: 36,
            available: 8,
        };
        assert!(err.to_string().contains("Truncated Character"));

        let err = Error::MalformedPatchTable("13 bytes".to_string());
        assert!(err.to_string().contains("Malformed patch table"));
    }
}
