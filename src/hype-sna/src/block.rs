//! Loaded blocks
//!
//! A block is one decompressed unit of a container. Its payload is owned by the
//! block for the whole session; relocation rewrites it in place but never
//! resizes it.

use std::fmt;

use serde::Serialize;
use tracing::warn;

use crate::compression::Compression;
use crate::header::BlockHeader;

/// Diagnostic type tag read from the first bytes of a decompressed payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    SceneGraph,
    Dialog,
    PatchTable,
    Texture,
    Unknown,
}

impl BlockKind {
    /// Known signatures and the kind they mark
    const SIGNATURES: &'static [(&'static [u8], BlockKind)] = &[
        (b"SCNE", BlockKind::SceneGraph),
        (b"DLG", BlockKind::Dialog),
        (b"PTCH", BlockKind::PatchTable),
        (b"GPT", BlockKind::PatchTable),
        (b"TXTR", BlockKind::Texture),
        (b"TEX", BlockKind::Texture),
    ];

    /// Infer the kind from the head of a decompressed payload
    pub fn detect(data: &[u8]) -> Self {
        let head = &data[..data.len().min(4)];
        Self::SIGNATURES
            .iter()
            .find(|(sig, _)| head.starts_with(sig))
            .map(|(_, kind)| *kind)
            .unwrap_or(Self::Unknown)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::SceneGraph => "scene_graph",
            Self::Dialog => "dialog",
            Self::PatchTable => "patch_table",
            Self::Texture => "texture",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One decompressed block of a container
#[derive(Debug, Clone, Serialize)]
pub struct Block {
    /// Header index in file order
    pub ordinal: usize,
    pub module: u8,
    pub local_id: u8,
    /// Offset of the block header in the container
    pub file_offset: usize,
    pub compression: Compression,
    pub compressed_size: u32,
    pub decompressed_size: u32,
    pub compressed_checksum: Option<u32>,
    pub decompressed_checksum: Option<u32>,
    /// Base the block occupied when it was serialized (boot containers only)
    pub serialized_base: Option<u32>,
    /// Virtual base assigned by the layout
    pub base: Option<u32>,
    pub kind: BlockKind,
    #[serde(skip)]
    pub raw: Vec<u8>,
    #[serde(skip)]
    pub data: Vec<u8>,
}

impl Block {
    /// Build a block from a validated header and its payloads
    ///
    /// `default_module` is used when the header does not carry ids; the local
    /// id then falls back to the ordinal truncated to a byte. Such blocks past
    /// ordinal 255 have no usable `(module, block)` key, see
    /// [`Block::relocation_key`].
    pub fn new(
        ordinal: usize,
        file_offset: usize,
        header: &BlockHeader,
        compression: Compression,
        raw: Vec<u8>,
        data: Vec<u8>,
        default_module: u8,
    ) -> Self {
        let (module, local_id, serialized_base) = match header.origin {
            Some(origin) => (origin.module, origin.local_id, Some(origin.serialized_base)),
            None => {
                if ordinal > usize::from(u8::MAX) {
                    warn!(
                        ordinal,
                        local_id = ordinal as u8,
                        "Block ordinal exceeds the byte-wide local id; relocation deltas will not apply"
                    );
                }
                (default_module, ordinal as u8, None)
            }
        };

        Self {
            ordinal,
            module,
            local_id,
            file_offset,
            compression,
            compressed_size: header.compressed_size,
            decompressed_size: header.decompressed_size,
            compressed_checksum: header.compressed_checksum,
            decompressed_checksum: header.decompressed_checksum,
            serialized_base,
            base: None,
            kind: BlockKind::detect(&data),
            raw,
            data,
        }
    }

    /// Decompressed length in bytes
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Label used in listings: the kind name, or `block#N` when unknown
    pub fn label(&self) -> String {
        match self.kind {
            BlockKind::Unknown => format!("block#{}", self.ordinal),
            kind => kind.name().to_string(),
        }
    }

    /// Half-open virtual range `[base, base + size)` once laid out
    pub fn range(&self) -> Option<(u32, u64)> {
        self.base
            .map(|base| (base, u64::from(base) + self.size() as u64))
    }

    /// Base used to rebase pointers written against the serialized layout
    ///
    /// Falls back to the assigned base when the container carried none.
    pub fn source_base(&self) -> Option<u32> {
        self.serialized_base.or(self.base)
    }

    /// `(module, local_id)` pair relocation entries are matched against
    ///
    /// `None` when the local id was derived from an ordinal that does not fit
    /// a byte.
    pub fn relocation_key(&self) -> Option<(u8, u8)> {
        if self.serialized_base.is_none() && self.ordinal > usize::from(u8::MAX) {
            return None;
        }
        Some((self.module, self.local_id))
    }
}
