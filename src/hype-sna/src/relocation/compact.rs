//! Compact `(module, block, delta)` relocation streams

use std::collections::HashMap;

use byteorder::{ByteOrder, LE};
use serde::Serialize;

use crate::{Error, Result};

/// Bytes per compact entry: module, block, i32 delta, 3 reserved
pub const COMPACT_ENTRY_SIZE: usize = 9;

const TERMINATOR: u8 = 0xFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RelocationEntry {
    pub module: u8,
    pub block: u8,
    pub delta: i32,
}

/// Deltas keyed by `(module, block)`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelocationTable {
    entries: Vec<RelocationEntry>,
}

impl RelocationTable {
    pub fn new(entries: Vec<RelocationEntry>) -> Self {
        Self { entries }
    }

    /// Parse entries until the `0xFF 0xFF` terminator or the end of input
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut entries = Vec::new();
        let mut offset = 0;

        while offset < bytes.len() {
            let rest = &bytes[offset..];
            if rest.len() >= 2 && rest[0] == TERMINATOR && rest[1] == TERMINATOR {
                break;
            }
            if rest.len() < COMPACT_ENTRY_SIZE {
                return Err(Error::MalformedPatchTable(format!(
                    "partial relocation entry at offset {} ({} of {} bytes)",
                    offset,
                    rest.len(),
                    COMPACT_ENTRY_SIZE
                )));
            }

            entries.push(RelocationEntry {
                module: rest[0],
                block: rest[1],
                delta: LE::read_i32(&rest[2..6]),
            });
            offset += COMPACT_ENTRY_SIZE;
        }

        Ok(Self { entries })
    }

    /// Serialize with a trailing terminator
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.entries.len() * COMPACT_ENTRY_SIZE + 2);
        for entry in &self.entries {
            out.push(entry.module);
            out.push(entry.block);
            out.extend_from_slice(&entry.delta.to_le_bytes());
            out.extend_from_slice(&[0u8; 3]);
        }
        out.extend_from_slice(&[TERMINATOR, TERMINATOR]);
        out
    }

    pub fn entries(&self) -> &[RelocationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Delta per `(module, block)`; a repeated pair keeps its last entry
    pub fn deltas(&self) -> HashMap<(u8, u8), i32> {
        self.entries
            .iter()
            .map(|e| ((e.module, e.block), e.delta))
            .collect()
    }

    /// Delta declared for one pair, last entry winning
    pub fn delta(&self, module: u8, block: u8) -> Option<i32> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.module == module && e.block == block)
            .map(|e| e.delta)
    }
}
