//! Sealed, read-only address space

use std::fmt::Write as _;

use super::{find_sorted, AddressSource, Region};
use crate::block::Block;
use crate::pointer::Word;
use crate::record::{self, ArrayDecode, DsgVarTable, Record, ScriptTree, Spawner};
use crate::relocation::{RelocationEntry, RelocationTable, Relocator};
use crate::Result;

/// Word index of the boot snapshot pointer in the first block
const BOOT_POINTER_WORD: usize = 8;

/// Longest name read through a string pointer
const MAX_NAME_LEN: usize = 256;

/// A fully patched address space, open for decoding
///
/// Nothing here mutates block memory, so a session can be shared across
/// threads for concurrent decoding.
#[derive(Debug, Clone)]
pub struct Session {
    blocks: Vec<Block>,
    regions: Vec<Region>,
    relocator: Relocator,
    unmatched: Vec<RelocationEntry>,
}

impl Session {
    pub(super) fn new(blocks: Vec<Block>, regions: Vec<Region>, table: &RelocationTable) -> Self {
        let (relocator, unmatched) = Relocator::build(&blocks, table);
        Self {
            blocks,
            regions,
            relocator,
            unmatched,
        }
    }

    /// Apply deferred delta relocation to a pointer value
    pub fn relocate(&self, address: u32) -> u32 {
        self.relocator.relocate(address)
    }

    /// Target of a pointer word after relocation; `None` for scalars
    ///
    /// A raw value inside some block's serialized range is relocated first
    /// and classified afterwards, so boot containers serialized below the
    /// pointer threshold still resolve.
    pub fn follow(&self, word: Word) -> Option<u32> {
        let raw = word.raw();
        if raw == 0 {
            return None;
        }
        match self.relocator.rebase(raw) {
            Some(target) => Word::classify(target).pointer(),
            None => word.pointer(),
        }
    }

    /// Name behind a string pointer, cut at the first NUL
    pub fn read_name(&self, word: Word) -> Result<Option<String>> {
        match self.follow(word) {
            Some(address) => self.read_cstring(address, MAX_NAME_LEN).map(Some),
            None => Ok(None),
        }
    }

    /// Relocation entries whose `(module, block)` matched no block
    pub fn unmatched_relocations(&self) -> &[RelocationEntry] {
        &self.unmatched
    }

    /// Decode one record at `address`
    pub fn decode<T: Record>(&self, address: u32) -> Result<T> {
        record::decode(self, address)
    }

    /// Decode `count` consecutive records, truncating at the block end
    pub fn decode_array<T: Record>(&self, address: u32, count: usize) -> Result<ArrayDecode<T>> {
        record::decode_array(self, address, count)
    }

    /// Decode a dynamic variable table with its values
    pub fn decode_dsg_vars(&self, address: u32) -> Result<DsgVarTable> {
        record::read_dsg_table(self, address)
    }

    /// Rebuild the script node tree starting at `address`
    pub fn decode_script_tree(&self, address: u32, max_nodes: usize) -> Result<ScriptTree> {
        record::read_script_tree(self, address, max_nodes)
    }

    /// Spawner entries of a spawner list
    pub fn spawners(&self, address: u32) -> Result<Vec<Spawner>> {
        record::read_spawners(self, address)
    }

    /// The fixed-snapshot boot pointer stored in the first block
    pub fn boot_pointer(&self) -> Option<Word> {
        let first = self.blocks.first()?;
        let start = BOOT_POINTER_WORD * 4;
        let bytes = first.data.get(start..start + 4)?;
        Some(Word::classify(u32::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3],
        ])))
    }

    /// Hex dump of up to `len` bytes starting at `address`
    ///
    /// The dump stops at the end of the owning block.
    pub fn hexdump(&self, address: u32, len: usize) -> Result<String> {
        let tail = self.tail(address)?;
        let bytes = &tail[..tail.len().min(len)];
        let mut out = String::new();

        for (i, line) in bytes.chunks(16).enumerate() {
            let line_address = address.wrapping_add((i * 16) as u32);
            let _ = write!(out, "{:08x}:", line_address);
            for j in 0..16 {
                match line.get(j) {
                    Some(b) => {
                        let _ = write!(out, " {:02x}", b);
                    }
                    None => out.push_str("   "),
                }
            }
            out.push_str("  |");
            out.extend(line.iter().map(|&b| {
                if b.is_ascii_graphic() || b == b' ' {
                    b as char
                } else {
                    '.'
                }
            }));
            out.push_str("|\n");
        }

        Ok(out)
    }
}

impl AddressSource for Session {
    fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    fn regions(&self) -> &[Region] {
        &self.regions
    }

    fn find_region(&self, address: u32) -> Option<&Region> {
        find_sorted(&self.regions, address)
    }
}
