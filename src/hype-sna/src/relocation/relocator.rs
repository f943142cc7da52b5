//! Deferred delta relocation

use serde::Serialize;
use tracing::{debug, warn};

use super::compact::{RelocationEntry, RelocationTable};
use crate::block::Block;

/// One block's serialized range and how to move pointers out of it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
struct Rebase {
    serialized_start: u32,
    serialized_end: u64,
    base: u32,
    delta: i32,
}

impl Rebase {
    fn contains(&self, address: u32) -> bool {
        address >= self.serialized_start && u64::from(address) < self.serialized_end
    }

    fn apply(&self, address: u32) -> u32 {
        (address - self.serialized_start)
            .wrapping_add(self.base)
            .wrapping_add_signed(self.delta)
    }

    fn is_identity(&self) -> bool {
        self.serialized_start == self.base && self.delta == 0
    }
}

/// Maps pointers written against the serialized layout onto the live layout
///
/// Built once when an address space is sealed; afterwards it is read-only.
#[derive(Debug, Clone, Default)]
pub struct Relocator {
    /// Sorted by serialized start
    ranges: Vec<Rebase>,
    identity: bool,
}

impl Relocator {
    /// Build from laid-out blocks and a delta table
    ///
    /// Returns the relocator and the table entries whose `(module, block)`
    /// pair matched no loaded block.
    pub fn build(blocks: &[Block], table: &RelocationTable) -> (Self, Vec<RelocationEntry>) {
        let deltas = table.deltas();

        let mut ranges: Vec<Rebase> = blocks
            .iter()
            .filter(|b| b.size() > 0)
            .filter_map(|b| {
                let base = b.base?;
                let serialized_start = b.source_base()?;
                Some(Rebase {
                    serialized_start,
                    serialized_end: u64::from(serialized_start) + b.size() as u64,
                    base,
                    delta: b
                        .relocation_key()
                        .and_then(|key| deltas.get(&key).copied())
                        .unwrap_or(0),
                })
            })
            .collect();
        ranges.sort_by_key(|r| r.serialized_start);

        let unmatched: Vec<RelocationEntry> = table
            .entries()
            .iter()
            .filter(|e| {
                !blocks
                    .iter()
                    .any(|b| b.relocation_key() == Some((e.module, e.block)))
            })
            .copied()
            .collect();
        for entry in &unmatched {
            warn!(
                module = entry.module,
                block = entry.block,
                delta = entry.delta,
                "Relocation entry names no loaded block"
            );
        }

        let identity = ranges.iter().all(Rebase::is_identity);
        debug!(ranges = ranges.len(), identity, "Built relocator");

        (Self { ranges, identity }, unmatched)
    }

    /// Relocate a pointer value read from block memory
    ///
    /// Values outside every serialized block range come back unchanged.
    pub fn relocate(&self, address: u32) -> u32 {
        if self.identity {
            return address;
        }
        self.rebase(address).unwrap_or(address)
    }

    /// Relocated value of a raw word inside some block's serialized range
    ///
    /// Among overlapping ranges the one with the latest start wins.
    pub fn rebase(&self, raw: u32) -> Option<u32> {
        let idx = self.ranges.partition_point(|r| r.serialized_start <= raw);
        self.ranges[..idx]
            .iter()
            .rev()
            .find(|r| r.contains(raw))
            .map(|r| r.apply(raw))
    }

    /// True when relocation never changes a value
    pub fn is_identity(&self) -> bool {
        self.identity
    }
}
