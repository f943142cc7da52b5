//! Virtual address space
//!
//! Blocks are laid out back to back from [`BASE_ADDRESS`](crate::BASE_ADDRESS)
//! in file order with no padding. The mutable [`AddressSpace`] is where patch
//! tables are applied; sealing it yields a read-only [`Session`] for decoding,
//! so no record can be read before relocation has finished.

mod region;
mod session;
mod traits;

pub use region::{Region, Resolved};
pub use session::Session;
pub use traits::AddressSource;

use tracing::{debug, warn};

use crate::block::Block;
use crate::relocation::{FlatTable, PatchEntry, PatchReport, RelocationTable, SkippedPatch};
use crate::{Error, Result, BASE_ADDRESS};

/// Exclusive upper bound of the 32-bit address space
const ADDRESS_LIMIT: u64 = 1 << 32;

/// Laid-out blocks, open for patching
#[derive(Debug, Clone, Default)]
pub struct AddressSpace {
    blocks: Vec<Block>,
    regions: Vec<Region>,
}

impl AddressSpace {
    /// Assign each block its base address and build the lookup index
    pub fn layout(blocks: Vec<Block>) -> Result<Self> {
        Self::layout_at(blocks, BASE_ADDRESS)
    }

    /// Lay blocks out from an explicit first base
    ///
    /// Values below [`POINTER_THRESHOLD`](crate::POINTER_THRESHOLD) are never
    /// classified as pointers, so a lower base leaves records unreachable.
    pub fn layout_at(mut blocks: Vec<Block>, base: u32) -> Result<Self> {
        let mut next = u64::from(base);
        let mut regions = Vec::with_capacity(blocks.len());

        for (index, block) in blocks.iter_mut().enumerate() {
            let end = next + block.size() as u64;
            if next >= ADDRESS_LIMIT || end > ADDRESS_LIMIT {
                return Err(Error::LayoutOverflow {
                    ordinal: block.ordinal,
                    base: next.min(u64::from(u32::MAX)) as u32,
                    size: block.size(),
                });
            }

            let start = next as u32;
            block.base = Some(start);
            regions.push(Region {
                start,
                end,
                block: index,
            });
            debug!(
                ordinal = block.ordinal,
                base = format_args!("0x{:08x}", start),
                size = block.size(),
                "Assigned block base"
            );
            next = end;
        }

        Ok(Self { blocks, regions })
    }

    /// Resolve an address for mutation
    pub fn resolve_mut(&mut self, address: u32) -> Result<(&mut Block, usize)> {
        let resolved = self.resolve(address)?;
        Ok((&mut self.blocks[resolved.block], resolved.offset))
    }

    /// Overwrite the 4 bytes at `address`
    ///
    /// Fails with `UnresolvedPatchTarget` unless one block holds all 4 bytes.
    pub fn write_u32(&mut self, address: u32, value: u32) -> Result<()> {
        let (block, offset) = self
            .resolve_mut(address)
            .map_err(|_| Error::UnresolvedPatchTarget(address))?;
        let span = block
            .data
            .get_mut(offset..offset + 4)
            .ok_or(Error::UnresolvedPatchTarget(address))?;
        span.copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Apply every entry of a flat table, skipping the ones that do not resolve
    pub fn apply_patches(&mut self, table: &FlatTable) -> PatchReport {
        let mut report = PatchReport::default();
        for (index, entry) in table.entries().iter().enumerate() {
            self.apply_one(index, *entry, &mut report);
        }
        debug!(
            applied = report.applied,
            skipped = report.skipped.len(),
            "Applied patch table"
        );
        report
    }

    fn apply_one(&mut self, index: usize, entry: PatchEntry, report: &mut PatchReport) {
        match self.write_u32(entry.offset, entry.value) {
            Ok(()) => report.applied += 1,
            Err(error) => {
                warn!(
                    index,
                    offset = format_args!("0x{:08x}", entry.offset),
                    %error,
                    "Skipping patch"
                );
                report.skipped.push(SkippedPatch {
                    index,
                    entry,
                    error,
                });
            }
        }
    }

    /// Parse a flat table and apply it
    ///
    /// A malformed table aborts before any byte is written.
    pub fn apply_patch_bytes(&mut self, bytes: &[u8]) -> Result<PatchReport> {
        let table = FlatTable::parse(bytes)?;
        Ok(self.apply_patches(&table))
    }

    /// Finish the mutable phase
    pub fn seal(self, relocations: &RelocationTable) -> Session {
        Session::new(self.blocks, self.regions, relocations)
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }
}

impl AddressSource for AddressSpace {
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

/// Binary search over regions laid out in ascending order
pub(crate) fn find_sorted(regions: &[Region], address: u32) -> Option<&Region> {
    let idx = regions.partition_point(|r| r.end <= u64::from(address));
    regions.get(idx).filter(|r| r.contains(address))
}
