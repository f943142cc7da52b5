//! Relocation and patch tables
//!
//! Two encodings exist:
//! - [`FlatTable`]: consecutive `(u32 offset, u32 value)` pairs, each an
//!   absolute overwrite of the 4 bytes at a virtual address
//! - [`RelocationTable`]: 9-byte `(module, block, i32 delta)` entries ending
//!   at a `0xFF 0xFF` module/block pair, applied lazily through a
//!   [`Relocator`] whenever a pointer is followed

mod compact;
mod flat;
mod relocator;

pub use compact::{RelocationEntry, RelocationTable, COMPACT_ENTRY_SIZE};
pub use flat::{FlatTable, PatchEntry, FLAT_ENTRY_SIZE};
pub use relocator::Relocator;

use serde::Serialize;

use crate::Error;

/// A patch that could not be applied
#[derive(Debug)]
pub struct SkippedPatch {
    /// Position of the entry in its table
    pub index: usize,
    pub entry: PatchEntry,
    pub error: Error,
}

/// Outcome of applying a flat patch table
#[derive(Debug, Default)]
pub struct PatchReport {
    pub applied: usize,
    pub skipped: Vec<SkippedPatch>,
}

impl PatchReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }

    /// Fold another report into this one
    pub fn merge(&mut self, other: PatchReport) {
        self.applied += other.applied;
        self.skipped.extend(other.skipped);
    }

    /// Serializable summary for CLI output
    pub fn summary(&self) -> PatchSummary {
        PatchSummary {
            applied: self.applied,
            skipped: self
                .skipped
                .iter()
                .map(|s| SkippedSummary {
                    index: s.index,
                    offset: s.entry.offset,
                    error: s.error.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PatchSummary {
    pub applied: usize,
    pub skipped: Vec<SkippedSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedSummary {
    pub index: usize,
    pub offset: u32,
    pub error: String,
}
