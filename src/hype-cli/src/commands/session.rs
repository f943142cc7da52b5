//! Opening a container into a sealed session
//!
//! Every loading command goes through [`open`]: map the file, scan its
//! blocks, lay them out, apply the patch files in order, then seal with the
//! optional relocation table.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hype_sna::relocation::PatchSummary;
use hype_sna::{container, AddressSpace, LoadReport, PatchReport, RelocationTable, Session};
use memmap2::Mmap;
use serde::Serialize;
use tracing::{debug, info};

use super::Invocation;
use crate::cli::LoadArgs;

/// A block that failed to load, flattened for output
#[derive(Debug, Clone, Serialize)]
pub struct FailureSummary {
    pub ordinal: usize,
    pub offset: usize,
    pub error: String,
}

/// A container opened for decoding
pub struct Loaded {
    pub path: PathBuf,
    pub session: Session,
    pub failures: Vec<FailureSummary>,
    pub stopped_early: bool,
    /// Container bytes covered by the scan
    pub consumed: usize,
    pub file_len: usize,
    pub patches: PatchReport,
}

impl Loaded {
    pub fn patch_summary(&self) -> PatchSummary {
        self.patches.summary()
    }
}

fn map_file(path: &Path) -> Result<Mmap> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    // SAFETY: the map is read-only and dropped before this command returns
    unsafe { Mmap::map(&file) }.with_context(|| format!("Failed to mmap {}", path.display()))
}

/// Load, lay out, patch, and seal the container named by `args`
pub fn open(args: &LoadArgs, inv: &Invocation) -> Result<Loaded> {
    let path = inv.config.resolve_input(&args.file);
    let mmap = map_file(&path)?;
    let file_len = mmap.len();

    let LoadReport {
        blocks,
        failures,
        stopped_early,
        consumed,
    } = container::load(&mmap, &inv.load);
    drop(mmap);

    info!(
        path = %path.display(),
        blocks = blocks.len(),
        failures = failures.len(),
        layout = %inv.load.layout,
        "Loaded container"
    );

    let failures = failures
        .into_iter()
        .map(|f| FailureSummary {
            ordinal: f.ordinal,
            offset: f.offset,
            error: f.error.to_string(),
        })
        .collect();

    let mut space = AddressSpace::layout(blocks)
        .with_context(|| format!("Failed to lay out blocks of {}", path.display()))?;

    let mut patches = PatchReport::default();
    for patch_path in &args.patches {
        let bytes = fs::read(patch_path)
            .with_context(|| format!("Failed to read patch table {}", patch_path.display()))?;
        let report = space
            .apply_patch_bytes(&bytes)
            .with_context(|| format!("Failed to apply patch table {}", patch_path.display()))?;
        debug!(
            path = %patch_path.display(),
            applied = report.applied,
            skipped = report.skipped.len(),
            "Applied patch file"
        );
        patches.merge(report);
    }

    let relocations = match &args.relocations {
        Some(reloc_path) => {
            let bytes = fs::read(reloc_path).with_context(|| {
                format!("Failed to read relocation table {}", reloc_path.display())
            })?;
            RelocationTable::parse(&bytes).with_context(|| {
                format!("Failed to parse relocation table {}", reloc_path.display())
            })?
        }
        None => RelocationTable::default(),
    };

    Ok(Loaded {
        path,
        session: space.seal(&relocations),
        failures,
        stopped_early,
        consumed,
        file_len,
        patches,
    })
}
