//! Block listing

use anyhow::Result;
use hype_sna::relocation::PatchSummary;
use hype_sna::{AddressSource, Block, RelocationEntry, Word};
use serde::Serialize;

use super::session::{self, FailureSummary};
use super::{print_json, Invocation};
use crate::cli::LoadArgs;

#[derive(Serialize)]
struct BlocksOutput<'a> {
    file: String,
    blocks: &'a [Block],
    failures: &'a [FailureSummary],
    stopped_early: bool,
    consumed: usize,
    file_len: usize,
    patches: PatchSummary,
    unmatched_relocations: &'a [RelocationEntry],
    boot_pointer: Option<Word>,
}

/// Handle the blocks command
pub fn handle(args: &LoadArgs, inv: &Invocation) -> Result<()> {
    let loaded = session::open(args, inv)?;
    let session = &loaded.session;

    if inv.json {
        return print_json(&BlocksOutput {
            file: loaded.path.display().to_string(),
            blocks: session.blocks(),
            failures: &loaded.failures,
            stopped_early: loaded.stopped_early,
            consumed: loaded.consumed,
            file_len: loaded.file_len,
            patches: loaded.patch_summary(),
            unmatched_relocations: session.unmatched_relocations(),
            boot_pointer: session.boot_pointer(),
        });
    }

    println!("{} ({} layout)", loaded.path.display(), inv.load.layout);
    println!();
    println!(
        "{:>4}  {:>3}  {:>3}  {:<12}  {:<10}  {:>10}  {:>10}  {}",
        "#", "mod", "id", "tag", "base", "packed", "size", "codec"
    );
    for block in session.blocks() {
        println!("{}", block_row(block));
    }

    println!();
    println!(
        "{} blocks, {} of {} bytes scanned",
        session.blocks().len(),
        loaded.consumed,
        loaded.file_len
    );
    if let Some(word) = session.boot_pointer() {
        println!("Boot pointer: {}", word);
    }

    if !loaded.failures.is_empty() {
        println!();
        println!("Load failures:");
        for failure in &loaded.failures {
            println!(
                "  block {} at 0x{:x}: {}",
                failure.ordinal, failure.offset, failure.error
            );
        }
        if loaded.stopped_early {
            println!("  (scan stopped early)");
        }
    }

    let patches = loaded.patch_summary();
    if patches.applied > 0 || !patches.skipped.is_empty() {
        println!();
        println!(
            "Patches: {} applied, {} skipped",
            patches.applied,
            patches.skipped.len()
        );
        for skipped in &patches.skipped {
            println!(
                "  entry {} at 0x{:08x}: {}",
                skipped.index, skipped.offset, skipped.error
            );
        }
    }

    for entry in session.unmatched_relocations() {
        println!(
            "Unmatched relocation: module {} block {} delta {}",
            entry.module, entry.block, entry.delta
        );
    }

    Ok(())
}

fn block_row(block: &Block) -> String {
    let base = block
        .base
        .map(|b| format!("0x{:08x}", b))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{:>4}  {:>3}  {:>3}  {:<12}  {:<10}  {:>10}  {:>10}  {}",
        block.ordinal,
        block.module,
        block.local_id,
        block.label(),
        base,
        block.compressed_size,
        block.decompressed_size,
        block.compression
    )
}
