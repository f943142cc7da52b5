//! Hex dump of a virtual range

use anyhow::{Context, Result};
use hype_sna::AddressSource;
use serde::Serialize;

use super::session;
use super::{print_json, Invocation};
use crate::cli::LoadArgs;

#[derive(Serialize)]
struct DumpOutput {
    address: String,
    len: usize,
    bytes: Vec<u8>,
}

/// Handle the dump command
pub fn handle(args: &LoadArgs, address: u32, len: usize, inv: &Invocation) -> Result<()> {
    let loaded = session::open(args, inv)?;
    let session = &loaded.session;

    if inv.json {
        let tail = session
            .tail(address)
            .with_context(|| format!("Cannot dump 0x{:08x}", address))?;
        let bytes = tail[..tail.len().min(len)].to_vec();
        return print_json(&DumpOutput {
            address: format!("0x{:08x}", address),
            len: bytes.len(),
            bytes,
        });
    }

    let dump = session
        .hexdump(address, len)
        .with_context(|| format!("Cannot dump 0x{:08x}", address))?;
    print!("{}", dump);
    Ok(())
}
