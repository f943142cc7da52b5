//! Address resolution

use anyhow::Result;
use hype_sna::{AddressSource, Resolved, Session};
use serde::Serialize;

use super::session;
use super::{print_json, Invocation};
use crate::cli::LoadArgs;

#[derive(Serialize)]
struct Resolution {
    address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved: Option<Resolved>,
    #[serde(skip_serializing_if = "Option::is_none")]
    block: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn resolve_one(session: &Session, address: u32) -> Resolution {
    match session.resolve(address) {
        Ok(resolved) => Resolution {
            address: format!("0x{:08x}", address),
            block: session.blocks().get(resolved.block).map(|b| b.label()),
            resolved: Some(resolved),
            error: None,
        },
        Err(e) => Resolution {
            address: format!("0x{:08x}", address),
            resolved: None,
            block: None,
            error: Some(e.to_string()),
        },
    }
}

/// Handle the resolve command
pub fn handle(args: &LoadArgs, addresses: &[u32], inv: &Invocation) -> Result<()> {
    let loaded = session::open(args, inv)?;
    let results: Vec<Resolution> = addresses
        .iter()
        .map(|&a| resolve_one(&loaded.session, a))
        .collect();

    if inv.json {
        return print_json(&results);
    }

    for r in &results {
        match (&r.resolved, &r.error) {
            (Some(res), _) => println!(
                "{} -> block {} ({}) + 0x{:x}, {} bytes to block end",
                r.address,
                res.block,
                r.block.as_deref().unwrap_or("?"),
                res.offset,
                res.remaining
            ),
            (None, Some(error)) => println!("{} -> {}", r.address, error),
            (None, None) => println!("{} -> unresolved", r.address),
        }
    }

    Ok(())
}
