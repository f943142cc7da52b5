//! Single-hop record decoding
//!
//! Decodes the record at an address without following its pointers. Arrays
//! are decoded with `--count`; a run that ends at the block boundary prints
//! what was decoded plus the truncation.

use std::fmt::Debug;

use anyhow::{Context, Result};
use hype_sna::{
    Behavior, Brain, Character, DsgVarInfo, DsgVarTable, Macro, Mind, Model, Record,
    SceneGraphNode, Script, ScriptNode, ScriptTree, Session, Spawner, StandardGame,
};
use serde::Serialize;
use tracing::warn;

use super::session;
use super::{print_json, Invocation};
use crate::cli::{LoadArgs, RecordKind};

#[derive(Serialize)]
struct ArrayOutput<'a, T> {
    address: String,
    requested: usize,
    decoded: usize,
    items: &'a [T],
    #[serde(skip_serializing_if = "Option::is_none")]
    truncated: Option<String>,
}

/// Handle the decode command
pub fn handle(
    args: &LoadArgs,
    kind: RecordKind,
    address: u32,
    count: Option<usize>,
    inv: &Invocation,
) -> Result<()> {
    let loaded = session::open(args, inv)?;
    let session = &loaded.session;

    match kind {
        RecordKind::Character => fixed::<Character>(session, address, count, inv.json),
        RecordKind::StandardGame => fixed::<StandardGame>(session, address, count, inv.json),
        RecordKind::Brain => fixed::<Brain>(session, address, count, inv.json),
        RecordKind::Mind => fixed::<Mind>(session, address, count, inv.json),
        RecordKind::Model => fixed::<Model>(session, address, count, inv.json),
        RecordKind::Behavior => fixed::<Behavior>(session, address, count, inv.json),
        RecordKind::Macro => fixed::<Macro>(session, address, count, inv.json),
        RecordKind::Script => fixed::<Script>(session, address, count, inv.json),
        RecordKind::ScriptNode => fixed::<ScriptNode>(session, address, count, inv.json),
        RecordKind::DsgVarInfo => fixed::<DsgVarInfo>(session, address, count, inv.json),
        RecordKind::SceneGraph => fixed::<SceneGraphNode>(session, address, count, inv.json),
        RecordKind::Spawner => fixed::<Spawner>(session, address, count, inv.json),
        RecordKind::ScriptTree => {
            ignore_count(kind, count);
            let tree = session
                .decode_script_tree(address, inv.walk.max_script_nodes)
                .with_context(|| format!("Failed to decode script at 0x{:08x}", address))?;
            if inv.json {
                print_json(&tree)
            } else {
                print_script_tree(&tree);
                Ok(())
            }
        }
        RecordKind::DsgVars => {
            ignore_count(kind, count);
            let table = session
                .decode_dsg_vars(address)
                .with_context(|| format!("Failed to decode variables at 0x{:08x}", address))?;
            if inv.json {
                print_json(&table)
            } else {
                print_dsg_table(&table);
                Ok(())
            }
        }
        RecordKind::Spawners => {
            ignore_count(kind, count);
            let spawners = session
                .spawners(address)
                .with_context(|| format!("Failed to read spawners at 0x{:08x}", address))?;
            if inv.json {
                print_json(&spawners)
            } else {
                for s in &spawners {
                    println!("0x{:08x}  tag {:>4}  perso {}", s.address, s.tag, s.perso);
                }
                println!("{} spawners", spawners.len());
                Ok(())
            }
        }
    }
}

fn ignore_count(kind: RecordKind, count: Option<usize>) {
    if count.is_some() {
        warn!(?kind, "--count has no effect for this kind");
    }
}

/// Decode one fixed-size record, or `count` of them back to back
fn fixed<T>(session: &Session, address: u32, count: Option<usize>, json: bool) -> Result<()>
where
    T: Record + Serialize + Debug,
{
    let Some(count) = count else {
        let record: T = session
            .decode(address)
            .with_context(|| format!("Failed to decode {} at 0x{:08x}", T::KIND, address))?;
        if json {
            return print_json(&record);
        }
        println!("{:#?}", record);
        return Ok(());
    };

    let array = session
        .decode_array::<T>(address, count)
        .with_context(|| format!("Failed to decode {} array at 0x{:08x}", T::KIND, address))?;
    let output = ArrayOutput {
        address: format!("0x{:08x}", array.address),
        requested: array.requested,
        decoded: array.items.len(),
        items: &array.items,
        truncated: array.truncated.as_ref().map(|e| e.to_string()),
    };

    if json {
        return print_json(&output);
    }

    for (i, item) in output.items.iter().enumerate() {
        println!("[{}] {:#?}", i, item);
    }
    if let Some(reason) = &output.truncated {
        println!(
            "Truncated after {} of {} {} records: {}",
            output.decoded,
            output.requested,
            T::KIND,
            reason
        );
    }
    Ok(())
}

fn print_script_tree(tree: &ScriptTree) {
    println!(
        "Script at 0x{:08x}: {} nodes{}",
        tree.address,
        tree.node_count,
        if tree.truncated { " (truncated)" } else { "" }
    );
    for (depth, entry) in tree.flatten() {
        println!(
            "{:indent$}{} {}  [0x{:08x}]",
            "",
            entry.kind,
            entry.node.param,
            entry.node.address,
            indent = 2 + depth * 2
        );
    }
}

fn print_dsg_table(table: &DsgVarTable) {
    println!(
        "Variables at 0x{:08x}: {} declared, {} read{}",
        table.address,
        table.count,
        table.variables.len(),
        if table.truncated { " (truncated)" } else { "" }
    );
    for var in &table.variables {
        let kind = match var.info.kind() {
            Ok(kind) => format!("{:?}", kind),
            Err(tag) => format!("tag {}", tag),
        };
        let value = match &var.value {
            Some(value) => format!("{:?}", value),
            None => "<outside block>".to_string(),
        };
        println!(
            "  [{:>3}] {:<14} +0x{:04x}  {}",
            var.index, kind, var.info.offset, value
        );
    }
}
