//! Transitive record walks

use anyhow::{bail, Result};
use hype_sna::{WalkNode, Walker};
use tracing::info;

use super::session;
use super::{print_json, Invocation};
use crate::cli::LoadArgs;

/// Walk parameters from the command line
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkArgs {
    pub address: Option<u32>,
    pub scene: bool,
    pub max_depth: Option<usize>,
    pub max_nodes: Option<usize>,
}

/// Handle the walk command
pub fn handle(args: &LoadArgs, walk: WalkArgs, inv: &Invocation) -> Result<()> {
    let loaded = session::open(args, inv)?;
    let session = &loaded.session;

    let address = match walk.address {
        Some(address) => address,
        None => match session.boot_pointer().and_then(|w| session.follow(w)) {
            Some(address) => {
                info!(address = format_args!("0x{:08x}", address), "Starting at boot pointer");
                address
            }
            None => bail!("No start address given and the container has no boot pointer"),
        },
    };

    let mut options = inv.walk;
    if let Some(depth) = walk.max_depth {
        options.max_depth = depth;
    }
    if let Some(nodes) = walk.max_nodes {
        options.max_nodes = nodes;
    }

    let mut walker = Walker::new(session, options);
    let root = if walk.scene {
        walker.walk_scene(address)
    } else {
        walker.walk_character(address)
    };

    if inv.json {
        return print_json(&root);
    }

    let mut out = String::new();
    render(&root, None, 0, &mut out);
    print!("{}", out);
    println!("{} records decoded", root.record_count());
    Ok(())
}

/// Indented text rendering of a walk tree
fn render(node: &WalkNode, label: Option<&str>, depth: usize, out: &mut String) {
    let prefix = match label {
        Some(label) => format!("{:indent$}{}: ", "", label, indent = depth * 2),
        None => String::new(),
    };
    let head = format!("{} @ 0x{:08x}", node.kind(), node.address());
    let line = match node {
        WalkNode::Record {
            name: Some(name), ..
        } => format!("{} \"{}\"", head, name),
        WalkNode::Record { .. } => head,
        WalkNode::Visited { cycle: true, .. } => format!("{} (cycle)", head),
        WalkNode::Visited { cycle: false, .. } => format!("{} (seen)", head),
        WalkNode::Failed { error, .. } => format!("{} (failed: {})", head, error),
        WalkNode::DepthLimit { .. } => format!("{} (depth limit)", head),
        WalkNode::BudgetExhausted { .. } => format!("{} (budget exhausted)", head),
    };
    out.push_str(&prefix);
    out.push_str(&line);
    out.push('\n');

    for edge in node.children() {
        render(&edge.node, Some(&edge.label), depth + 1, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hype_sna::{Mind, RecordView, Word};

    #[test]
    fn test_render_markers() {
        let node = WalkNode::Visited {
            address: 0x1000_0000,
            kind: "Character",
            cycle: true,
        };
        let mut out = String::new();
        render(&node, Some("var[3]"), 2, &mut out);
        assert_eq!(out, "    var[3]: Character @ 0x10000000 (cycle)\n");

        let failed = WalkNode::Failed {
            address: 0x2000_0000,
            kind: "Brain",
            error: "No block owns virtual address 0x20000000".to_string(),
        };
        let mut out = String::new();
        render(&failed, None, 0, &mut out);
        assert!(out.starts_with("Brain @ 0x20000000 (failed: No block"));
    }

    #[test]
    fn test_render_named_record() {
        let mind = Mind {
            address: 0x1000_0050,
            ai_model: Word::Scalar(0),
            intelligence_normal: Word::Scalar(0),
            intelligence_reflex: Word::Scalar(0),
            dsg_mem: Word::Scalar(0),
            name: Word::Pointer(0x1000_0070),
            flags: [0; 4],
        };
        let node = WalkNode::Record {
            address: 0x1000_0050,
            name: Some("boot".to_string()),
            record: RecordView::Mind(mind),
            children: Vec::new(),
        };
        let mut out = String::new();
        render(&node, Some("mind"), 1, &mut out);
        assert_eq!(out, "  mind: Mind @ 0x10000050 \"boot\"\n");
    }
}
