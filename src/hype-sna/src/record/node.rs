//! Script node trees
//!
//! A script is a flat run of 8-byte nodes. Each node's indent byte gives its
//! depth; the first node with indent 0 ends the script. The tree is rebuilt
//! with an explicit stack so untrusted input cannot drive recursion.

use std::fmt;

use serde::Serialize;
use tracing::warn;

use super::{hex_u32, FieldReader, Record};
use crate::pointer::Word;
use crate::space::AddressSource;
use crate::Result;

/// Diagnostic label for a node's type byte; opcodes are never interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "code", rename_all = "snake_case")]
pub enum NodeKind {
    Constant,
    Condition,
    Operator,
    Procedure,
    Unknown(u8),
}

impl From<u8> for NodeKind {
    fn from(code: u8) -> Self {
        match code {
            0x01 => Self::Constant,
            0x12 => Self::Condition,
            0x20 => Self::Operator,
            0x23 => Self::Procedure,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant => write!(f, "Constant"),
            Self::Condition => write!(f, "Condition"),
            Self::Operator => write!(f, "Operator"),
            Self::Procedure => write!(f, "Procedure"),
            Self::Unknown(code) => write!(f, "Unknown (0x{:02X})", code),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptNode {
    #[serde(serialize_with = "hex_u32")]
    pub address: u32,
    pub param: Word,
    pub a: u8,
    pub b: u8,
    pub indent: u8,
    pub node_type: u8,
}

impl ScriptNode {
    pub fn kind(&self) -> NodeKind {
        NodeKind::from(self.node_type)
    }
}

impl Record for ScriptNode {
    const KIND: &'static str = "ScriptNode";
    const SIZE: usize = 8;

    fn parse(address: u32, bytes: &[u8]) -> Self {
        let mut r = FieldReader::new(bytes);
        Self {
            address,
            param: r.word(),
            a: r.u8(),
            b: r.u8(),
            indent: r.u8(),
            node_type: r.u8(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptTreeNode {
    pub node: ScriptNode,
    pub kind: NodeKind,
    pub children: Vec<ScriptTreeNode>,
}

impl ScriptTreeNode {
    fn leaf(node: ScriptNode) -> Self {
        Self {
            kind: node.kind(),
            node,
            children: Vec::new(),
        }
    }
}

/// A rebuilt script
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptTree {
    #[serde(serialize_with = "hex_u32")]
    pub address: u32,
    pub roots: Vec<ScriptTreeNode>,
    /// Nodes read, excluding the terminator
    pub node_count: usize,
    /// True when the node cap or the block end was hit before a terminator
    pub truncated: bool,
}

impl ScriptTree {
    /// Nodes in reading order with their depth in the rebuilt tree
    pub fn flatten(&self) -> Vec<(usize, &ScriptTreeNode)> {
        let mut out = Vec::with_capacity(self.node_count);
        let mut stack: Vec<(usize, &ScriptTreeNode)> =
            self.roots.iter().rev().map(|n| (0, n)).collect();
        while let Some((depth, node)) = stack.pop() {
            out.push((depth, node));
            stack.extend(node.children.iter().rev().map(|c| (depth + 1, c)));
        }
        out
    }
}

/// Attach a finished frame to its parent, or to the roots when none is left
fn close_frame(
    stack: &mut Vec<ScriptTreeNode>,
    roots: &mut Vec<ScriptTreeNode>,
    frame: ScriptTreeNode,
) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(frame),
        None => roots.push(frame),
    }
}

/// Read and rebuild the script starting at `address`
pub(crate) fn read_tree<S>(source: &S, address: u32, max_nodes: usize) -> Result<ScriptTree>
where
    S: AddressSource + ?Sized,
{
    let tail = source.tail(address)?;
    let mut roots = Vec::new();
    let mut stack: Vec<ScriptTreeNode> = Vec::new();
    let mut node_count = 0usize;
    let mut terminated = false;

    for (i, chunk) in tail.chunks_exact(ScriptNode::SIZE).enumerate() {
        let node = ScriptNode::parse(address.wrapping_add((i * ScriptNode::SIZE) as u32), chunk);
        if node.indent == 0 {
            terminated = true;
            break;
        }
        if node_count >= max_nodes {
            break;
        }

        // Siblings and shallower nodes close every frame at or below their depth
        while stack
            .last()
            .is_some_and(|top| top.node.indent >= node.indent)
        {
            if let Some(frame) = stack.pop() {
                close_frame(&mut stack, &mut roots, frame);
            }
        }

        stack.push(ScriptTreeNode::leaf(node));
        node_count += 1;
    }

    while let Some(frame) = stack.pop() {
        close_frame(&mut stack, &mut roots, frame);
    }

    if !terminated {
        warn!(
            address = format_args!("0x{:08x}", address),
            nodes = node_count,
            "Script ended without a terminator"
        );
    }

    Ok(ScriptTree {
        address,
        roots,
        node_count,
        truncated: !terminated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::session_from;

    fn node(param: u32, indent: u8, node_type: u8) -> Vec<u8> {
        let mut bytes = param.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0, 0, indent, node_type]);
        bytes
    }

    #[test]
    fn test_node_kinds() {
        assert_eq!(NodeKind::from(0x23), NodeKind::Procedure);
        assert_eq!(NodeKind::from(0x12), NodeKind::Condition);
        assert_eq!(NodeKind::from(0x20), NodeKind::Operator);
        assert_eq!(NodeKind::from(0x01), NodeKind::Constant);
        assert_eq!(NodeKind::from(0x44), NodeKind::Unknown(0x44));
        assert_eq!(NodeKind::Unknown(0x44).to_string(), "Unknown (0x44)");
    }

    #[test]
    fn test_rebuild_tree() {
        // if (cond(a, 5)) proc(); proc2();
        let data: Vec<u8> = [
            node(0, 1, 0x12),
            node(0x1000_0000, 2, 0x20),
            node(5, 3, 0x01),
            node(6, 3, 0x01),
            node(0, 2, 0x23),
            node(0, 1, 0x23),
            node(0, 0, 0x00),
            node(0xFFFF, 1, 0x01),
        ]
        .concat();
        let session = session_from(&[data]);

        let tree = read_tree(&session, 0x1000_0000, 64).unwrap();
        assert!(!tree.truncated);
        assert_eq!(tree.node_count, 6);
        assert_eq!(tree.roots.len(), 2);

        let cond = &tree.roots[0];
        assert_eq!(cond.kind, NodeKind::Condition);
        assert_eq!(cond.children.len(), 2);
        assert_eq!(cond.children[0].kind, NodeKind::Operator);
        assert_eq!(cond.children[0].children.len(), 2);
        assert_eq!(cond.children[0].children[1].node.param, Word::Scalar(6));
        assert_eq!(cond.children[1].kind, NodeKind::Procedure);
        assert_eq!(tree.roots[1].kind, NodeKind::Procedure);

        let flat = tree.flatten();
        let depths: Vec<usize> = flat.iter().map(|(d, _)| *d).collect();
        assert_eq!(depths, vec![0, 1, 2, 2, 1, 0]);
        assert_eq!(flat[2].1.node.address, 0x1000_0010);
    }

    #[test]
    fn test_unterminated_script_stops_at_block_end() {
        let data: Vec<u8> = [node(0, 1, 0x23), node(0, 2, 0x01), vec![1, 2, 3]].concat();
        let session = session_from(&[data]);
        let tree = read_tree(&session, 0x1000_0000, 64).unwrap();
        assert!(tree.truncated);
        assert_eq!(tree.node_count, 2);
        assert_eq!(tree.roots[0].children.len(), 1);
    }

    #[test]
    fn test_node_cap() {
        let data: Vec<u8> = (0..10).flat_map(|_| node(0, 1, 0x23)).collect();
        let session = session_from(&[data]);
        let tree = read_tree(&session, 0x1000_0000, 4).unwrap();
        assert!(tree.truncated);
        assert_eq!(tree.node_count, 4);
        assert_eq!(tree.roots.len(), 4);
    }

    #[test]
    fn test_deep_indent_jump() {
        // A child may sit several levels deeper than its parent
        let data: Vec<u8> = [node(0, 1, 0x23), node(0, 9, 0x01), node(0, 4, 0x01), node(0, 0, 0)].concat();
        let session = session_from(&[data]);
        let tree = read_tree(&session, 0x1000_0000, 64).unwrap();
        assert_eq!(tree.roots.len(), 1);
        assert_eq!(tree.roots[0].children.len(), 2);
    }
}
