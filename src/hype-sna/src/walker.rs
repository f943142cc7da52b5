//! Graph walker
//!
//! Transitive traversal over decoded records. Pointers may form cycles (a
//! variable table referencing the character that owns it), so every walk
//! tracks visited `(address, kind)` pairs and caps depth and node count.
//! A revisit yields a marker node instead of decoding again.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::pointer::Word;
use crate::record::hex_u32;
use crate::record::{
    Behavior, Brain, Character, DsgVarTable, Macro, Mind, Model, Record, SceneGraphNode, Script,
    ScriptTree, Spawner, StandardGame,
};
use crate::space::Session;
use crate::Result;

const DSG_TABLE_KIND: &str = "DsgVarTable";
const SCRIPT_TREE_KIND: &str = "ScriptTree";

/// Traversal limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkOptions {
    /// Deepest edge distance from the start record that is still decoded
    pub max_depth: usize,
    /// Records decoded per walk
    pub max_nodes: usize,
    /// Nodes read per script tree
    pub max_script_nodes: usize,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            max_depth: 16,
            max_nodes: 10_000,
            max_script_nodes: 4096,
        }
    }
}

/// A decoded record as it appears in a walk
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "fields", rename_all = "snake_case")]
pub enum RecordView {
    Character(Character),
    StandardGame(StandardGame),
    Brain(Brain),
    Mind(Mind),
    Model(Model),
    Behavior(Behavior),
    Macro(Macro),
    Script(Script),
    ScriptTree(ScriptTree),
    DsgVars(DsgVarTable),
    SceneGraph(SceneGraphNode),
    Spawner(Spawner),
}

impl RecordView {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Character(_) => Character::KIND,
            Self::StandardGame(_) => StandardGame::KIND,
            Self::Brain(_) => Brain::KIND,
            Self::Mind(_) => Mind::KIND,
            Self::Model(_) => Model::KIND,
            Self::Behavior(_) => Behavior::KIND,
            Self::Macro(_) => Macro::KIND,
            Self::Script(_) => Script::KIND,
            Self::ScriptTree(_) => SCRIPT_TREE_KIND,
            Self::DsgVars(_) => DSG_TABLE_KIND,
            Self::SceneGraph(_) => SceneGraphNode::KIND,
            Self::Spawner(_) => Spawner::KIND,
        }
    }

    /// Pointer to the record's name string
    pub fn name_word(&self) -> Option<Word> {
        match self {
            Self::Mind(mind) => Some(mind.name),
            Self::Model(model) => Some(model.name),
            Self::Behavior(behavior) => Some(behavior.name),
            _ => None,
        }
    }
}

/// One node of a walk tree
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum WalkNode {
    Record {
        #[serde(serialize_with = "hex_u32")]
        address: u32,
        /// Resolved name string, for records that carry one
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        record: RecordView,
        children: Vec<Edge>,
    },
    /// Already decoded earlier in this walk; `cycle` when it is an ancestor
    Visited {
        #[serde(serialize_with = "hex_u32")]
        address: u32,
        kind: &'static str,
        cycle: bool,
    },
    /// Decoding failed; the branch is pruned
    Failed {
        #[serde(serialize_with = "hex_u32")]
        address: u32,
        kind: &'static str,
        error: String,
    },
    DepthLimit {
        #[serde(serialize_with = "hex_u32")]
        address: u32,
        kind: &'static str,
    },
    /// The walk's node budget ran out
    BudgetExhausted {
        #[serde(serialize_with = "hex_u32")]
        address: u32,
        kind: &'static str,
    },
}

impl WalkNode {
    pub fn address(&self) -> u32 {
        match self {
            Self::Record { address, .. }
            | Self::Visited { address, .. }
            | Self::Failed { address, .. }
            | Self::DepthLimit { address, .. }
            | Self::BudgetExhausted { address, .. } => *address,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Record { record, .. } => record.kind(),
            Self::Visited { kind, .. }
            | Self::Failed { kind, .. }
            | Self::DepthLimit { kind, .. }
            | Self::BudgetExhausted { kind, .. } => *kind,
        }
    }

    /// Resolved name of a decoded record
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Record { name, .. } => name.as_deref(),
            _ => None,
        }
    }

    pub fn children(&self) -> &[Edge] {
        match self {
            Self::Record { children, .. } => children,
            _ => &[],
        }
    }

    /// Child reached through the edge with this label
    pub fn child(&self, label: &str) -> Option<&WalkNode> {
        self.children()
            .iter()
            .find(|e| e.label == label)
            .map(|e| &e.node)
    }

    /// Every node of the tree in depth-first order
    pub fn iter(&self) -> impl Iterator<Item = &WalkNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children().iter().rev().map(|e| &e.node));
            Some(node)
        })
    }

    /// Number of decoded records in the tree
    pub fn record_count(&self) -> usize {
        self.iter()
            .filter(|n| matches!(n, Self::Record { .. }))
            .count()
    }
}

/// A labeled pointer edge
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub label: String,
    pub node: WalkNode,
}

impl Edge {
    fn new(label: impl Into<String>, node: WalkNode) -> Self {
        Self {
            label: label.into(),
            node,
        }
    }
}

/// Walks the record graph of one session
pub struct Walker<'a> {
    session: &'a Session,
    options: WalkOptions,
    visited: HashSet<(u32, &'static str)>,
    path: Vec<(u32, &'static str)>,
    nodes: usize,
}

impl<'a> Walker<'a> {
    pub fn new(session: &'a Session, options: WalkOptions) -> Self {
        Self {
            session,
            options,
            visited: HashSet::new(),
            path: Vec::new(),
            nodes: 0,
        }
    }

    fn reset(&mut self) {
        self.visited.clear();
        self.path.clear();
        self.nodes = 0;
    }

    /// Walk everything reachable from a character
    pub fn walk_character(&mut self, address: u32) -> WalkNode {
        self.reset();
        self.character(address, 0)
    }

    /// Walk a scene graph root, its spawners and their characters
    pub fn walk_scene(&mut self, address: u32) -> WalkNode {
        self.reset();
        self.scene(address, 0)
    }

    /// Check limits before decoding; returns a marker node when the walk must stop here
    fn gate(&mut self, address: u32, kind: &'static str, depth: usize) -> Option<WalkNode> {
        if self.visited.contains(&(address, kind)) {
            let cycle = self.path.contains(&(address, kind));
            if cycle {
                warn!(
                    address = format_args!("0x{:08x}", address),
                    kind, "Cycle in record graph"
                );
            } else {
                debug!(address = format_args!("0x{:08x}", address), kind, "Already visited");
            }
            return Some(WalkNode::Visited {
                address,
                kind,
                cycle,
            });
        }
        if depth > self.options.max_depth {
            return Some(WalkNode::DepthLimit { address, kind });
        }
        if self.nodes >= self.options.max_nodes {
            return Some(WalkNode::BudgetExhausted { address, kind });
        }
        self.visited.insert((address, kind));
        self.nodes += 1;
        None
    }

    fn failed(address: u32, kind: &'static str, error: crate::Error) -> WalkNode {
        warn!(
            address = format_args!("0x{:08x}", address),
            kind,
            %error,
            "Pruning branch"
        );
        WalkNode::Failed {
            address,
            kind,
            error: error.to_string(),
        }
    }

    /// Gate, decode, then expand children with the ancestor path extended
    fn visit<T, D, E>(
        &mut self,
        address: u32,
        kind: &'static str,
        depth: usize,
        decode: D,
        expand: E,
    ) -> WalkNode
    where
        T: Into<RecordView>,
        D: FnOnce(&Session) -> Result<T>,
        E: FnOnce(&mut Self, &T, usize) -> Vec<Edge>,
    {
        if let Some(marker) = self.gate(address, kind, depth) {
            return marker;
        }
        let record = match decode(self.session) {
            Ok(record) => record,
            Err(error) => return Self::failed(address, kind, error),
        };

        self.path.push((address, kind));
        let children = expand(self, &record, depth + 1);
        self.path.pop();

        let record: RecordView = record.into();
        let name = record.name_word().and_then(|word| self.record_name(address, word));
        WalkNode::Record {
            address,
            name,
            record,
            children,
        }
    }

    /// Resolve a name pointer; unreadable names are dropped
    fn record_name(&self, address: u32, word: Word) -> Option<String> {
        match self.session.read_name(word) {
            Ok(name) => name,
            Err(error) => {
                debug!(
                    address = format_args!("0x{:08x}", address),
                    %error,
                    "Unreadable record name"
                );
                None
            }
        }
    }

    /// Visit a fixed-size record
    fn record<T, E>(&mut self, address: u32, depth: usize, expand: E) -> WalkNode
    where
        T: Record + Into<RecordView>,
        E: FnOnce(&mut Self, &T, usize) -> Vec<Edge>,
    {
        self.visit(address, T::KIND, depth, |s| s.decode::<T>(address), expand)
    }

    fn leaf<T>(&mut self, address: u32, depth: usize) -> WalkNode
    where
        T: Record + Into<RecordView>,
    {
        self.record::<T, _>(address, depth, |_, _, _| Vec::new())
    }

    /// Follow a pointer word, adding an edge when it is a pointer
    fn link<F>(&mut self, edges: &mut Vec<Edge>, label: &str, word: Word, depth: usize, visit: F)
    where
        F: FnOnce(&mut Self, u32, usize) -> WalkNode,
    {
        if let Some(target) = self.session.follow(word) {
            let node = visit(self, target, depth);
            edges.push(Edge::new(label, node));
        }
    }

    /// Follow a count-prefixed array, one edge per entry
    fn array<T>(
        &mut self,
        edges: &mut Vec<Edge>,
        label: &str,
        word: Word,
        count: u32,
        depth: usize,
        visit: fn(&mut Self, u32, usize) -> WalkNode,
    ) where
        T: Record,
    {
        let Some(start) = self.session.follow(word) else {
            return;
        };
        if count == 0 {
            return;
        }

        let array = match self.session.decode_array::<T>(start, count as usize) {
            Ok(array) => array,
            Err(error) => {
                edges.push(Edge::new(label, Self::failed(start, T::KIND, error)));
                return;
            }
        };

        let decoded = array.items.len();
        for i in 0..decoded {
            let address = start.wrapping_add((i * T::SIZE) as u32);
            let node = visit(self, address, depth);
            edges.push(Edge::new(format!("{}[{}]", label, i), node));
        }
        if let Some(error) = array.truncated {
            let address = start.wrapping_add((decoded * T::SIZE) as u32);
            edges.push(Edge::new(
                format!("{}[{}]", label, decoded),
                Self::failed(address, T::KIND, error),
            ));
        }
    }

    fn character(&mut self, address: u32, depth: usize) -> WalkNode {
        self.record::<Character, _>(address, depth, |w, perso, depth| {
            let mut edges = Vec::new();
            w.link(&mut edges, "std_game", perso.std_game, depth, Self::leaf::<StandardGame>);
            w.link(&mut edges, "brain", perso.brain, depth, Self::brain);
            edges
        })
    }

    fn brain(&mut self, address: u32, depth: usize) -> WalkNode {
        self.record::<Brain, _>(address, depth, |w, brain, depth| {
            let mut edges = Vec::new();
            w.link(&mut edges, "mind", brain.mind, depth, Self::mind);
            edges
        })
    }

    fn mind(&mut self, address: u32, depth: usize) -> WalkNode {
        self.record::<Mind, _>(address, depth, |w, mind, depth| {
            let mut edges = Vec::new();
            w.link(&mut edges, "ai_model", mind.ai_model, depth, Self::model);
            w.link(&mut edges, "dsg_mem", mind.dsg_mem, depth, Self::dsg_vars);
            edges
        })
    }

    fn model(&mut self, address: u32, depth: usize) -> WalkNode {
        self.record::<Model, _>(address, depth, |w, model, depth| {
            let mut edges = Vec::new();
            w.array::<Behavior>(
                &mut edges,
                "behaviors",
                model.behaviors,
                model.behavior_count,
                depth,
                Self::behavior,
            );
            w.array::<Behavior>(
                &mut edges,
                "reflexes",
                model.reflexes,
                model.reflex_count,
                depth,
                Self::behavior,
            );
            w.array::<Macro>(
                &mut edges,
                "macros",
                model.macros,
                model.macro_count,
                depth,
                Self::macro_entry,
            );
            w.link(&mut edges, "dsg_vars", model.dsg_vars, depth, Self::dsg_vars);
            edges
        })
    }

    fn behavior(&mut self, address: u32, depth: usize) -> WalkNode {
        self.record::<Behavior, _>(address, depth, |w, behavior, depth| {
            let mut edges = Vec::new();
            w.array::<Script>(
                &mut edges,
                "scripts",
                behavior.scripts,
                behavior.script_count,
                depth,
                Self::script,
            );
            edges
        })
    }

    fn macro_entry(&mut self, address: u32, depth: usize) -> WalkNode {
        self.record::<Macro, _>(address, depth, |w, mac, depth| {
            let mut edges = Vec::new();
            w.link(&mut edges, "script", mac.script, depth, Self::script);
            edges
        })
    }

    fn script(&mut self, address: u32, depth: usize) -> WalkNode {
        self.record::<Script, _>(address, depth, |w, script, depth| {
            let mut edges = Vec::new();
            w.link(&mut edges, "root", script.root, depth, Self::script_tree);
            edges
        })
    }

    fn script_tree(&mut self, address: u32, depth: usize) -> WalkNode {
        let max_nodes = self.options.max_script_nodes;
        self.visit(
            address,
            SCRIPT_TREE_KIND,
            depth,
            |s| s.decode_script_tree(address, max_nodes),
            |_, _, _| Vec::new(),
        )
    }

    fn dsg_vars(&mut self, address: u32, depth: usize) -> WalkNode {
        self.visit(
            address,
            DSG_TABLE_KIND,
            depth,
            |s| s.decode_dsg_vars(address),
            |w, table: &DsgVarTable, depth| {
                let mut edges = Vec::new();
                for (index, target) in table.perso_refs() {
                    let label = format!("var[{}]", index);
                    w.link(&mut edges, &label, target, depth, Self::character);
                }
                edges
            },
        )
    }

    fn scene(&mut self, address: u32, depth: usize) -> WalkNode {
        self.record::<SceneGraphNode, _>(address, depth, |w, scene, depth| {
            let mut edges = Vec::new();
            let Some(list) = w.session.follow(scene.spawners) else {
                return edges;
            };
            match w.session.spawners(list) {
                Ok(spawners) => {
                    for (i, spawner) in spawners.iter().enumerate() {
                        let node = w.spawner(spawner.address, depth);
                        edges.push(Edge::new(format!("spawners[{}]", i), node));
                    }
                }
                Err(error) => {
                    edges.push(Edge::new("spawners", Self::failed(list, Spawner::KIND, error)));
                }
            }
            edges
        })
    }

    fn spawner(&mut self, address: u32, depth: usize) -> WalkNode {
        self.record::<Spawner, _>(address, depth, |w, spawner, depth| {
            let mut edges = Vec::new();
            w.link(&mut edges, "perso", spawner.perso, depth, Self::character);
            edges
        })
    }
}

macro_rules! impl_view {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for RecordView {
                fn from(record: $ty) -> Self {
                    Self::$variant(record)
                }
            }
        )*
    };
}

impl_view! {
    Character => Character,
    StandardGame => StandardGame,
    Brain => Brain,
    Mind => Mind,
    Model => Model,
    Behavior => Behavior,
    Macro => Macro,
    Script => Script,
    ScriptTree => ScriptTree,
    DsgVarTable => DsgVars,
    SceneGraphNode => SceneGraph,
    Spawner => Spawner,
}
