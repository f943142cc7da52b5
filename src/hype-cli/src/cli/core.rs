//! Core CLI definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use hype_sna::HeaderLayout;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hype")]
#[command(about = "SNA game data container inspector", long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Block header layout (boot or full); defaults to the configured layout
    #[arg(long, global = true)]
    pub layout: Option<HeaderLayout>,

    /// Module id given to blocks whose headers carry none
    #[arg(long, global = true)]
    pub module: Option<u8>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Container input shared by every loading command
#[derive(Args, Debug, Clone)]
pub struct LoadArgs {
    /// Path to the .sna container (relative paths also try the configured data directory)
    pub file: PathBuf,

    /// Flat patch table applied before decoding (repeatable, applied in order)
    #[arg(long = "patches", value_name = "FILE")]
    pub patches: Vec<PathBuf>,

    /// Compact (module, block, delta) relocation table
    #[arg(long, value_name = "FILE")]
    pub relocations: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the blocks of a container and any load failures
    #[command(visible_alias = "b")]
    Blocks {
        #[command(flatten)]
        load: LoadArgs,
    },

    /// Show the owning block and offset of virtual addresses
    #[command(visible_alias = "r")]
    Resolve {
        #[command(flatten)]
        load: LoadArgs,

        /// Virtual addresses (hex with 0x prefix, or decimal)
        #[arg(required = true, value_parser = parse_address)]
        addresses: Vec<u32>,
    },

    /// Hex dump of a virtual range
    #[command(visible_alias = "x")]
    Dump {
        #[command(flatten)]
        load: LoadArgs,

        /// Start address
        #[arg(value_parser = parse_address)]
        address: u32,

        /// Number of bytes (clipped at the end of the owning block)
        #[arg(short, long, default_value = "256")]
        len: usize,
    },

    /// Decode one record (or a run of records) without following pointers
    #[command(visible_alias = "d")]
    Decode {
        #[command(flatten)]
        load: LoadArgs,

        /// Record kind
        #[arg(value_enum)]
        kind: RecordKind,

        /// Record address
        #[arg(value_parser = parse_address)]
        address: u32,

        /// Decode this many consecutive records
        #[arg(short, long)]
        count: Option<usize>,
    },

    /// Follow pointers transitively from a character or scene root
    #[command(visible_alias = "w")]
    Walk {
        #[command(flatten)]
        load: LoadArgs,

        /// Start address (defaults to the boot snapshot pointer)
        #[arg(value_parser = parse_address)]
        address: Option<u32>,

        /// Treat the start address as a scene graph root
        #[arg(long)]
        scene: bool,

        /// Override the configured depth limit
        #[arg(long)]
        max_depth: Option<usize>,

        /// Override the configured record budget
        #[arg(long)]
        max_nodes: Option<usize>,
    },

    /// Configure default settings
    #[command(visible_alias = "c")]
    Configure {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Directory searched for relative container paths
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Default header layout
        #[arg(long)]
        layout: Option<HeaderLayout>,

        /// Default walk depth limit
        #[arg(long)]
        max_depth: Option<usize>,
    },
}

/// Record kinds understood by `decode`
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Character,
    StandardGame,
    Brain,
    Mind,
    Model,
    Behavior,
    Macro,
    Script,
    ScriptNode,
    ScriptTree,
    DsgVars,
    DsgVarInfo,
    SceneGraph,
    Spawner,
    Spawners,
}

/// Parse a hex (`0x` prefix) or decimal address
pub fn parse_address(address: &str) -> Result<u32, String> {
    let parsed = match address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(&hex.replace('_', ""), 16),
        None => address.replace('_', "").parse::<u32>(),
    };
    parsed.map_err(|e| format!("invalid address '{}': {}", address, e))
}
