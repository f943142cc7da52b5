//! Command handlers for the hype CLI
//!
//! Each subcommand has its own module with handler functions.

pub mod blocks;
pub mod configure;
pub mod decode;
pub mod dump;
pub mod resolve;
pub mod session;
pub mod walk;

use anyhow::Result;
use hype_sna::{LoadOptions, WalkOptions};
use serde::Serialize;

use crate::cli::Cli;
use crate::config::Config;

/// Settings shared by every command of one run
#[derive(Debug)]
pub struct Invocation {
    pub json: bool,
    pub load: LoadOptions,
    pub walk: WalkOptions,
    pub config: Config,
}

impl Invocation {
    /// Merge global flags over the loaded config
    pub fn new(cli: &Cli, config: Config) -> Self {
        let layout = cli.layout.or(config.layout).unwrap_or_default();
        let load = LoadOptions::new(layout).with_module(cli.module.unwrap_or(0));
        Self {
            json: cli.json,
            load,
            walk: config.walk,
            config,
        }
    }
}

/// Print a value as pretty JSON on stdout
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
