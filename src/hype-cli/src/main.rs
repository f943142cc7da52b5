mod cli;
mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::{Cli, Commands};
use commands::configure::ConfigChanges;
use commands::walk::WalkArgs;
use commands::Invocation;
use config::Config;

const DEFAULT_LOG_FILTER: &str = "hype_sna=info,hype=info";
const VERBOSE_LOG_FILTER: &str = "hype_sna=debug,hype=debug";

/// Log to stderr so stdout stays clean for `--json`
fn init_tracing(verbose: bool, configured: Option<&str>) {
    let filter = if verbose {
        EnvFilter::new(VERBOSE_LOG_FILTER)
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| configured.unwrap_or(DEFAULT_LOG_FILTER).into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;
    init_tracing(cli.verbose, config.log_filter.as_deref());

    let inv = Invocation::new(&cli, config);

    match cli.command {
        Commands::Blocks { load } => commands::blocks::handle(&load, &inv)?,

        Commands::Resolve { load, addresses } => {
            commands::resolve::handle(&load, &addresses, &inv)?;
        }

        Commands::Dump { load, address, len } => {
            commands::dump::handle(&load, address, len, &inv)?;
        }

        Commands::Decode {
            load,
            kind,
            address,
            count,
        } => commands::decode::handle(&load, kind, address, count, &inv)?,

        Commands::Walk {
            load,
            address,
            scene,
            max_depth,
            max_nodes,
        } => {
            let walk = WalkArgs {
                address,
                scene,
                max_depth,
                max_nodes,
            };
            commands::walk::handle(&load, walk, &inv)?;
        }

        Commands::Configure {
            show,
            data_dir,
            layout,
            max_depth,
        } => {
            let changes = ConfigChanges {
                data_dir,
                layout,
                max_depth,
            };
            commands::configure::handle(show, changes)?;
        }
    }

    Ok(())
}
