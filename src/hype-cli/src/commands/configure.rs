//! Configuration command handlers
//!
//! Handles the `configure` subcommand for setting up hype CLI defaults.

use crate::config::Config;
use anyhow::Result;
use hype_sna::HeaderLayout;
use std::path::PathBuf;

/// Requested config changes
#[derive(Debug, Default)]
pub struct ConfigChanges {
    pub data_dir: Option<PathBuf>,
    pub layout: Option<HeaderLayout>,
    pub max_depth: Option<usize>,
}

impl ConfigChanges {
    fn is_empty(&self) -> bool {
        self.data_dir.is_none() && self.layout.is_none() && self.max_depth.is_none()
    }

    /// Apply to a config; returns true when anything was set
    fn apply(self, config: &mut Config) -> bool {
        if self.is_empty() {
            return false;
        }
        if let Some(dir) = self.data_dir {
            config.data_dir = Some(dir);
        }
        if let Some(layout) = self.layout {
            config.layout = Some(layout);
        }
        if let Some(depth) = self.max_depth {
            config.walk.max_depth = depth;
        }
        true
    }
}

/// Handle the configure command
pub fn handle(show: bool, changes: ConfigChanges) -> Result<()> {
    let mut config = Config::load()?;

    if show {
        show_config(&config);
        return Ok(());
    }

    if changes.apply(&mut config) {
        let path = config.save()?;
        println!("Config saved to: {}", path.display());
        show_config(&config);
    } else {
        show_usage();
    }

    Ok(())
}

/// Display current configuration
fn show_config(config: &Config) {
    match &config.data_dir {
        Some(dir) => println!("Data directory: {}", dir.display()),
        None => println!("No data directory configured"),
    }
    println!("Header layout: {}", config.layout.unwrap_or_default());
    if let Some(filter) = &config.log_filter {
        println!("Log filter: {}", filter);
    }
    println!(
        "Walk limits: depth {}, records {}, script nodes {}",
        config.walk.max_depth, config.walk.max_nodes, config.walk.max_script_nodes
    );

    if let Ok(path) = Config::config_path() {
        println!("Config file: {}", path.display());
    }
}

/// Show usage help for the configure command
fn show_usage() {
    println!("Usage: hype configure --data-dir PATH [--layout boot|full] [--max-depth N]");
    println!("   or: hype configure --show");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_changes_leave_config_alone() {
        let mut config = Config::default();
        assert!(!ConfigChanges::default().apply(&mut config));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_apply_changes() {
        let mut config = Config::default();
        let changes = ConfigChanges {
            data_dir: Some(PathBuf::from("/data")),
            layout: Some(HeaderLayout::Boot),
            max_depth: Some(3),
        };
        assert!(changes.apply(&mut config));
        assert_eq!(config.data_dir, Some(PathBuf::from("/data")));
        assert_eq!(config.layout, Some(HeaderLayout::Boot));
        assert_eq!(config.walk.max_depth, 3);
        assert_eq!(config.walk.max_nodes, 10_000);
    }

    #[test]
    fn test_show_usage_does_not_panic() {
        show_usage();
    }
}
