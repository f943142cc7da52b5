//! Configuration management for the hype CLI

use anyhow::{Context, Result};
use hype_sna::{HeaderLayout, WalkOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory searched for relative container paths
    pub data_dir: Option<PathBuf>,
    pub layout: Option<HeaderLayout>,
    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter: Option<String>,
    pub walk: WalkOptions,
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("hype");

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration from file, or the defaults if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory at {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;

        Ok(())
    }

    /// Locate a container path, falling back to the data directory
    ///
    /// Absolute paths and paths that exist relative to the working directory
    /// are returned unchanged.
    pub fn resolve_input(&self, path: &Path) -> PathBuf {
        if path.is_absolute() || path.exists() {
            return path.to_path_buf();
        }
        match &self.data_dir {
            Some(dir) if dir.join(path).exists() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.walk.max_depth, 16);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config {
            data_dir: Some(PathBuf::from("/games/hype/Gamedata")),
            layout: Some(HeaderLayout::Boot),
            log_filter: Some("hype_sna=trace".to_string()),
            walk: WalkOptions {
                max_depth: 4,
                ..WalkOptions::default()
            },
        };
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "layout = \"full\"\n\n[walk]\nmax_nodes = 50\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.layout, Some(HeaderLayout::Full));
        assert_eq!(config.walk.max_nodes, 50);
        assert_eq!(config.walk.max_depth, 16);
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "layout = \"sideways\"\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_resolve_input_uses_data_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("fix.sna"), b"").unwrap();

        let config = Config {
            data_dir: Some(dir.path().to_path_buf()),
            ..Config::default()
        };
        assert_eq!(
            config.resolve_input(Path::new("fix.sna")),
            dir.path().join("fix.sna")
        );
        assert_eq!(
            config.resolve_input(Path::new("missing.sna")),
            PathBuf::from("missing.sna")
        );
    }
}
