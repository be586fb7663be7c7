// Store directory configuration

use crate::sqlite::SqliteStorage;
use crate::storage::{FileStorage, Storage};
use clap::ValueEnum;
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_FILE: &str = "config.yaml";

/// Which storage backend holds the task list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    File,
    Sqlite,
}

impl Backend {
    /// Open this backend rooted at `path`
    pub fn open(self, path: &Path) -> Result<Box<dyn Storage>> {
        debug!(backend = ?self, path = ?path, "Opening storage");
        let storage: Box<dyn Storage> = match self {
            Backend::File => Box::new(FileStorage::open(path)?),
            Backend::Sqlite => Box::new(SqliteStorage::open(path)?),
        };
        Ok(storage)
    }
}

/// Settings read from `config.yaml` in the store directory
///
/// Every field is optional in the file; CLI flags override what is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: Backend,
    /// Ask before deleting tasks
    pub confirm: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::File,
            confirm: true,
        }
    }
}

impl Config {
    /// Load `config.yaml` from `dir`, or defaults if there is none
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config =
            serde_yaml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;

        debug!(path = ?path, ?config, "Loaded config");
        Ok(config)
    }
}

/// Default store directory: the platform data dir, or `.` if unknown
pub fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("todostore")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_is_default() {
        let temp = TempDir::new().unwrap();
        let config = Config::load(temp.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.confirm);
    }

    #[test]
    fn test_load_partial() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE), "backend: sqlite\n").unwrap();

        let config = Config::load(temp.path()).unwrap();
        assert_eq!(config.backend, Backend::Sqlite);
        assert!(config.confirm);
    }

    #[test]
    fn test_load_malformed() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE), "backend: [unclosed").unwrap();

        assert!(Config::load(temp.path()).is_err());
    }

    #[test]
    fn test_backend_open() {
        let temp = TempDir::new().unwrap();

        let mut storage = Backend::Sqlite.open(temp.path()).unwrap();
        storage.set_item("k", "v").unwrap();
        assert!(temp.path().join(crate::sqlite::DB_FILE).exists());
        drop(storage);

        let mut storage = Backend::File.open(temp.path()).unwrap();
        storage.set_item("k", "v").unwrap();
        assert!(temp.path().join("k.json").exists());
    }

    #[test]
    fn test_default_store_path() {
        assert!(default_store_path().ends_with("todostore"));
    }
}
