//! CLI configuration
//!
//! Values come from an optional TOML file; command-line flags and
//! environment variables take precedence over it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::Backend;

pub const DEFAULT_PATH: &str = cairn_engine::DEFAULT_MIGRATIONS_DIR;
pub const DEFAULT_EXT: &str = "toml";

/// Get the config file location, honouring an explicit override
pub fn config_file_path(path_override: Option<&Path>) -> PathBuf {
    if let Some(path) = path_override {
        return path.to_path_buf();
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cairn")
        .join("config.toml")
}

/// Configuration for the CLI
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Migrations directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Log collection name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,

    /// Database file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    /// Storage backend: redb or sqlite
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,

    /// Extension for generated migrations: toml or json
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext: Option<String>,
}

impl Config {
    /// Config with every key set to its default
    pub fn with_defaults() -> Self {
        Self {
            path: Some(DEFAULT_PATH.to_string()),
            collection: Some(cairn_storage::DEFAULT_COLLECTION.to_string()),
            database: Some("cairn.redb".to_string()),
            backend: Some(Backend::Redb.as_str().to_string()),
            ext: Some(DEFAULT_EXT.to_string()),
        }
    }

    pub fn keys() -> &'static [&'static str] {
        &["path", "collection", "database", "backend", "ext"]
    }

    /// Load from a file; a missing file yields an empty config
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                anyhow::anyhow!("Invalid config file {}: {}", path.display(), e)
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(anyhow::anyhow!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            )),
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Raw value stored for a key; `None` for unknown keys
    pub fn get(&self, key: &str) -> Option<Option<String>> {
        let value = match key {
            "path" => &self.path,
            "collection" => &self.collection,
            "database" => &self.database,
            "backend" => &self.backend,
            "ext" => &self.ext,
            _ => return None,
        };
        Some(value.clone())
    }

    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "backend" if Backend::parse(value).is_none() => {
                anyhow::bail!("Invalid backend '{}'. Expected redb or sqlite", value)
            }
            "ext" if !cairn_core::MIGRATION_EXTENSIONS.contains(&value) => anyhow::bail!(
                "Invalid extension '{}'. Expected one of: {}",
                value,
                cairn_core::MIGRATION_EXTENSIONS.join(", ")
            ),
            "collection" if value.is_empty() || value.contains(':') => {
                anyhow::bail!("Invalid collection name '{}'", value)
            }
            _ => {}
        }

        let slot = match key {
            "path" => &mut self.path,
            "collection" => &mut self.collection,
            "database" => &mut self.database,
            "backend" => &mut self.backend,
            "ext" => &mut self.ext,
            _ => anyhow::bail!(
                "Unknown config key: {}. Available keys: {}",
                key,
                Self::keys().join(", ")
            ),
        };
        *slot = Some(value.to_string());
        Ok(())
    }

    pub fn migrations_dir(&self) -> PathBuf {
        PathBuf::from(self.path.as_deref().unwrap_or(DEFAULT_PATH))
    }

    pub fn collection(&self) -> String {
        self.collection
            .clone()
            .unwrap_or_else(|| cairn_storage::DEFAULT_COLLECTION.to_string())
    }

    pub fn ext(&self) -> &str {
        self.ext.as_deref().unwrap_or(DEFAULT_EXT)
    }
}
