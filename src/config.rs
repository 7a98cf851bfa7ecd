use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{Error, Result};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct EngramConfig {
    pub storage: StorageConfig,
    pub schema: SchemaConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// Backing graph file, one JSON record per line.
    pub graph_path: String,
    /// Skip corrupt lines with a warning instead of failing the load.
    pub lenient_load: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SchemaConfig {
    /// Directory scanned for `*.schema.json` documents.
    pub schema_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let graph_path = default_engram_dir()
            .join("graph.jsonl")
            .to_string_lossy()
            .into_owned();
        Self {
            graph_path,
            lenient_load: false,
        }
    }
}

impl Default for SchemaConfig {
    fn default() -> Self {
        let schema_dir = default_engram_dir()
            .join("schemas")
            .to_string_lossy()
            .into_owned();
        Self { schema_dir }
    }
}

/// Returns `~/.engram/`
pub fn default_engram_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".engram")
}

/// Returns the default config file path: `~/.engram/config.toml`
pub fn default_config_path() -> PathBuf {
    default_engram_dir().join("config.toml")
}

impl EngramConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str(&contents)
                .map_err(|err| Error::Config(format!("failed to parse config TOML: {err}")))?
        } else {
            info!("no config file at {}, using defaults", path.display());
            EngramConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (ENGRAM_GRAPH, ENGRAM_SCHEMAS).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("ENGRAM_GRAPH") {
            self.storage.graph_path = val;
        }
        if let Ok(val) = std::env::var("ENGRAM_SCHEMAS") {
            self.schema.schema_dir = val;
        }
    }

    /// Resolve the graph file path, expanding `~` if needed.
    pub fn resolved_graph_path(&self) -> PathBuf {
        expand_tilde(&self.storage.graph_path)
    }

    /// Resolve the schema directory, expanding `~` if needed.
    pub fn resolved_schema_dir(&self) -> PathBuf {
        expand_tilde(&self.schema.schema_dir)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .expect("home directory must exist")
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}
