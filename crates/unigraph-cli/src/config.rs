//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use unigraph_sdk::UniGraphConfig;

/// Environment variable consulted when the config has no API key
pub const API_KEY_ENV: &str = "UNIGRAPH_API_KEY";

/// CLI configuration.
///
/// The pipeline sections (`[oracle]`, `[induction]`, `[extractor]`,
/// `[indexer]`, `[search]`) sit at the top level next to the CLI's own
/// `[settings]` and `[storage]` tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Output settings
    #[serde(default)]
    pub settings: Settings,

    /// Where graphs are kept
    #[serde(default)]
    pub storage: Storage,

    /// Provider and job configuration
    #[serde(flatten)]
    pub pipeline: UniGraphConfig,
}

/// Global CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Graph storage settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Storage {
    /// SQLite database file; `~/.unigraph/graphs.db` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
}

impl Config {
    /// Directory holding the default config and database.
    pub fn home() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".unigraph"))
    }

    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        Ok(Self::home()?.join("config.toml"))
    }

    /// Load configuration from `path`, or from the default location.
    ///
    /// A missing default file yields the defaults; a missing explicit file
    /// is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_toml(&fs::read_to_string(path)?)?,
            None => {
                let path = Self::path()?;
                if path.exists() {
                    Self::from_toml(&fs::read_to_string(&path)?)?
                } else {
                    Self::default()
                }
            }
        };
        config.pipeline.validate().map_err(CliError::Config)?;
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        let path = Self::path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(&path, contents)?;
        Ok(())
    }

    /// Fill an empty API key from the environment.
    pub fn apply_env(&mut self) {
        if self.pipeline.oracle.api_key.is_empty() {
            if let Ok(key) = std::env::var(API_KEY_ENV) {
                self.pipeline.oracle.api_key = key;
            }
        }
    }

    /// Resolve the database path, creating its directory.
    pub fn database_path(&self) -> Result<PathBuf> {
        let path = match &self.storage.database {
            Some(path) => path.clone(),
            None => Self::home()?.join("graphs.db"),
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Ok(path)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}
