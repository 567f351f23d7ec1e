//! Layered configuration.
//!
//! Sources, highest priority first:
//! 1. Environment variables with the `MAPHARVEST_` prefix (`__` separates
//!    sections, e.g. `MAPHARVEST_SERVER__PORT=9000`)
//! 2. The TOML file given explicitly, or `MAPHARVEST_CONFIG`, or
//!    `MapHarvest.toml` in the working directory
//! 3. Built-in defaults

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "MapHarvest.toml";
pub const CONFIG_PATH_ENV: &str = "MAPHARVEST_CONFIG";
const ENV_PREFIX: &str = "MAPHARVEST_";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Figment(#[from] figment::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Built frontend to serve at `/`, if the directory exists.
    pub static_dir: Option<String>,
    pub allow_any_origin: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
            static_dir: Some("./frontend/dist".to_string()),
            allow_any_origin: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// SQLite file; `:memory:` keeps the database in process.
    pub database: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            backend: StorageBackend::Sqlite,
            database: "map_harvest.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneratorConfig {
    pub delay_ms_min: u64,
    pub delay_ms_max: u64,
    pub max_results: usize,
    pub with_email: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            delay_ms_min: 1500,
            delay_ms_max: 2500,
            max_results: 75,
            with_email: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Mock,
    Script,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SourceConfig {
    pub kind: SourceKind,
    /// Program run by the script source, e.g. `python`.
    pub program: Option<String>,
    /// Arguments placed before the search arguments, e.g. `["business_scraper.py"]`.
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
    pub batch_size: usize,
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            batch_size: 100,
            default_page_size: 10,
            max_page_size: 500,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Bearer token -> user id.
    #[serde(default)]
    pub tokens: HashMap<String, String>,
}

impl Config {
    /// Load from defaults, the config file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Config = Self::figment(path).extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        let file = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        if file.exists() {
            figment = figment.merge(Toml::file(file));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__").ignore(&["config"]))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.export.batch_size == 0 {
            return Err(ConfigError::Invalid("export.batch_size must be positive".into()));
        }
        if self.export.default_page_size == 0 || self.export.default_page_size > self.export.max_page_size {
            return Err(ConfigError::Invalid(
                "export.default_page_size must be between 1 and export.max_page_size".into(),
            ));
        }
        if self.generator.delay_ms_min > self.generator.delay_ms_max {
            return Err(ConfigError::Invalid(
                "generator.delay_ms_min must not exceed generator.delay_ms_max".into(),
            ));
        }
        if self.source.kind == SourceKind::Script && self.source.program.is_none() {
            return Err(ConfigError::Invalid("source.program is required for the script source".into()));
        }
        Ok(())
    }
}
