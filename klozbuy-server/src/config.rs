use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "klozbuy.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value '{value}' for {key}")]
    Invalid { key: &'static str, value: String },

    #[error("Configuration error: {0}")]
    Missing(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Libsql,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "libsql" => Ok(StorageBackend::Libsql),
            _ => Err(ConfigError::Invalid {
                key: "KLOZBUY_STORAGE",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins. Empty means any origin.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub url: Option<String>,
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for the daily rolling JSON log. No file logging when unset.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: None,
            file_prefix: "klozbuy.log".to_string(),
            json: true,
        }
    }
}

impl Config {
    /// Load from `path`, or from `klozbuy.toml` when it exists.
    ///
    /// An explicitly given file must exist; the default one is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };
        if !required && !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `KLOZBUY_*` and `LIBSQL_*` overrides from `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(host) = lookup("KLOZBUY_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("KLOZBUY_PORT") {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "KLOZBUY_PORT",
                value: port.clone(),
            })?;
        }
        if let Some(backend) = lookup("KLOZBUY_STORAGE") {
            self.storage.backend = backend.parse()?;
        }
        if let Some(url) = lookup("LIBSQL_URL") {
            self.storage.url = Some(url);
        }
        if let Some(token) = lookup("LIBSQL_AUTH_TOKEN") {
            self.storage.auth_token = Some(token);
        }
        if let Some(dir) = lookup("KLOZBUY_LOG_DIR") {
            self.logging.directory = Some(PathBuf::from(dir));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "server.host",
                value: self.server.host.clone(),
            });
        }
        if self.storage.backend == StorageBackend::Libsql
            && self.storage.url.as_deref().map_or(true, |u| u.trim().is_empty())
        {
            return Err(ConfigError::Missing(
                "the libsql backend needs storage.url or LIBSQL_URL".to_string(),
            ));
        }
        Ok(())
    }
}
