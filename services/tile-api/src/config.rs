//! Service configuration loading and validation.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use storage::{DatasetSchema, EngineConfig, QueryBuilder, SchemaError, TileEncoding};

/// Environment variable that overrides `database.url`.
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";

/// Top-level service configuration, read from a single YAML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Geometry store connection.
    pub database: EngineConfig,

    /// Footprint table and column names.
    pub dataset: DatasetSchema,

    /// Vector tile encoding.
    pub tiles: TileEncoding,

    /// Error reporting to clients.
    pub errors: ErrorConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorConfig {
    /// Return engine diagnostics in 500 bodies. When off, clients get a
    /// generic message and the diagnostic only goes to the log.
    #[serde(default = "default_expose_engine_errors")]
    pub expose_engine_errors: bool,
}

impl Default for ErrorConfig {
    fn default() -> Self {
        Self {
            expose_engine_errors: default_expose_engine_errors(),
        }
    }
}

fn default_expose_engine_errors() -> bool {
    true
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("database.url must not be empty")]
    MissingDatabaseUrl,

    #[error("database.max_connections must be at least 1")]
    InvalidPoolSize,

    #[error("database.{0} must be greater than 0")]
    InvalidTimeout(&'static str),
}

impl ServiceConfig {
    /// Load the config file, apply environment overrides and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut config = Self::load_file(path)?;
        config.apply_overrides(std::env::var(DATABASE_URL_VAR).ok());
        config.validate()?;
        Ok(config)
    }

    /// Read a YAML config file. A missing file yields the defaults.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(
                "Config file {} does not exist, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let config = Self::from_yaml(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        tracing::info!(
            path = %path.display(),
            table = %config.dataset.table,
            layer = %config.tiles.layer_name,
            "Loaded service config"
        );
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserializes to unit, not to an empty mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Apply a database URL taken from the environment.
    pub fn apply_overrides(&mut self, database_url: Option<String>) {
        if let Some(url) = database_url.filter(|u| !u.trim().is_empty()) {
            self.database.url = url;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::MissingDatabaseUrl);
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidPoolSize);
        }
        if self.database.acquire_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout("acquire_timeout_ms"));
        }
        if self.database.query_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout("query_timeout_ms"));
        }
        self.dataset.validate()?;
        self.tiles.validate()?;
        Ok(())
    }

    /// Build the query builder for the configured dataset.
    pub fn query_builder(&self) -> Result<QueryBuilder, SchemaError> {
        QueryBuilder::new(self.dataset.clone(), self.tiles.clone())
    }
}
