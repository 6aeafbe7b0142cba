//! Explicit run configuration.
//!
//! Nothing here reads the environment at module scope: the binary builds a
//! [`PipelineConfig`] once and hands references to the stages that need it.

use std::path::PathBuf;

use crate::error::EtlError;

pub const DEFAULT_DATA_DIR: &str = "data";

/// Connection target for the warehouse database.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, EtlError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so tests don't have to
    /// mutate the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, EtlError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key).ok_or_else(|| EtlError::Config {
                message: format!("{} environment variable is required", key),
            })
        };

        let raw_port = require("DB_PORT")?;
        let port = raw_port.trim().parse::<u16>().map_err(|e| EtlError::Config {
            message: format!("Invalid DB_PORT '{}': {}", raw_port, e),
        })?;

        Ok(Self {
            host: require("DB_HOST")?,
            port,
            name: require("DB_NAME")?,
            user: require("DB_USER")?,
            password: require("DB_PASSWORD")?,
        })
    }

    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.name
        )
    }

    pub fn redacted_url(&self) -> String {
        format!(
            "postgres://{}:***@{}:{}/{}",
            self.user, self.host, self.port, self.name
        )
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub database: DatabaseConfig,
    pub data_dir: PathBuf,
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self, EtlError> {
        let database = DatabaseConfig::from_env()?;
        Ok(Self {
            database,
            data_dir: data_dir_from_env(),
        })
    }
}

/// `DATA_DIR`, or `data` relative to the working directory.
pub fn data_dir_from_env() -> PathBuf {
    std::env::var("DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR))
}
