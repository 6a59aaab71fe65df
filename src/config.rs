//! Configuration management
//!
//! Settings come from the process environment (optionally seeded from a
//! `.env` file) and are then overridden by command-line flags.

use crate::core::BatchConfig;
use anyhow::Context;
use std::path::PathBuf;
use std::str::FromStr;

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/sales.db";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 5;

/// Default location of the sales file.
pub const DEFAULT_SOURCE_PATH: &str = "./data/data.csv";

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database: DatabaseConfig,
    pub source: SourceConfig,
    pub server: ServerConfig,
}

/// Database configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Sales file and batching configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SourceConfig {
    pub path: PathBuf,
    pub batch_size: usize,
}

/// HTTP host configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub refresh_on_startup: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
            },
            source: SourceConfig {
                path: PathBuf::from(DEFAULT_SOURCE_PATH),
                batch_size: crate::core::DEFAULT_BATCH_SIZE,
            },
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                refresh_on_startup: true,
            },
        }
    }
}

impl Config {
    /// Load configuration from `.env`, the environment and defaults
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    ///
    /// Unset variables take their defaults; set but unparsable ones are
    /// an error.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Config {
            database: DatabaseConfig {
                url: lookup("DATABASE_URL").unwrap_or(defaults.database.url),
                max_connections: parse_var(
                    &lookup,
                    "DATABASE_MAX_CONNECTIONS",
                    defaults.database.max_connections,
                )?,
            },
            source: SourceConfig {
                path: lookup("SALES_SOURCE_PATH")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.source.path),
                batch_size: parse_var(&lookup, "SALES_BATCH_SIZE", defaults.source.batch_size)?,
            },
            server: ServerConfig {
                host: lookup("SALES_HOST").unwrap_or(defaults.server.host),
                port: parse_var(&lookup, "SALES_PORT", defaults.server.port)?,
                refresh_on_startup: parse_var(
                    &lookup,
                    "SALES_REFRESH_ON_STARTUP",
                    defaults.server.refresh_on_startup,
                )?,
            },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        if self.database.max_connections == 0 {
            anyhow::bail!("Database max_connections must be greater than 0");
        }

        if self.source.path.as_os_str().is_empty() {
            anyhow::bail!("Source path cannot be empty");
        }

        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        Ok(())
    }

    /// Batch configuration derived from the configured batch size
    pub fn batch_config(&self) -> BatchConfig {
        BatchConfig::new(self.source.batch_size)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", key, raw)),
        None => Ok(default),
    }
}
