//! Logging configuration and initialization
//!
//! All diagnostics go through `tracing`; this module installs the global
//! subscriber once at startup.
//!
//! Environment variables:
//! - `RUST_LOG`: base filter directives
//! - `LOG_LEVEL`: trace, debug, info, warn, error; overrides the global
//!   level of `RUST_LOG` (default info when neither is set)
//! - `LOG_FORMAT`: text or json (default text)
//! - `LOG_FILTER`: extra filter directives, e.g. `sqlx=warn`

use anyhow::{Context, Result};
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log level for filtering messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Convert to tracing Level
    pub fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(anyhow::anyhow!("Invalid log level: {}", s)),
        }
    }
}

/// Log format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable text
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(anyhow::anyhow!("Invalid log format: {}", s)),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogConfig {
    /// Explicit global level; `None` leaves it to `rust_log`
    pub level: Option<LogLevel>,
    pub format: LogFormat,
    /// Base directives taken from `RUST_LOG`
    pub rust_log: Option<String>,
    /// Additional filter directives (e.g. "sqlx=warn,sales_ingest=debug")
    pub filter_directives: Option<String>,
}

impl LogConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(level) = lookup("LOG_LEVEL") {
            config.level = Some(level.parse()?);
        }

        if let Some(format) = lookup("LOG_FORMAT") {
            config.format = format.parse()?;
        }

        config.rust_log = lookup("RUST_LOG").filter(|f| !f.trim().is_empty());
        config.filter_directives = lookup("LOG_FILTER").filter(|f| !f.trim().is_empty());

        Ok(config)
    }

    /// Build the event filter for this configuration
    ///
    /// `RUST_LOG` supplies the base directives. A target-less level directive
    /// is only added when `LOG_LEVEL` is set or `RUST_LOG` is absent, since
    /// it replaces any global level `RUST_LOG` carries.
    pub fn env_filter(&self) -> Result<EnvFilter> {
        let mut filter = match self.rust_log {
            Some(ref directives) => EnvFilter::try_new(directives)
                .with_context(|| format!("Failed to parse RUST_LOG {:?}", directives))?,
            None => EnvFilter::new(""),
        };

        let level = match (self.level, &self.rust_log) {
            (Some(level), _) => Some(level),
            (None, None) => Some(LogLevel::default()),
            (None, Some(_)) => None,
        };
        if let Some(level) = level {
            filter = filter.add_directive(level.to_tracing_level().into());
        }

        if let Some(ref directives) = self.filter_directives {
            for directive in directives.split(',').map(str::trim).filter(|d| !d.is_empty()) {
                filter = filter.add_directive(
                    directive
                        .parse()
                        .with_context(|| format!("Failed to parse filter directive {:?}", directive))?,
                );
            }
        }

        Ok(filter)
    }
}

/// Initialize logging with the given configuration
///
/// Sets the global subscriber; call once at startup. Logs go to stderr so
/// command output on stdout stays clean.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let filter = config.env_filter()?;
    let fmt_layer = fmt::layer().with_writer(std::io::stderr).with_target(true);

    match config.format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()?,
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .try_init()?,
    }

    Ok(())
}
