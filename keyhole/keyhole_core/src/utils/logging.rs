//! Logging utilities.
//!
//! Library crates log through `tracing` macros; binaries call
//! [`init_logging`] once to install a formatting subscriber.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::error::ConfigError;

/// Log level, ordered by increasing severity.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose debug information.
    Trace,

    /// Debug information.
    Debug,

    /// Informational messages.
    Info,

    /// Warning messages.
    #[default]
    #[serde(alias = "warning")]
    Warn,

    /// Error messages.
    Error,
}

impl LogLevel {
    /// The directive understood by `EnvFilter`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Build an `EnvFilter` for this level.
    ///
    /// `RUST_LOG` takes precedence when it is set and valid.
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.as_str()))
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warning" | "warn" => Ok(Self::Warn),
            "error" | "err" => Ok(Self::Error),
            other => Err(ConfigError::Invalid(format!("unknown log level '{}'", other))),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Install a global `tracing` subscriber writing to stderr.
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(level: LogLevel) -> Result<(), ConfigError> {
    tracing_subscriber::fmt()
        .with_env_filter(level.env_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| ConfigError::LoadFailed(format!("logging: {}", e)))?;
    debug!(%level, "Logging initialized");
    Ok(())
}
