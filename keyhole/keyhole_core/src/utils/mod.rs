//! Utility types: logging setup and the secure-markup configuration.

pub mod config;
pub mod logging;

pub use config::{SecureConfig, SecureOptions, RESERVED_ATTRIBUTES};
pub use logging::LogLevel;
