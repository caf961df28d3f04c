//! # Service Configuration
//!
//! Process configuration loaded from environment variables.
//!
//! Only `DATA_FILE_PATH` is required. Every other setting has a sensible
//! default and an unparsable value silently falls back to that default.

mod server;

pub use server::ServerConfig;

use thiserror::Error;

/// Configuration errors that abort startup
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is unset or empty
    #[error("Missing env value {0}")]
    MissingVar(&'static str),
}

/// Load configuration from the process environment
pub fn load_config() -> Result<ServerConfig, ConfigError> {
    ServerConfig::from_env()
}
