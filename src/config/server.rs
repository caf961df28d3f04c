//! # Server Configuration
//!
//! HTTP server and persistence settings loaded from environment variables.

use super::ConfigError;
use crate::constants::{
    BIND_ADDRESS_ENV, DATA_FILE_PATH_ENV, DEFAULT_BIND_ADDRESS, DEFAULT_FLUSH_ON_TAKE,
    DEFAULT_PORT, FLUSH_ON_TAKE_ENV, PORT_ENV,
};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// JSON file holding the persisted secret snapshot
    pub data_file_path: PathBuf,
    /// Interface to listen on
    pub bind_address: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Persist deletions immediately instead of waiting for the next insert.
    /// Off by default: a crash after a take and before the next insert
    /// resurrects the taken secret on restart.
    pub flush_on_take: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingVar`] when `DATA_FILE_PATH` is unset or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingVar`] when `DATA_FILE_PATH` is unset or empty.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_file_path = lookup(DATA_FILE_PATH_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .ok_or(ConfigError::MissingVar(DATA_FILE_PATH_ENV))?;

        Ok(Self {
            data_file_path,
            bind_address: value_or_default(
                &lookup,
                BIND_ADDRESS_ENV,
                IpAddr::from(DEFAULT_BIND_ADDRESS),
            ),
            port: value_or_default(&lookup, PORT_ENV, DEFAULT_PORT),
            flush_on_take: value_or_default(&lookup, FLUSH_ON_TAKE_ENV, DEFAULT_FLUSH_ON_TAKE),
        })
    }

    /// Socket address the HTTP server binds to
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}

/// Read a value or return the default when it is missing or unparsable
fn value_or_default<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
