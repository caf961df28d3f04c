//! # Initialization
//!
//! Service initialization: tracing, configuration, backing file provisioning,
//! store restoration and router construction.

use crate::config::{self, ServerConfig};
use crate::constants::DEFAULT_LOG_FILTER;
use crate::server::{self, AppState};
use crate::store::{FileSnapshot, SecretStore};
use anyhow::{Context, Result};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Initialization result containing everything needed to serve requests
#[derive(Debug)]
pub struct InitializationResult {
    /// Loaded configuration
    pub config: ServerConfig,
    /// Store shared with the request handlers
    pub store: Arc<SecretStore>,
    /// Application router
    pub router: Router,
}

/// Initialize the service
///
/// This function handles:
/// - Tracing subscriber setup
/// - Configuration loading (fails when `DATA_FILE_PATH` is missing)
/// - Creating the backing file if it does not exist yet
/// - Restoring the secret store from the backing file
/// - Router construction
///
/// # Errors
///
/// Fails on missing configuration or when the backing file can be neither
/// opened nor created.
pub async fn initialize() -> Result<InitializationResult> {
    init_tracing();

    info!("Starting one-time secret service v{}", env!("CARGO_PKG_VERSION"));

    let config = config::load_config().context("Failed to load configuration")?;
    info!(
        data_file = %config.data_file_path.display(),
        flush_on_take = config.flush_on_take,
        "Configuration loaded"
    );

    build(config).await
}

/// Build the service from an already loaded configuration
///
/// # Errors
///
/// Fails when the backing file can be neither opened nor created.
pub async fn build(config: ServerConfig) -> Result<InitializationResult> {
    let snapshot = FileSnapshot::new(&config.data_file_path);
    let created = snapshot.ensure_exists().with_context(|| {
        format!(
            "Failed to prepare secret file {}",
            config.data_file_path.display()
        )
    })?;
    if created {
        info!(data_file = %snapshot.path().display(), "Created empty secret file");
    }

    let store = Arc::new(SecretStore::open(Arc::new(snapshot), config.flush_on_take).await);
    let router = server::router(AppState::new(Arc::clone(&store)));

    Ok(InitializationResult {
        config,
        store,
        router,
    })
}

/// Bind the listener and serve until a shutdown signal arrives
///
/// # Errors
///
/// Fails when the address cannot be bound or the server stops with an error.
pub async fn serve(init: InitializationResult) -> Result<()> {
    let addr = init.config.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind HTTP listener on {addr}"))?;

    info!(%addr, "Secret service listening");

    axum::serve(listener, init.router)
        .with_graceful_shutdown(super::shutdown_signal(init.store))
        .await
        .context("HTTP server error")?;

    info!("Secret service stopped");
    Ok(())
}

/// Install the fmt subscriber, honouring `RUST_LOG`
fn init_tracing() {
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .try_init()
    {
        warn!("Tracing subscriber init returned error (already initialized?): {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn config_for(path: std::path::PathBuf) -> ServerConfig {
        ServerConfig {
            data_file_path: path,
            bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            flush_on_take: false,
        }
    }

    #[tokio::test]
    async fn test_build_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.json");

        let init = build(config_for(path.clone())).await.unwrap();

        assert!(path.exists());
        assert!(init.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_build_restores_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.json");
        std::fs::write(&path, r#"{"5d41402abc4b2a76b9719d911017c592": "hello"}"#).unwrap();

        let init = build(config_for(path)).await.unwrap();

        assert!(init.store.contains("5d41402abc4b2a76b9719d911017c592").await);
    }

    #[tokio::test]
    async fn test_build_tolerates_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.json");
        std::fs::write(&path, "this is not json").unwrap();

        let init = build(config_for(path)).await.unwrap();

        assert!(init.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_build_fails_when_file_cannot_be_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("secrets.json");

        assert!(build(config_for(path)).await.is_err());
    }
}
