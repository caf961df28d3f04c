//! Shutdown signal handling

use crate::store::SecretStore;
use std::fmt;
use std::future;
use std::sync::Arc;
use tracing::{info, warn};

/// Signal that stopped the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// Ctrl-C / SIGINT
    Interrupt,
    /// SIGTERM
    Terminate,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupt => f.write_str("SIGINT"),
            Self::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Resolve once the process is asked to stop, logging how many secrets are
/// still held. Secrets already written to the snapshot survive the restart.
pub async fn shutdown_signal(store: Arc<SecretStore>) {
    let reason = wait_for_signal().await;
    let secrets = store.len().await;
    info!(
        signal = %reason,
        secrets,
        "Shutdown requested, draining in-flight requests"
    );
}

/// Wait for Ctrl-C or SIGTERM. A handler that cannot be installed never fires.
async fn wait_for_signal() -> ShutdownReason {
    let interrupt = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => ShutdownReason::Interrupt,
            Err(e) => {
                warn!(error = %e, "Failed to install Ctrl-C handler");
                future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                ShutdownReason::Terminate
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                future::pending().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = future::pending::<ShutdownReason>();

    tokio::select! {
        reason = interrupt => reason,
        reason = terminate => reason,
    }
}
