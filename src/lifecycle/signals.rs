//! OS signal handling.
//!
//! SIGINT (Ctrl-C) and, on Unix, SIGTERM both mean graceful shutdown.

use crate::lifecycle::Shutdown;

/// Wait for the first termination signal, then trigger `shutdown`.
pub async fn shutdown_on_signal(shutdown: &Shutdown) {
    wait_for_termination().await;
    tracing::info!("Termination signal received");
    shutdown.trigger();
}

#[cfg(unix)]
async fn wait_for_termination() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "SIGTERM handler unavailable, listening for Ctrl-C only");
            ctrl_c().await;
            return;
        }
    };
    tokio::select! {
        _ = ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_termination() {
    ctrl_c().await;
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
