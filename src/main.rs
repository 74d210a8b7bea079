//! Frame proxy server.
//!
//! ```text
//!   frame client ──GET/POST /a──▶ ┌──────────────────────────────┐ ──▶ origin frame server
//!                                 │ http → proxy (rewrite, track, │
//!   publisher ──POST /api/frames─▶│ forward, identify)            │ ──▶ hub, analytics
//!                                 └──────────────┬───────────────┘
//!                                                ▼
//!                                           shared store
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use frame_proxy::config::loader::{load_config, load_default};
use frame_proxy::config::watcher::ConfigWatcher;
use frame_proxy::lifecycle::{signals, startup, Shutdown};
use frame_proxy::observability::{logging, metrics};
use frame_proxy::HttpServer;

#[derive(Parser)]
#[command(name = "frame-proxy", version, about = "Analytics proxy for interactive frames")]
struct Args {
    /// TOML config file. Reloaded on change.
    #[arg(short, long, env = "FRAME_PROXY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => load_default()?,
    };

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "frame-proxy starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        public_url = %config.proxy.public_url,
        identity = config.identity.enabled,
        analytics = config.analytics.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let store = startup::open_store(&config.store);

    // The watcher handle must outlive the server.
    let (config_updates, _watcher) = match &args.config {
        Some(path) => {
            let (watcher, rx) = ConfigWatcher::new(path);
            match watcher.run() {
                Ok(handle) => (rx, Some(handle)),
                Err(e) => {
                    tracing::warn!(error = %e, "Config watcher unavailable, hot reload disabled");
                    (rx, None)
                }
            }
        }
        None => (mpsc::unbounded_channel().1, None),
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config, store.clone())?;

    let shutdown = Arc::new(Shutdown::new());
    let server_shutdown = shutdown.subscribe();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        signals::shutdown_on_signal(&signal_shutdown).await;
    });

    server.run(listener, config_updates, server_shutdown).await?;

    startup::persist_store(&store);
    tracing::info!("Shutdown complete");
    Ok(())
}
