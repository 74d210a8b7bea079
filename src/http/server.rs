//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router (`/a`, `/api/frames`, `/health`)
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Swap in a rebuilt pipeline when a new config arrives
//! - Serve until the shutdown signal fires

use arc_swap::ArcSwap;
use axum::{
    routing::{any, get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::http::handlers::{health_handler, proxy_handler, wrap_handler};
use crate::http::request::{make_span, request_id_header};
use crate::proxy::{FrameProxy, PipelineError};
use crate::rewrite::PROXY_PATH;
use crate::store::KvStore;

/// One configuration revision and the pipeline built from it.
pub struct InnerState {
    pub config: ProxyConfig,
    pub proxy: FrameProxy,
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<ArcSwap<InnerState>>,
}

/// HTTP server for the frame proxy.
pub struct HttpServer {
    router: Router<AppState>,
    state: AppState,
    store: Arc<dyn KvStore>,
}

impl HttpServer {
    /// Build the pipeline for `config` over the shared `store`.
    pub fn new(config: ProxyConfig, store: Arc<dyn KvStore>) -> Result<Self, PipelineError> {
        let proxy = FrameProxy::from_config(&config, store.clone())?;
        let router = Self::build_router(&config);
        let state = AppState {
            inner: Arc::new(ArcSwap::from_pointee(InnerState { config, proxy })),
        };
        Ok(Self {
            router,
            state,
            store,
        })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layer settings (timeout, body limit) are fixed at startup; a reload
    /// only replaces the pipeline.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig) -> Router<AppState> {
        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(request_id_header(), MakeRequestUuid))
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(PropagateRequestIdLayer::new(request_id_header()))
            .layer(RequestBodyLimitLayer::new(config.proxy.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        Router::new()
            .route(PROXY_PATH, any(proxy_handler))
            .route("/api/frames", post(wrap_handler))
            .route("/health", get(health_handler))
            .layer(middleware)
    }

    /// The router with state attached, for in-process requests.
    pub fn router(&self) -> Router {
        self.router.clone().with_state(self.state.clone())
    }

    /// Replace the pipeline with one built from `config`.
    /// On failure the running pipeline stays in place.
    pub fn reload(&self, config: ProxyConfig) -> Result<(), PipelineError> {
        reload_pipeline(&self.state, &self.store, config)
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ProxyConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let state = self.state.clone();
        let store = self.store.clone();
        let reloader = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                if let Err(e) = reload_pipeline(&state, &store, config) {
                    tracing::error!(error = %e, "Config reload failed, keeping current pipeline");
                }
            }
        });

        let app = self.router();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get the active config.
    pub fn config(&self) -> ProxyConfig {
        self.state.inner.load().config.clone()
    }
}

fn reload_pipeline(
    state: &AppState,
    store: &Arc<dyn KvStore>,
    config: ProxyConfig,
) -> Result<(), PipelineError> {
    let proxy = FrameProxy::from_config(&config, store.clone())?;
    tracing::info!(public_url = %config.proxy.public_url, "Pipeline reloaded");
    state.inner.store(Arc::new(InnerState { config, proxy }));
    Ok(())
}
