//! API Server
//!
//! Router assembly with the middleware stack, and the serve loop.

use super::{
    handlers::AppState,
    middleware::{create_cors_layer, request_id_middleware},
    routes::create_router,
};
use crate::config::ApiConfig;
use crate::errors::{ConfigurationError, SlotResult};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};

/// HTTP front end of a slot machine
pub struct ApiServer {
    config: ApiConfig,
    state: Arc<AppState>,
}

impl ApiServer {
    pub fn new(config: ApiConfig, state: Arc<AppState>) -> Self {
        Self { config, state }
    }

    /// Serve until Ctrl+C or SIGTERM
    pub async fn run(self) -> SlotResult<()> {
        let addr = self.socket_addr()?;
        let app = create_app(self.state.clone(), &self.config);

        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            ConfigurationError::InvalidValue {
                field: "api.port".to_string(),
                value: addr.to_string(),
                reason: e.to_string(),
            }
        })?;

        info!(
            %addr,
            cors = ?self.config.allowed_origins,
            request_timeout_secs = self.config.request_timeout_secs,
            result_wait_ms = self.config.result_wait_ms,
            "Reelvault API listening"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ConfigurationError::ValidationFailed(format!("server error: {}", e)))?;

        info!("API server stopped gracefully");
        Ok(())
    }

    fn socket_addr(&self) -> SlotResult<SocketAddr> {
        let ip = self
            .config
            .host
            .parse::<std::net::IpAddr>()
            .map_err(|e| ConfigurationError::InvalidValue {
                field: "api.host".to_string(),
                value: self.config.host.clone(),
                reason: e.to_string(),
            })?;
        Ok(SocketAddr::from((ip, self.config.port)))
    }
}

/// Router with the full middleware stack
pub fn create_app(state: Arc<AppState>, config: &ApiConfig) -> axum::Router {
    create_router(state)
        // Request ID middleware (first for tracing)
        .layer(axum::middleware::from_fn(request_id_middleware))
        // CORS layer (before timeout to handle preflight)
        .layer(create_cors_layer(config.allowed_origins.clone()))
        .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
        .layer(TraceLayer::new_for_http())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }
}
