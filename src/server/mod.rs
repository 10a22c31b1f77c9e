// MISOUL HTTP server
// JSON API over the chat service

mod handlers;
mod middleware;

pub use handlers::{
    create_router, health_check, metrics_endpoint, AppError, ChatRequest, ChatResponse,
    UserRequest,
};
pub use middleware::auth_middleware;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::dialogue::ChatService;

/// Main server structure, shared as axum state
pub struct ChatServer {
    service: Arc<ChatService>,
    config: ServerConfig,
    started_at: Instant,
}

impl ChatServer {
    pub fn new(service: Arc<ChatService>, config: ServerConfig) -> Self {
        Self {
            service,
            config,
            started_at: Instant::now(),
        }
    }

    /// Serve until `shutdown` is cancelled, then drain in-flight requests
    pub async fn serve(self, shutdown: CancellationToken) -> Result<()> {
        let addr: SocketAddr = self
            .config
            .bind_address
            .parse()
            .with_context(|| format!("Invalid bind address: {}", self.config.bind_address))?;

        if self.config.required_token().is_none() {
            tracing::warn!("No service API key configured; bearer authentication is disabled");
        }

        let app = create_router(Arc::new(self)).layer(TraceLayer::new_for_http());

        tracing::info!("Starting MISOUL server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .context("Server error")?;

        tracing::info!("Server stopped");
        Ok(())
    }

    pub fn service(&self) -> &Arc<ChatService> {
        &self.service
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
