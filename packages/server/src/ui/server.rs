//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use super::{
    handler::{dispatch_notifications, get_presence, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Hub + HTTP API server
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    pub fn new(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Build the router
    pub fn router(&self) -> Router {
        Router::new()
            .route("/ws", get(websocket_handler))
            .route("/api/health", get(health_check))
            .route("/api/notifications/dispatch", post(dispatch_notifications))
            .route("/api/presence/{user_key}", get(get_presence))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the server until Ctrl+C / SIGTERM
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    pub async fn run(
        self,
        host: String,
        port: u16,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Connect to: ws://{}/ws?user_key=<user_key>", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(
        self,
        listener: TcpListener,
        shutdown: F,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!("Tsunagi hub listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}
