use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use super::{build_router, AppState};

/// The voucher API server.
pub struct ApiServer {
    state: AppState,
    bind_addr: SocketAddr,
}

impl ApiServer {
    pub fn new(state: AppState, bind_addr: SocketAddr) -> Self {
        Self { state, bind_addr }
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Start serving requests.
    pub async fn serve(self) -> Result<()> {
        let app = build_router(self.state);
        let listener = TcpListener::bind(self.bind_addr)
            .await
            .context("Failed to bind server address")?;
        tracing::info!("voucher API listening on {}", self.bind_addr);
        axum::serve(listener, app).await.context("Server error")
    }
}
