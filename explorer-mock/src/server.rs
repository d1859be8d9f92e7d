/// Axum HTTP server setup and routing

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::*;
use crate::ledger::MockLedger;

pub fn create_router(ledger: Arc<MockLedger>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health_check))

        // SoChain v2 endpoints
        .route("/get_tx_unspent/:network/:address", get(get_tx_unspent))
        .route("/send_tx/:network", post(send_tx))

        // Mock helper endpoints
        .route("/mock/fund", post(fund_address))
        .route("/mock/broadcasts", get(list_broadcasts))

        // Shared state
        .with_state(ledger)

        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(ledger: Arc<MockLedger>, host: String, port: u16) -> anyhow::Result<()> {
    let app = create_router(ledger);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    log::info!("Explorer mock server listening on http://{}", addr);
    log::info!("Funding endpoint: POST /mock/fund");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Serve the mock on an ephemeral local port
///
/// Returns the bound address; the server runs until the runtime shuts down.
pub async fn spawn_server(ledger: Arc<MockLedger>) -> anyhow::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = create_router(ledger);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            log::error!("Explorer mock server error: {}", e);
        }
    });

    log::debug!("Explorer mock spawned on {}", addr);
    Ok(addr)
}
