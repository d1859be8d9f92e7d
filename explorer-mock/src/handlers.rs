/// Axum HTTP handlers for SoChain-compatible endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::ledger::{LedgerError, MockLedger};
use crate::types::*;

/// Shared application state
pub type AppState = Arc<MockLedger>;

/// Custom error type for handlers
pub enum ApiError {
    Unavailable,
    BadRequest(String),
    /// HTTP 200 carrying a `fail` envelope
    Failed(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unavailable => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "explorer temporarily unavailable",
            )
                .into_response(),
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(Envelope::fail(FailData { message })),
            )
                .into_response(),
            ApiError::Failed(message) => (
                StatusCode::OK,
                Json(Envelope::fail(FailData { message })),
            )
                .into_response(),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

fn track(ledger: &MockLedger) -> Result<(), ApiError> {
    ledger.record_request();
    if ledger.is_unavailable() {
        return Err(ApiError::Unavailable);
    }
    Ok(())
}

/// GET /get_tx_unspent/{network}/{address}
/// Returns the address's unspent outputs
pub async fn get_tx_unspent(
    State(ledger): State<AppState>,
    Path((network, address)): Path<(String, String)>,
) -> Result<Json<Envelope<UnspentTxData>>, ApiError> {
    track(&ledger)?;
    if ledger.fails_lookups() {
        return Err(ApiError::Failed(format!("Unable to look up {}", address)));
    }

    let txs = ledger.unspent(&address);
    log::debug!("{} unspent outputs for {} on {}", txs.len(), address, network);

    Ok(Json(Envelope::success(UnspentTxData {
        network,
        address,
        txs,
    })))
}

/// POST /send_tx/{network}
/// Broadcasts a raw transaction (`{"tx_hex": "..."}`)
pub async fn send_tx(
    State(ledger): State<AppState>,
    Path(network): Path<String>,
    Json(req): Json<SendTxRequest>,
) -> Result<Json<Envelope<SendTxData>>, ApiError> {
    track(&ledger)?;
    if ledger.rejects_broadcasts() {
        return Err(ApiError::BadRequest("Transaction rejected by network".to_string()));
    }

    let txid = ledger.broadcast(&network, &req.tx_hex)?;
    Ok(Json(Envelope::success(SendTxData { network, txid })))
}

// ============================================================================
// MOCK HELPER ENDPOINTS (not part of the SoChain API)
// ============================================================================

/// POST /mock/fund
/// Add a spendable output to an address
pub async fn fund_address(
    State(ledger): State<AppState>,
    Json(req): Json<FundRequest>,
) -> Result<Json<UnspentTx>, ApiError> {
    log::info!("Funding {} with {} sats", req.address, req.value_sats);
    let utxo = ledger.fund(req)?;
    Ok(Json(utxo))
}

/// GET /mock/broadcasts
/// List every accepted transaction
pub async fn list_broadcasts(State(ledger): State<AppState>) -> Json<Vec<RecordedBroadcast>> {
    Json(ledger.broadcasts())
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}
