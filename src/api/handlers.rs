use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::sync::Arc;

use super::types::{SendBitcoinRequest, SendBitcoinResponse};
use crate::error::SendError;
use crate::manager::SendManager;

pub async fn send_bitcoin_handler(
    State(manager): State<Arc<SendManager>>,
    payload: Result<Json<SendBitcoinRequest>, JsonRejection>,
) -> Result<Json<SendBitcoinResponse>, SendError> {
    let Json(req) = payload.map_err(|rejection| SendError::InvalidInput(rejection.body_text()))?;

    log::info!(
        "Send request: {} BTC from {} to {}",
        req.bitcoin_to_send,
        req.sender_address,
        req.reciever_address
    );

    let response = manager.send_bitcoin(req).await?;
    Ok(Json(response))
}

/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}
