use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SendError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("Explorer unavailable: {0}")]
    Upstream(String),

    #[error("Explorer error: {0}")]
    Explorer(String),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Transaction error: {0}")]
    Transaction(String),
}

impl SendError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SendError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            SendError::InsufficientFunds(_) => StatusCode::UNPROCESSABLE_ENTITY,
            SendError::Upstream(_) => StatusCode::SERVICE_UNAVAILABLE,
            SendError::Explorer(_) => StatusCode::BAD_GATEWAY,
            SendError::Credential(_) | SendError::Transaction(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<reqwest::Error> for SendError {
    fn from(err: reqwest::Error) -> Self {
        SendError::Upstream(err.to_string())
    }
}

impl IntoResponse for SendError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            log::error!("Request failed: {}", self);
        } else {
            log::warn!("Request rejected: {}", self);
        }

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
