use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::issuance::IssuanceError;
use crate::ledger::LedgerError;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Proof failed verification")]
    InvalidProof,
    #[error("Ticket not found")]
    TicketNotFound,
    #[error("Issuance failed: {0}")]
    IssuanceFailed(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

pub type Result<T> = core::result::Result<T, ServerError>;

impl From<IssuanceError> for ServerError {
    fn from(err: IssuanceError) -> Self {
        match err {
            IssuanceError::InvalidInput(_) => ServerError::BadRequest("No proof provided".into()),
            IssuanceError::InvalidProof(_) => ServerError::InvalidProof,
            other => ServerError::IssuanceFailed(other.to_string()),
        }
    }
}

impl From<LedgerError> for ServerError {
    fn from(err: LedgerError) -> Self {
        ServerError::DatabaseError(err.to_string())
    }
}

/// Internal details are logged here and never returned to the caller.
impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::BadRequest(message) => (StatusCode::BAD_REQUEST, message.as_str()),
            ServerError::InvalidProof => (StatusCode::UNPROCESSABLE_ENTITY, "Invalid proof"),
            ServerError::TicketNotFound => (StatusCode::NOT_FOUND, "Ticket not found"),
            ServerError::IssuanceFailed(detail) => {
                tracing::error!("Error verifying proof: {detail}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Error verifying proof")
            }
            ServerError::DatabaseError(detail) => {
                tracing::error!("Database error: {detail}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
