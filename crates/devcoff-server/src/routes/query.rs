use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use devcoff_primitives::TicketId;
use serde_json::{json, Value};

use crate::error::{Result, ServerError};
use crate::state::AppState;

/// Issuance status for polling clients. Attendee details are not returned.
pub async fn get_ticket_handler(
    State(state): State<AppState>,
    Path(ticket_id): Path<String>,
) -> Result<(StatusCode, Json<Value>)> {
    let ticket_id = ticket_id
        .parse::<TicketId>()
        .map_err(|e| ServerError::BadRequest(format!("Invalid ticket id: {e}")))?;

    let record = match state.ledger().get(&ticket_id).await {
        Ok(Some(record)) => record,
        Ok(None) => return Err(ServerError::TicketNotFound),
        Err(e) => {
            tracing::error!(%ticket_id, "Database error when querying ticket: {}", e);
            return Err(e.into());
        }
    };

    Ok((
        StatusCode::OK,
        Json(json!({
            "ticketId": record.ticket_id,
            "exists": true,
            "createdAt": record.created_at
        })),
    ))
}
