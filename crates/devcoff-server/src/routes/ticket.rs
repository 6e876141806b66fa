use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header::ORIGIN, HeaderMap, StatusCode},
    Json,
};
use devcoff_primitives::TicketSubmission;
use serde_json::{json, Value};

use crate::credential::return_url;
use crate::error::{Result, ServerError};
use crate::issuance::IssuanceOutcome;
use crate::state::AppState;

pub async fn issue_ticket_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: core::result::Result<Json<TicketSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>)> {
    let Json(submission) = body.map_err(|e| {
        tracing::warn!("Failed to parse ticket submission: {}", e.body_text());
        ServerError::BadRequest("Invalid request body".to_string())
    })?;

    let origin = headers
        .get(ORIGIN)
        .and_then(|value| value.to_str().ok())
        .filter(|origin| !origin.is_empty() && *origin != "null")
        .unwrap_or(state.public_origin());
    tracing::info!(origin, inviting = submission.is_inviting(), "ticket requested");

    let body = match state.issuer().issue(&submission, &return_url(origin)).await? {
        IssuanceOutcome::AlreadyIssued { .. } => json!({
            "status": "success",
            "message": "Ticket already exists",
            "url": null,
            "existingTicket": true
        }),
        IssuanceOutcome::Issued { claim_url, .. } => {
            let mut body = json!({
                "status": "success",
                "message": "Proof verified successfully",
                "url": claim_url.as_str()
            });
            if let Some(link) = state.tg_link() {
                body["tgLink"] = json!(link);
            }
            body
        }
    };

    Ok((StatusCode::OK, Json(body)))
}
