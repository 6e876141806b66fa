//! HTTP service that turns a verified zero-knowledge proof into a signed
//! Devcoff ticket credential.

pub mod config;
pub mod credential;
pub mod error;
pub mod issuance;
pub mod ledger;
pub mod routes;
pub mod state;

use axum::{
    http::{Response, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::routes::{
    health::health_handler, query::get_ticket_handler, ticket::issue_ticket_handler,
};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/ticket", post(issue_ticket_handler))
        .route("/api/ticket/:ticket_id", get(get_ticket_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .fallback(fallback)
}

async fn fallback() -> impl IntoResponse {
    Response::builder()
        .header("Content-Type", "application/json")
        .status(StatusCode::NOT_FOUND)
        .body(json!("404 Not Found").to_string())
        .expect("response building should not fail")
}
