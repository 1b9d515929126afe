//! General API handlers.

use axum::Json;
use axum::response::IntoResponse;
use serde_json::json;

/// Health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "frontdesk-gateway",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
