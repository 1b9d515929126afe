//! Call-control webhook route configuration
//!
//! # Endpoints
//!
//! - `POST /voice` - inbound call entry point; responds with TwiML
//! - `POST /voice/respond` - gathered speech callback (turns mode)

use axum::{Router, routing::post};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::handlers::voice::{respond_handler, voice_handler};
use crate::state::AppState;

/// Create the webhook router.
pub fn create_voice_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/voice", post(voice_handler))
        .route("/voice/respond", post(respond_handler))
        .layer(TraceLayer::new_for_http())
}
