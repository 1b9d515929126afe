//! Media stream WebSocket route configuration
//!
//! # Endpoint
//!
//! `GET /media` - WebSocket upgrade for the telephony media stream
//!
//! # Protocol
//!
//! After the upgrade the provider sends JSON text frames:
//! `connected`, then `start` (carrying the stream id), then a continuous
//! sequence of `media` frames with base64 audio, and finally `stop`.
//!
//! The gateway sends back `media` frames carrying the AI's generated audio
//! for the same stream id.

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::handlers::media::media_handler;
use crate::state::AppState;

/// Create the media stream router.
pub fn create_media_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/media", get(media_handler))
        .layer(TraceLayer::new_for_http())
}
