//! Media stream WebSocket surface.

mod handler;
mod messages;

pub use handler::media_handler;
pub use messages::{InboundFrame, MediaPayload, MediaRoute, OutboundFrame, StartMeta};
