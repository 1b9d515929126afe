//! Telephony media stream message types.
//!
//! The provider exchanges JSON text frames over the media WebSocket. The
//! inbound side is decoded once, here, into a closed enum; everything
//! downstream matches exhaustively. Malformed frames are expected noise on
//! this connection and decode to `None` rather than an error.

use serde::{Deserialize, Serialize};

// =============================================================================
// Inbound Frames (provider -> gateway)
// =============================================================================

/// Inbound media stream frames.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event")]
pub enum InboundFrame {
    /// Socket-level handshake notice; carries nothing the bridge needs
    #[serde(rename = "connected")]
    Connected,

    /// Media stream session started
    #[serde(rename = "start")]
    Start {
        /// Start metadata
        start: StartMeta,
    },

    /// Audio chunk
    #[serde(rename = "media")]
    Media {
        /// Audio payload
        media: MediaPayload,
    },

    /// Playback checkpoint acknowledgment; not used by the bridge
    #[serde(rename = "mark")]
    Mark,

    /// Explicit end-of-media signal
    #[serde(rename = "stop")]
    Stop,

    /// Any other well-formed event; ignored
    #[serde(other)]
    Unknown,
}

/// Metadata carried by the start frame.
#[derive(Debug, Clone, Deserialize)]
pub struct StartMeta {
    /// Opaque stream identifier, used for correlation and for addressing
    /// outbound media
    #[serde(rename = "streamSid")]
    pub stream_sid: String,
}

/// Base64 audio payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaPayload {
    /// Base64-encoded audio; relayed verbatim, never decoded
    pub payload: String,
}

impl InboundFrame {
    /// Decode one raw text frame.
    ///
    /// Malformed or non-JSON frames are expected noise, not errors; they
    /// decode to `None` and must never advance bridge state.
    pub fn decode(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

// =============================================================================
// Outbound Frames (gateway -> provider)
// =============================================================================

/// Outbound media stream frames.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum OutboundFrame {
    /// Generated audio toward the caller
    #[serde(rename = "media")]
    Media {
        /// Stream this audio belongs to
        #[serde(rename = "streamSid")]
        stream_sid: String,
        /// Audio payload
        media: MediaPayload,
    },
}

impl OutboundFrame {
    /// Build an outbound media frame for a base64 payload.
    pub fn media(stream_sid: String, payload: String) -> Self {
        Self::Media {
            stream_sid,
            media: MediaPayload { payload },
        }
    }
}

// =============================================================================
// Message Routing
// =============================================================================

/// Messages routed to the per-call sender task.
///
/// The sender task is the only writer on the telephony socket, so relay
/// order on that leg is the order of this channel.
#[derive(Debug)]
pub enum MediaRoute {
    /// The start frame arrived; outbound media is addressed to this stream
    StreamStarted(String),
    /// Generated audio from the AI leg (base64 payload)
    AudioDelta(String),
    /// Close the telephony socket
    Close,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_start_frame() {
        let raw = r#"{"event":"start","sequenceNumber":"1","start":{"streamSid":"MZabc123","accountSid":"AC1","tracks":["inbound"]},"streamSid":"MZabc123"}"#;
        match InboundFrame::decode(raw) {
            Some(InboundFrame::Start { start }) => assert_eq!(start.stream_sid, "MZabc123"),
            other => panic!("Expected Start frame, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_media_frame() {
        let raw = r#"{"event":"media","media":{"track":"inbound","chunk":"2","timestamp":"5","payload":"dGVzdA=="}}"#;
        match InboundFrame::decode(raw) {
            Some(InboundFrame::Media { media }) => assert_eq!(media.payload, "dGVzdA=="),
            other => panic!("Expected Media frame, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_stop_frame() {
        let raw = r#"{"event":"stop","stop":{"accountSid":"AC1","callSid":"CA1"}}"#;
        assert!(matches!(
            InboundFrame::decode(raw),
            Some(InboundFrame::Stop)
        ));
    }

    #[test]
    fn test_decode_housekeeping_frames() {
        assert!(matches!(
            InboundFrame::decode(r#"{"event":"connected","protocol":"Call","version":"1.0.0"}"#),
            Some(InboundFrame::Connected)
        ));
        assert!(matches!(
            InboundFrame::decode(r#"{"event":"mark","mark":{"name":"greeting"}}"#),
            Some(InboundFrame::Mark)
        ));
    }

    #[test]
    fn test_decode_unknown_event_is_ignored_not_error() {
        assert!(matches!(
            InboundFrame::decode(r#"{"event":"dtmf","dtmf":{"digit":"5"}}"#),
            Some(InboundFrame::Unknown)
        ));
    }

    #[test]
    fn test_decode_malformed_frames() {
        assert!(InboundFrame::decode("not json at all").is_none());
        assert!(InboundFrame::decode("").is_none());
        assert!(InboundFrame::decode(r#"{"no_event_field":true}"#).is_none());
        // A media frame missing its payload object is malformed, not Unknown
        assert!(InboundFrame::decode(r#"{"event":"media"}"#).is_none());
    }

    #[test]
    fn test_outbound_media_serialization() {
        let frame = OutboundFrame::media("MZabc123".to_string(), "dGVzdA==".to_string());
        let json = serde_json::to_string(&frame).unwrap();
        assert_eq!(
            json,
            r#"{"event":"media","streamSid":"MZabc123","media":{"payload":"dGVzdA=="}}"#
        );
    }
}
