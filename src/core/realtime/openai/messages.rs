//! OpenAI Realtime API WebSocket message types.
//!
//! All events are JSON-encoded text frames over the WebSocket.
//!
//! Client events (sent to the backend):
//! - session.update - Establish persona instructions and voice
//! - input_audio_buffer.append - Append caller audio
//! - input_audio_buffer.commit - Finalize the input buffer at a turn boundary
//! - response.create - Generate a response
//!
//! Server events (received from the backend):
//! - session.created / session.updated - Session acknowledgments
//! - output_audio.delta (and the response.audio.delta alias) - Generated audio
//! - response.done - Response complete
//! - error - Backend error, non-fatal to the relay

use serde::{Deserialize, Serialize};

// =============================================================================
// Session Configuration
// =============================================================================

/// Session configuration carried by `session.update`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Response modalities (text, audio)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modalities: Option<Vec<String>>,

    /// Persona instructions for the assistant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    /// Voice for audio output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,

    /// Input audio format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_format: Option<String>,

    /// Output audio format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_audio_format: Option<String>,

    /// Turn detection configuration. The gateway does its own turn
    /// segmentation, so this is always [`TurnDetection::None`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_detection: Option<TurnDetection>,
}

/// Backend-side turn detection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TurnDetection {
    /// No backend turn detection; commits are issued explicitly
    #[serde(rename = "none")]
    None {},
}

/// Per-response overrides carried by `response.create`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseConfig {
    /// Instructions for this response only (used for the proactive greeting)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

// =============================================================================
// Client Events (sent to the backend)
// =============================================================================

/// Client events sent to the OpenAI Realtime API.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Update session configuration
    #[serde(rename = "session.update")]
    SessionUpdate {
        /// Session configuration
        session: SessionConfig,
    },

    /// Append audio to the input buffer (base64 payload, passed through
    /// from the telephony leg unmodified)
    #[serde(rename = "input_audio_buffer.append")]
    InputAudioBufferAppend {
        /// Base64-encoded audio data
        audio: String,
    },

    /// Commit the input audio buffer
    #[serde(rename = "input_audio_buffer.commit")]
    InputAudioBufferCommit,

    /// Create a response
    #[serde(rename = "response.create")]
    ResponseCreate {
        /// Response configuration
        #[serde(skip_serializing_if = "Option::is_none")]
        response: Option<ResponseConfig>,
    },
}

// =============================================================================
// Server Events (received from the backend)
// =============================================================================

/// Server events received from the OpenAI Realtime API.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Error occurred
    #[serde(rename = "error")]
    Error {
        /// Error details
        error: ApiError,
    },

    /// Session created
    #[serde(rename = "session.created")]
    SessionCreated {
        /// Session information
        session: SessionInfo,
    },

    /// Session configuration acknowledged
    #[serde(rename = "session.updated")]
    SessionUpdated {
        /// Session information
        session: SessionInfo,
    },

    /// Generated audio chunk
    #[serde(rename = "output_audio.delta")]
    OutputAudioDelta {
        /// Base64-encoded audio data
        audio: String,
    },

    /// Generated audio chunk (response-scoped event name used by some
    /// backend revisions; same payload semantics as `output_audio.delta`)
    #[serde(rename = "response.audio.delta")]
    ResponseAudioDelta {
        /// Base64-encoded audio data
        delta: String,
    },

    /// Response complete
    #[serde(rename = "response.done")]
    ResponseDone {
        /// Response information
        response: ResponseInfo,
    },

    /// Any other event type; ignored
    #[serde(other)]
    Unknown,
}

/// Session metadata from session.created / session.updated.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionInfo {
    /// Backend session ID
    pub id: String,
}

/// Response metadata from response.done.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseInfo {
    /// Backend response ID
    #[serde(default)]
    pub id: String,
}

/// Error payload from the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    /// Error type
    #[serde(rename = "type", default)]
    pub error_type: String,
    /// Human-readable message
    #[serde(default)]
    pub message: String,
}
