//! Base trait and types for the realtime AI session.
//!
//! One realtime session exists per phone call: a bidirectional streaming
//! connection that accepts appended caller audio and emits generated audio
//! deltas. The trait is the seam between the call bridge and the concrete
//! backend, and is what integration tests mock.
//!
//! # Audio Format
//!
//! Audio crosses this boundary as base64 text exactly as it arrived from the
//! telephony leg; the gateway never decodes payloads.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur on the AI leg.
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// Connection to the backend failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    /// Error reported by the backend itself
    #[error("Backend error: {0}")]
    BackendError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Not connected (or not yet ready)
    #[error("Not connected")]
    NotConnected,
}

/// Result type for realtime operations.
pub type RealtimeResult<T> = Result<T, RealtimeError>;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for a realtime session.
///
/// Built per call by the session factory from [`crate::config::ServerConfig`];
/// there is no process-wide session state.
#[derive(Debug, Clone, Default)]
pub struct RealtimeConfig {
    /// API key for authentication
    pub api_key: String,

    /// Model to use (e.g. "gpt-4o-realtime-preview")
    pub model: String,

    /// Voice for generated audio
    pub voice: Option<String>,

    /// Persona instructions for the assistant
    pub instructions: Option<String>,

    /// Directive for the proactive greeting response sent right after the
    /// session is configured; `None` skips the greeting
    pub greeting: Option<String>,
}

// =============================================================================
// Connection State
// =============================================================================

/// Lifecycle state of a realtime session.
///
/// One-way: there is no transition back to `Connecting` (one session per
/// call, no reconnect).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Connection not yet established
    Connecting,
    /// Backend acknowledged the connection; audio may be appended
    Ready,
    /// Teardown in progress
    Closing,
    /// Connection fully closed
    Closed,
}

// =============================================================================
// Callback Types
// =============================================================================

/// Boxed future returned by callbacks.
pub type CallbackFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Callback for generated audio deltas. Receives the base64 payload.
pub type AudioDeltaCallback = Arc<dyn Fn(String) -> CallbackFuture + Send + Sync>;

/// Callback invoked once when the backend connection closes.
pub type SessionClosedCallback = Arc<dyn Fn() -> CallbackFuture + Send + Sync>;

/// Callback for non-fatal backend errors.
pub type SessionErrorCallback = Arc<dyn Fn(RealtimeError) -> CallbackFuture + Send + Sync>;

// =============================================================================
// Trait
// =============================================================================

/// A bidirectional streaming session with the AI backend.
///
/// Callbacks must be registered before [`connect`](Self::connect); they are
/// captured by the connection task at connect time.
#[async_trait]
pub trait RealtimeSession: Send {
    /// Open the backend connection, configure the session, and request the
    /// proactive greeting.
    async fn connect(&mut self) -> RealtimeResult<()>;

    /// Close the backend connection. Idempotent: closing an already-closed
    /// session is a no-op, never an error.
    async fn disconnect(&mut self) -> RealtimeResult<()>;

    /// Whether audio may currently be appended.
    fn is_ready(&self) -> bool;

    /// Append a base64 audio payload to the input buffer.
    ///
    /// Returns [`RealtimeError::NotConnected`] before readiness; the caller
    /// drops the payload in that case (pre-ready audio is not queued).
    async fn append_audio(&mut self, audio: &str) -> RealtimeResult<()>;

    /// Finalize the input buffer at a turn boundary.
    async fn commit_input(&mut self) -> RealtimeResult<()>;

    /// Ask the backend to generate a response for the committed input.
    async fn create_response(&mut self) -> RealtimeResult<()>;

    /// Register the generated-audio callback.
    fn on_audio(&mut self, callback: AudioDeltaCallback);

    /// Register the connection-closed callback.
    fn on_close(&mut self, callback: SessionClosedCallback);

    /// Register the backend-error callback.
    fn on_error(&mut self, callback: SessionErrorCallback);
}

/// Convenience alias for the boxed trait object held per call.
pub type BoxedRealtimeSession = Box<dyn RealtimeSession>;
