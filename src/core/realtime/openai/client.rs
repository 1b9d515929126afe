//! OpenAI Realtime API client implementation.
//!
//! Implements [`RealtimeSession`] over OpenAI's WebSocket-based Realtime API.
//!
//! # API Reference
//!
//! - Endpoint: `wss://api.openai.com/v1/realtime?model=<model>`
//! - Protocol: WebSocket with JSON events
//! - Audio: base64-encoded G.711 u-law, passed through unmodified
//!
//! # Lifecycle
//!
//! One session per phone call: connect, configure, greet, relay, disconnect.
//! There is no reconnection; if the backend drops, the close callback fires
//! and the lifecycle manager closes the telephony leg.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, Message};

use super::config::{DEFAULT_REALTIME_MODEL, OPENAI_REALTIME_URL, RealtimeVoice, TELEPHONY_AUDIO_FORMAT};
use super::messages::{ClientEvent, ResponseConfig, ServerEvent, SessionConfig, TurnDetection};
use crate::core::realtime::base::{
    AudioDeltaCallback, ConnectionState, RealtimeConfig, RealtimeError, RealtimeResult,
    RealtimeSession, SessionClosedCallback, SessionErrorCallback,
};

/// Channel capacity for outgoing WebSocket events.
const WS_CHANNEL_CAPACITY: usize = 256;

/// OpenAI Realtime API client.
///
/// The `ready` flag is shared with the spawned connection task via
/// `Arc<AtomicBool>` so readiness checks never lock.
pub struct OpenAiRealtime {
    /// Configuration
    config: RealtimeConfig,
    /// Parsed voice
    voice: RealtimeVoice,
    /// Lifecycle state
    state: ConnectionState,
    /// Ready flag shared with the connection task
    ready: Arc<AtomicBool>,
    /// Set by disconnect() so the task end does not fire the close callback
    intentional_disconnect: Arc<AtomicBool>,

    /// Outgoing event channel to the connection task
    event_tx: Option<mpsc::Sender<ClientEvent>>,
    /// Connection task handle
    task: Option<JoinHandle<()>>,

    /// Callbacks, captured by the connection task at connect time
    audio_callback: Option<AudioDeltaCallback>,
    close_callback: Option<SessionClosedCallback>,
    error_callback: Option<SessionErrorCallback>,
}

impl std::fmt::Debug for OpenAiRealtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiRealtime")
            .field("voice", &self.voice)
            .field("state", &self.state)
            .field("ready", &self.ready.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl OpenAiRealtime {
    /// Create a client from configuration. Fails fast on a missing API key.
    pub fn new(config: RealtimeConfig) -> RealtimeResult<Self> {
        if config.api_key.is_empty() {
            return Err(RealtimeError::AuthenticationFailed(
                "API key is required".to_string(),
            ));
        }

        let voice = config
            .voice
            .as_deref()
            .map(RealtimeVoice::from_str_or_default)
            .unwrap_or_default();

        Ok(Self {
            config,
            voice,
            state: ConnectionState::Connecting,
            ready: Arc::new(AtomicBool::new(false)),
            intentional_disconnect: Arc::new(AtomicBool::new(false)),
            event_tx: None,
            task: None,
            audio_callback: None,
            close_callback: None,
            error_callback: None,
        })
    }

    /// Get the configured voice.
    pub fn voice(&self) -> RealtimeVoice {
        self.voice
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Build the WebSocket URL with the model parameter.
    fn build_ws_url(&self) -> String {
        let model = if self.config.model.is_empty() {
            DEFAULT_REALTIME_MODEL
        } else {
            &self.config.model
        };
        format!("{OPENAI_REALTIME_URL}?model={model}")
    }

    /// Build the initial session configuration.
    ///
    /// Backend turn detection is disabled: the gateway segments turns itself
    /// and issues explicit commits.
    fn build_session_config(&self) -> SessionConfig {
        SessionConfig {
            modalities: Some(vec!["text".to_string(), "audio".to_string()]),
            instructions: self.config.instructions.clone(),
            voice: Some(self.voice.as_str().to_string()),
            input_audio_format: Some(TELEPHONY_AUDIO_FORMAT.to_string()),
            output_audio_format: Some(TELEPHONY_AUDIO_FORMAT.to_string()),
            turn_detection: Some(TurnDetection::None {}),
        }
    }

    /// Dispatch one server event to the registered callbacks.
    async fn handle_server_event(
        event: ServerEvent,
        audio_cb: &Option<AudioDeltaCallback>,
        error_cb: &Option<SessionErrorCallback>,
    ) {
        match event {
            ServerEvent::SessionCreated { session } => {
                tracing::info!(session_id = %session.id, "Realtime session created");
            }

            ServerEvent::SessionUpdated { session } => {
                tracing::debug!(session_id = %session.id, "Realtime session updated");
            }

            ServerEvent::OutputAudioDelta { audio } => {
                if let Some(cb) = audio_cb {
                    cb(audio).await;
                }
            }

            ServerEvent::ResponseAudioDelta { delta } => {
                if let Some(cb) = audio_cb {
                    cb(delta).await;
                }
            }

            ServerEvent::ResponseDone { response } => {
                tracing::debug!(response_id = %response.id, "Response complete");
            }

            ServerEvent::Error { error } => {
                // Backend errors are non-fatal to the relay; only a close
                // event tears the call down.
                tracing::error!(
                    "Realtime backend error: {} - {}",
                    error.error_type,
                    error.message
                );
                if let Some(cb) = error_cb {
                    cb(RealtimeError::BackendError(format!(
                        "{}: {}",
                        error.error_type, error.message
                    )))
                    .await;
                }
            }

            ServerEvent::Unknown => {
                tracing::trace!("Unhandled realtime server event");
            }
        }
    }

    /// Send an event to the connection task.
    async fn send_event(&self, event: ClientEvent) -> RealtimeResult<()> {
        if let Some(sender) = self.event_tx.as_ref() {
            sender
                .send(event)
                .await
                .map_err(|e| RealtimeError::WebSocketError(e.to_string()))?;
            Ok(())
        } else {
            Err(RealtimeError::NotConnected)
        }
    }
}

#[async_trait]
impl RealtimeSession for OpenAiRealtime {
    async fn connect(&mut self) -> RealtimeResult<()> {
        if self.ready.load(Ordering::SeqCst) {
            return Ok(());
        }

        let url = self.build_ws_url();

        let request = http::Request::builder()
            .uri(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("OpenAI-Beta", "realtime=v1")
            .header(
                "Sec-WebSocket-Key",
                tungstenite::handshake::client::generate_key(),
            )
            .header("Sec-WebSocket-Version", "13")
            .header("Connection", "Upgrade")
            .header("Upgrade", "websocket")
            .header("Host", "api.openai.com")
            .body(())
            .map_err(|e| RealtimeError::ConnectionFailed(e.to_string()))?;

        let (ws_stream, _response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| RealtimeError::ConnectionFailed(e.to_string()))?;

        tracing::info!("Connected to realtime backend");

        let (mut ws_sink, mut ws_stream) = ws_stream.split();

        let (tx, mut rx) = mpsc::channel::<ClientEvent>(WS_CHANNEL_CAPACITY);
        self.event_tx = Some(tx);

        let audio_cb = self.audio_callback.clone();
        let close_cb = self.close_callback.clone();
        let error_cb = self.error_callback.clone();
        let ready = self.ready.clone();
        let intentional_disconnect = self.intentional_disconnect.clone();

        // Connection established; mark ready before the first event is sent
        self.ready.store(true, Ordering::SeqCst);
        self.state = ConnectionState::Ready;

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    // Outgoing events, in submission order
                    event = rx.recv() => {
                        let Some(event) = event else { break };
                        let json = match serde_json::to_string(&event) {
                            Ok(j) => j,
                            Err(e) => {
                                tracing::error!("Failed to serialize client event: {}", e);
                                continue;
                            }
                        };
                        if let Err(e) = ws_sink.send(Message::Text(json.into())).await {
                            tracing::error!("Failed to send realtime event: {}", e);
                            break;
                        }
                    }

                    // Incoming events
                    msg = ws_stream.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                match serde_json::from_str::<ServerEvent>(&text) {
                                    Ok(event) => {
                                        Self::handle_server_event(event, &audio_cb, &error_cb).await;
                                    }
                                    Err(e) => {
                                        tracing::warn!("Failed to parse server event: {}", e);
                                    }
                                }
                            }
                            Some(Ok(Message::Close(_))) => {
                                tracing::info!("Realtime backend closed the connection");
                                break;
                            }
                            Some(Ok(Message::Ping(data))) => {
                                if let Err(e) = ws_sink.send(Message::Pong(data)).await {
                                    tracing::error!("Failed to send pong: {}", e);
                                }
                            }
                            Some(Ok(_)) => {}
                            Some(Err(e)) => {
                                tracing::error!("Realtime WebSocket error: {}", e);
                                break;
                            }
                            None => break,
                        }
                    }
                }
            }

            ready.store(false, Ordering::SeqCst);

            // Propagate closure to the telephony leg, unless this teardown
            // was initiated from that side already.
            if !intentional_disconnect.load(Ordering::SeqCst)
                && let Some(cb) = close_cb
            {
                cb().await;
            }

            tracing::debug!("Realtime connection task ended");
        });

        self.task = Some(handle);

        // Configure the session, then request the proactive greeting. The
        // caller has not spoken yet; the receptionist talks first.
        self.send_event(ClientEvent::SessionUpdate {
            session: self.build_session_config(),
        })
        .await?;

        if let Some(greeting) = self.config.greeting.clone() {
            self.send_event(ClientEvent::ResponseCreate {
                response: Some(ResponseConfig {
                    instructions: Some(greeting),
                }),
            })
            .await?;
        }

        Ok(())
    }

    async fn disconnect(&mut self) -> RealtimeResult<()> {
        self.state = ConnectionState::Closing;

        // Suppress the close callback for a locally initiated teardown
        self.intentional_disconnect.store(true, Ordering::SeqCst);

        // Dropping the sender ends the connection task's send loop
        self.event_tx = None;

        if let Some(handle) = self.task.take() {
            handle.abort();
        }

        self.ready.store(false, Ordering::SeqCst);
        self.state = ConnectionState::Closed;

        tracing::info!("Disconnected from realtime backend");
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn append_audio(&mut self, audio: &str) -> RealtimeResult<()> {
        if !self.is_ready() {
            return Err(RealtimeError::NotConnected);
        }

        self.send_event(ClientEvent::InputAudioBufferAppend {
            audio: audio.to_string(),
        })
        .await
    }

    async fn commit_input(&mut self) -> RealtimeResult<()> {
        if !self.is_ready() {
            return Err(RealtimeError::NotConnected);
        }

        self.send_event(ClientEvent::InputAudioBufferCommit).await
    }

    async fn create_response(&mut self) -> RealtimeResult<()> {
        if !self.is_ready() {
            return Err(RealtimeError::NotConnected);
        }

        self.send_event(ClientEvent::ResponseCreate { response: None })
            .await
    }

    fn on_audio(&mut self, callback: AudioDeltaCallback) {
        self.audio_callback = Some(callback);
    }

    fn on_close(&mut self, callback: SessionClosedCallback) {
        self.close_callback = Some(callback);
    }

    fn on_error(&mut self, callback: SessionErrorCallback) {
        self.error_callback = Some(callback);
    }
}

// =============================================================================
// Tests
// =============================================================================
