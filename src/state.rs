//! Shared application state.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::config::ServerConfig;
use crate::core::chat::{ChatClient, ChatMessage};

/// Most prior messages carried into a chat completion per call.
const MAX_HISTORY_MESSAGES: usize = 20;

/// Call histories older than this are swept (there is no end-of-call webhook
/// in turns mode, so entries expire by age).
const HISTORY_MAX_AGE: Duration = Duration::from_secs(60 * 60);

/// Sweeping kicks in once this many calls are tracked.
const HISTORY_SWEEP_THRESHOLD: usize = 256;

/// Shared application state
///
/// Holds configuration and the turns-mode collaborators. Realtime call
/// sessions keep all of their state inside their own handler task; nothing
/// here is per-media-stream.
pub struct AppState {
    pub config: ServerConfig,
    /// Chat completion client (turns mode)
    pub chat: ChatClient,
    /// Per-call transcript history, keyed by the provider's call id
    call_turns: DashMap<String, (Instant, Vec<ChatMessage>)>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let chat = ChatClient::new(
            config.openai_api_key.clone(),
            config.chat_model.clone(),
            config.instructions.clone(),
        );
        Self {
            config,
            chat,
            call_turns: DashMap::new(),
        }
    }

    /// Prior turns for a call, oldest first.
    pub fn call_history(&self, call_sid: &str) -> Vec<ChatMessage> {
        self.call_turns
            .get(call_sid)
            .map(|entry| entry.value().1.clone())
            .unwrap_or_default()
    }

    /// Record one completed exchange for a call.
    pub fn record_turn(&self, call_sid: &str, transcript: &str, reply: &str) {
        if call_sid.is_empty() {
            return;
        }

        let now = Instant::now();
        {
            let mut entry = self
                .call_turns
                .entry(call_sid.to_string())
                .or_insert_with(|| (now, Vec::new()));
            let (touched, history) = entry.value_mut();
            *touched = now;
            if !transcript.trim().is_empty() {
                history.push(ChatMessage::user(transcript));
            }
            history.push(ChatMessage::assistant(reply));
            if history.len() > MAX_HISTORY_MESSAGES {
                let excess = history.len() - MAX_HISTORY_MESSAGES;
                history.drain(..excess);
            }
        }

        if self.call_turns.len() > HISTORY_SWEEP_THRESHOLD {
            self.call_turns
                .retain(|_, (touched, _)| now.duration_since(*touched) < HISTORY_MAX_AGE);
        }
    }
}
