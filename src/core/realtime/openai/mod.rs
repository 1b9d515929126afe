//! OpenAI Realtime API provider.

mod client;
mod config;
mod messages;

pub use client::OpenAiRealtime;
pub use config::{
    DEFAULT_REALTIME_MODEL, OPENAI_REALTIME_URL, RealtimeVoice, TELEPHONY_AUDIO_FORMAT,
};
pub use messages::{ClientEvent, ResponseConfig, ServerEvent, SessionConfig, TurnDetection};
