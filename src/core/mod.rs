//! Core receptionist logic: the realtime bridge and its collaborators.

pub mod chat;
pub mod realtime;
pub mod session;
pub mod turn;

pub use chat::{ChatClient, ChatMessage, FALLBACK_REPLY, SILENT_CALLER_PROMPT};
pub use realtime::{
    BoxedRealtimeSession, ConnectionState, RealtimeConfig, RealtimeError, RealtimeResult,
    RealtimeSession, create_session,
};
pub use session::CallBridge;
pub use turn::{TurnDetector, TurnPolicy};
