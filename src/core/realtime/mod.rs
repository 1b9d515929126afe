//! Realtime AI session module.
//!
//! One bidirectional streaming session exists per phone call, behind the
//! [`RealtimeSession`] trait so the bridge and its tests are independent of
//! the concrete backend.

mod base;
pub mod openai;

pub use base::{
    AudioDeltaCallback, BoxedRealtimeSession, CallbackFuture, ConnectionState, RealtimeConfig,
    RealtimeError, RealtimeResult, RealtimeSession, SessionClosedCallback, SessionErrorCallback,
};
pub use openai::{OpenAiRealtime, RealtimeVoice};

/// Build the realtime session for one call from server configuration.
///
/// This is the session factory: persona text and voice selection are plain
/// configuration passed in at construction time, never process-wide state.
pub fn create_session(
    config: &crate::config::ServerConfig,
) -> RealtimeResult<BoxedRealtimeSession> {
    let session = OpenAiRealtime::new(RealtimeConfig {
        api_key: config.openai_api_key.clone(),
        model: config.realtime_model.clone(),
        voice: Some(config.voice.clone()),
        instructions: Some(config.instructions.clone()),
        greeting: Some(config.greeting.clone()),
    })?;
    Ok(Box::new(session))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ReceptionistMode, ServerConfig, TurnConfig};

    fn server_config() -> ServerConfig {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            public_host: Some("frontdesk.example.com".to_string()),
            openai_api_key: "sk-test".to_string(),
            realtime_model: "gpt-4o-realtime-preview".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
            mode: ReceptionistMode::Realtime,
            voice: "verse".to_string(),
            instructions: "Be a receptionist.".to_string(),
            greeting: "Greet the caller.".to_string(),
            turn: TurnConfig::default(),
            cors_allowed_origins: None,
        }
    }

    #[test]
    fn test_create_session_from_config() {
        let session = create_session(&server_config());
        assert!(session.is_ok());
        assert!(!session.unwrap().is_ready());
    }

    #[test]
    fn test_create_session_requires_api_key() {
        let mut config = server_config();
        config.openai_api_key = String::new();
        assert!(create_session(&config).is_err());
    }
}
