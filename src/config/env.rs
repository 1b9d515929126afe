//! Environment variable loading
//!
//! Collects the raw environment values the server understands. Values are
//! not validated here; merging and validation happen in [`super::ServerConfig`].

/// Raw configuration values read from the process environment.
#[derive(Debug, Default)]
pub(super) struct EnvConfig {
    pub host: Option<String>,
    pub port: Option<String>,
    pub public_host: Option<String>,
    pub openai_api_key: Option<String>,
    pub realtime_model: Option<String>,
    pub chat_model: Option<String>,
    pub mode: Option<String>,
    pub voice: Option<String>,
    pub instructions: Option<String>,
    pub greeting: Option<String>,
    pub turn_policy: Option<String>,
    pub turn_silence_ms: Option<String>,
    pub turn_poll_interval_ms: Option<String>,
    pub cors_allowed_origins: Option<String>,
}

impl EnvConfig {
    /// Read every recognized variable from the environment.
    pub fn load() -> Self {
        Self {
            host: var("HOST"),
            port: var("PORT"),
            public_host: var("PUBLIC_HOST"),
            openai_api_key: var("OPENAI_API_KEY"),
            realtime_model: var("OPENAI_REALTIME_MODEL"),
            chat_model: var("OPENAI_CHAT_MODEL"),
            mode: var("RECEPTIONIST_MODE"),
            voice: var("RECEPTIONIST_VOICE"),
            instructions: var("RECEPTIONIST_INSTRUCTIONS"),
            greeting: var("RECEPTIONIST_GREETING"),
            turn_policy: var("TURN_POLICY"),
            turn_silence_ms: var("TURN_SILENCE_MS"),
            turn_poll_interval_ms: var("TURN_POLL_INTERVAL_MS"),
            cors_allowed_origins: var("CORS_ALLOWED_ORIGINS"),
        }
    }
}

/// Fetch a variable, treating empty strings as unset.
fn var(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_empty_value_treated_as_unset() {
        unsafe {
            std::env::set_var("PUBLIC_HOST", "");
        }
        let env = EnvConfig::load();
        assert!(env.public_host.is_none());
        unsafe {
            std::env::remove_var("PUBLIC_HOST");
        }
    }

    #[test]
    #[serial]
    fn test_set_value_is_read() {
        unsafe {
            std::env::set_var("RECEPTIONIST_VOICE", "coral");
        }
        let env = EnvConfig::load();
        assert_eq!(env.voice.as_deref(), Some("coral"));
        unsafe {
            std::env::remove_var("RECEPTIONIST_VOICE");
        }
    }
}
