//! Configuration module for the Frontdesk server
//!
//! Handles server configuration from .env files, YAML files, and environment
//! variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//!
//! # Example
//! ```rust,no_run
//! use frontdesk_gateway::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable fallback
//! let config_path = PathBuf::from("frontdesk.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use thiserror::Error;
use zeroize::Zeroize;

mod env;
mod yaml;

use env::EnvConfig;
pub use yaml::YamlConfig;

/// Default persona instructions sent to the AI backend at session start.
pub const DEFAULT_INSTRUCTIONS: &str = "You are a friendly and professional phone receptionist. \
     Answer questions about the business, take messages, and help callers \
     reach the right person. Keep replies short and conversational; you are \
     speaking on a phone call.";

/// Default directive for the proactive greeting turn.
pub const DEFAULT_GREETING: &str =
    "Greet the caller warmly, say you are the receptionist, and ask how you can help.";

/// Default silence gap that ends a caller turn, in milliseconds.
pub const DEFAULT_TURN_SILENCE_MS: u64 = 900;

/// Default interval between silence checks, in milliseconds.
pub const DEFAULT_TURN_POLL_INTERVAL_MS: u64 = 200;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required value is absent from every source
    #[error("Missing required configuration: {0}")]
    Missing(&'static str),

    /// A value was present but could not be parsed
    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },

    /// Configuration file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed
    #[error("Failed to parse config file {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Operating mode for the receptionist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReceptionistMode {
    /// Streaming bridge: telephony media stream paired with a realtime AI
    /// session (the primary path)
    #[default]
    Realtime,
    /// Webhook-driven speech gathering answered via chat completion
    Turns,
}

impl ReceptionistMode {
    /// Parse a mode name; unknown values are rejected.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "realtime" | "streaming" => Some(Self::Realtime),
            "turns" | "turn_based" => Some(Self::Turns),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReceptionistMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Realtime => write!(f, "realtime"),
            Self::Turns => write!(f, "turns"),
        }
    }
}

/// How the end of a caller utterance is detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnPolicyKind {
    /// The telephony provider's explicit stop frame is the boundary.
    /// Unsuitable for continuous multi-turn media streams: it conflates
    /// "utterance done" with "call media paused".
    ExplicitStop,
    /// A silence gap exceeding the configured threshold is the boundary
    #[default]
    SilenceTimeout,
}

impl TurnPolicyKind {
    /// Parse a policy name; unknown values are rejected.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "explicit_stop" | "stop" => Some(Self::ExplicitStop),
            "silence_timeout" | "silence" => Some(Self::SilenceTimeout),
            _ => None,
        }
    }
}

/// Turn boundary detection settings.
#[derive(Debug, Clone)]
pub struct TurnConfig {
    pub policy: TurnPolicyKind,
    /// Silence gap that ends a turn (silence_timeout policy)
    pub silence_ms: u64,
    /// Interval between silence checks
    pub poll_interval_ms: u64,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            policy: TurnPolicyKind::default(),
            silence_ms: DEFAULT_TURN_SILENCE_MS,
            poll_interval_ms: DEFAULT_TURN_POLL_INTERVAL_MS,
        }
    }
}

/// Server configuration
///
/// Contains everything needed to run the Frontdesk gateway:
/// - Server settings (host, port, public hostname)
/// - AI backend credential and model selection
/// - Receptionist persona (mode, voice, instructions, greeting)
/// - Turn boundary detection settings
/// - Security settings (CORS)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Public hostname the telephony provider dials back to for the media
    /// stream; required in realtime mode
    pub public_host: Option<String>,

    /// OpenAI API key, used for both the realtime and chat endpoints
    pub openai_api_key: String,
    pub realtime_model: String,
    pub chat_model: String,

    pub mode: ReceptionistMode,
    /// Voice for generated audio (e.g. "alloy", "sage")
    pub voice: String,
    /// Persona instructions sent with session configuration
    pub instructions: String,
    /// Directive for the proactive greeting response
    pub greeting: String,

    pub turn: TurnConfig,

    /// CORS allowed origins (comma-separated list or "*" for all).
    /// Default: None (same-origin only)
    pub cors_allowed_origins: Option<String>,
}

/// Zeroize the credential when ServerConfig is dropped so the key does not
/// linger in freed memory.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        self.openai_api_key.zeroize();
    }
}

impl ServerConfig {
    /// Load configuration from environment variables only.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::merge(YamlConfig::default(), EnvConfig::load())
    }

    /// Load configuration from a YAML file, with environment variables
    /// filling any gaps.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::merge(YamlConfig::from_file(path)?, EnvConfig::load())
    }

    /// Socket address string for binding.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The media stream URL handed to the telephony provider.
    ///
    /// Only meaningful in realtime mode, where validation guarantees
    /// `public_host` is set.
    pub fn media_stream_url(&self) -> Option<String> {
        self.public_host
            .as_ref()
            .map(|host| format!("wss://{host}/media"))
    }

    fn merge(yaml: YamlConfig, env: EnvConfig) -> Result<Self, ConfigError> {
        let server = yaml.server.unwrap_or_default();
        let openai = yaml.openai.unwrap_or_default();
        let receptionist = yaml.receptionist.unwrap_or_default();
        let turn = yaml.turn.unwrap_or_default();
        let security = yaml.security.unwrap_or_default();

        let port = match server.port {
            Some(p) => p,
            None => parse_or(env.port, "PORT", 3000)?,
        };

        let mode = match receptionist.mode.or(env.mode) {
            Some(raw) => ReceptionistMode::parse(&raw).ok_or(ConfigError::Invalid {
                name: "RECEPTIONIST_MODE",
                value: raw,
            })?,
            None => ReceptionistMode::default(),
        };

        let policy = match turn.policy.or(env.turn_policy) {
            Some(raw) => TurnPolicyKind::parse(&raw).ok_or(ConfigError::Invalid {
                name: "TURN_POLICY",
                value: raw,
            })?,
            None => TurnPolicyKind::default(),
        };

        let silence_ms = match turn.silence_ms {
            Some(v) => v,
            None => parse_or(env.turn_silence_ms, "TURN_SILENCE_MS", DEFAULT_TURN_SILENCE_MS)?,
        };
        let poll_interval_ms = match turn.poll_interval_ms {
            Some(v) => v,
            None => parse_or(
                env.turn_poll_interval_ms,
                "TURN_POLL_INTERVAL_MS",
                DEFAULT_TURN_POLL_INTERVAL_MS,
            )?,
        };

        let config = Self {
            host: server.host.or(env.host).unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            public_host: server.public_host.or(env.public_host),
            openai_api_key: openai
                .api_key
                .or(env.openai_api_key)
                .ok_or(ConfigError::Missing("OPENAI_API_KEY"))?,
            realtime_model: openai
                .realtime_model
                .or(env.realtime_model)
                .unwrap_or_else(|| "gpt-4o-realtime-preview".to_string()),
            chat_model: openai
                .chat_model
                .or(env.chat_model)
                .unwrap_or_else(|| "gpt-4o-mini".to_string()),
            mode,
            voice: receptionist
                .voice
                .or(env.voice)
                .unwrap_or_else(|| "alloy".to_string()),
            instructions: receptionist
                .instructions
                .or(env.instructions)
                .unwrap_or_else(|| DEFAULT_INSTRUCTIONS.to_string()),
            greeting: receptionist
                .greeting
                .or(env.greeting)
                .unwrap_or_else(|| DEFAULT_GREETING.to_string()),
            turn: TurnConfig {
                policy,
                silence_ms,
                poll_interval_ms,
            },
            cors_allowed_origins: security.cors_allowed_origins.or(env.cors_allowed_origins),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.mode == ReceptionistMode::Realtime && self.public_host.is_none() {
            return Err(ConfigError::Missing("PUBLIC_HOST"));
        }
        if self.turn.silence_ms == 0 {
            return Err(ConfigError::Invalid {
                name: "TURN_SILENCE_MS",
                value: "0".to_string(),
            });
        }
        if self.turn.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                name: "TURN_POLL_INTERVAL_MS",
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

/// Parse an optional string into `T`, falling back to `default` when absent.
fn parse_or<T: std::str::FromStr>(
    raw: Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}
