use serde::Deserialize;
use std::path::Path;

use super::ConfigError;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration; anything left out
/// falls back to the environment variable or the built-in default.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 3000
///   public_host: "frontdesk.example.com"
///
/// openai:
///   api_key: "sk-..."
///   realtime_model: "gpt-4o-realtime-preview"
///   chat_model: "gpt-4o-mini"
///
/// receptionist:
///   mode: "realtime"
///   voice: "alloy"
///   instructions: "You are the receptionist for Example Dental..."
///   greeting: "Greet the caller and ask how you can help."
///
/// turn:
///   policy: "silence_timeout"
///   silence_ms: 900
///   poll_interval_ms: 200
///
/// security:
///   cors_allowed_origins: "*"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub openai: Option<OpenAiYaml>,
    pub receptionist: Option<ReceptionistYaml>,
    pub turn: Option<TurnYaml>,
    pub security: Option<SecurityYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Public hostname the telephony provider can reach, used to build the
    /// `wss://{public_host}/media` stream URL
    pub public_host: Option<String>,
}

/// AI backend configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct OpenAiYaml {
    pub api_key: Option<String>,
    pub realtime_model: Option<String>,
    pub chat_model: Option<String>,
}

/// Receptionist persona configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ReceptionistYaml {
    /// Operating mode: "realtime" or "turns"
    pub mode: Option<String>,
    pub voice: Option<String>,
    /// Persona instructions sent with session configuration
    pub instructions: Option<String>,
    /// Directive for the proactive greeting response
    pub greeting: Option<String>,
}

/// Turn boundary detection configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TurnYaml {
    /// "explicit_stop" or "silence_timeout"
    pub policy: Option<String>,
    pub silence_ms: Option<u64>,
    pub poll_interval_ms: Option<u64>,
}

/// Security configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SecurityYaml {
    /// CORS allowed origins (comma-separated list or "*" for all)
    pub cors_allowed_origins: Option<String>,
}

impl YamlConfig {
    /// Load and parse a YAML configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        serde_yaml::from_str(&contents).map_err(|e| ConfigError::Yaml {
            path: path.display().to_string(),
            source: e,
        })
    }
}
