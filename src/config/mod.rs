//! Configuration management for the tutor gateway
//!
//! Built once at startup and shared read-only with every handler.
//! Priority, lowest first: built-in defaults, TOML file, environment.

pub mod file;

use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::SecretString;

use crate::persona::Persona;
use crate::session::SessionConfig;
use crate::{Error, Result};

pub use file::{ConfigFile, config_file_path, load_config_file};

/// Default `OpenAI` API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default listen port
pub const DEFAULT_PORT: u16 = 5000;

/// Tutor gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// `OpenAI` API credential
    pub api_key: SecretString,

    /// `OpenAI`-compatible API base URL
    pub base_url: String,

    /// HTTP server configuration
    pub server: ServerConfig,

    /// Model identifiers
    pub models: ModelConfig,

    /// Voice configuration
    pub voice: VoiceConfig,

    /// Session store configuration
    pub session: SessionConfig,

    /// Tutor persona
    pub persona: Persona,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Directory holding the browser client; the embedded page is used when unset
    pub static_dir: Option<PathBuf>,
}

/// Model identifiers for each completion use
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Tutor conversation model
    pub chat: String,

    /// Transcript clean-up model
    pub correction: String,

    /// Korean to English translation model
    pub translate: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            chat: "gpt-4".to_string(),
            correction: "gpt-4".to_string(),
            translate: "gpt-4".to_string(),
        }
    }
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// STT model (e.g. "whisper-1")
    pub stt_model: String,

    /// STT language hint
    pub stt_language: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            stt_model: "whisper-1".to_string(),
            stt_language: Some("ko".to_string()),
            tts_model: "tts-1".to_string(),
            tts_voice: "alloy".to_string(),
            tts_speed: 1.0,
        }
    }
}

impl Config {
    /// Load configuration from the config file and process environment
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or a numeric setting is malformed
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let file = load_config_file(config_path);
        Self::from_sources(file, |key| std::env::var(key).ok())
    }

    /// Resolve configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or a numeric setting is malformed
    pub fn from_sources(file: ConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let api_key = env("OPENAI_API_KEY")
            .or(file.openai_api_key)
            .ok_or_else(|| Error::Config("OPENAI_API_KEY is not set".to_string()))?;

        let base_url = env("OPENAI_BASE_URL")
            .or(file.openai_base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let server = ServerConfig {
            host: env("HOST")
                .or(file.server.host)
                .unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_env(&env, "PORT")?
                .or(file.server.port)
                .unwrap_or(DEFAULT_PORT),
            static_dir: env("MINSSEM_STATIC_DIR")
                .map(PathBuf::from)
                .or(file.server.static_dir),
        };

        let defaults = ModelConfig::default();
        let models = ModelConfig {
            chat: env("MINSSEM_CHAT_MODEL")
                .or(file.models.chat)
                .unwrap_or(defaults.chat),
            correction: env("MINSSEM_CORRECTION_MODEL")
                .or(file.models.correction)
                .unwrap_or(defaults.correction),
            translate: env("MINSSEM_TRANSLATE_MODEL")
                .or(file.models.translate)
                .unwrap_or(defaults.translate),
        };

        let defaults = VoiceConfig::default();
        let voice = VoiceConfig {
            stt_model: env("MINSSEM_STT_MODEL")
                .or(file.voice.stt_model)
                .unwrap_or(defaults.stt_model),
            stt_language: env("MINSSEM_STT_LANGUAGE")
                .or(file.voice.stt_language)
                .or(defaults.stt_language),
            tts_model: env("MINSSEM_TTS_MODEL")
                .or(file.voice.tts_model)
                .unwrap_or(defaults.tts_model),
            tts_voice: env("MINSSEM_TTS_VOICE")
                .or(file.voice.tts_voice)
                .unwrap_or(defaults.tts_voice),
            tts_speed: parse_env(&env, "MINSSEM_TTS_SPEED")?
                .or(file.voice.tts_speed)
                .unwrap_or(defaults.tts_speed),
        };

        let defaults = SessionConfig::default();
        let session = SessionConfig {
            idle_ttl: parse_env(&env, "MINSSEM_SESSION_TTL_SECS")?
                .or(file.session.ttl_secs)
                .map_or(defaults.idle_ttl, Duration::from_secs),
            max_sessions: parse_env(&env, "MINSSEM_MAX_SESSIONS")?
                .or(file.session.max_sessions)
                .unwrap_or(defaults.max_sessions),
        };

        Ok(Self {
            api_key: SecretString::from(api_key),
            base_url,
            server,
            models,
            voice,
            session,
            persona: file.persona.unwrap_or_default(),
        })
    }
}

/// Parse an optional environment value
fn parse_env<T: std::str::FromStr>(
    env: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    env(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| Error::Config(format!("invalid {key} value {raw:?}: {e}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_with_only_api_key() {
        let config =
            Config::from_sources(ConfigFile::default(), env_of(&[("OPENAI_API_KEY", "sk-1")]))
                .unwrap();

        assert_eq!(config.api_key.expose_secret(), "sk-1");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.models.chat, "gpt-4");
        assert_eq!(config.voice.stt_model, "whisper-1");
        assert_eq!(config.voice.stt_language.as_deref(), Some("ko"));
        assert_eq!(config.voice.tts_voice, "alloy");
        assert!(config.server.static_dir.is_none());
        assert_eq!(config.persona.name, "민쌤");
    }

    #[test]
    fn missing_api_key_is_config_error() {
        let result = Config::from_sources(ConfigFile::default(), env_of(&[]));
        assert!(matches!(result, Err(Error::Config(_))));

        let result = Config::from_sources(ConfigFile::default(), env_of(&[("OPENAI_API_KEY", "  ")]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn env_overrides_file() {
        let file = file::parse_config(
            r#"
            openai_api_key = "sk-file"
            [server]
            port = 8080
            [models]
            chat = "gpt-4o"
            translate = "gpt-4o-mini"
            "#,
        )
        .unwrap();

        let config = Config::from_sources(
            file,
            env_of(&[("PORT", "9000"), ("MINSSEM_CHAT_MODEL", "gpt-4.1")]),
        )
        .unwrap();

        assert_eq!(config.api_key.expose_secret(), "sk-file");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.models.chat, "gpt-4.1");
        assert_eq!(config.models.translate, "gpt-4o-mini");
    }

    #[test]
    fn malformed_port_is_rejected() {
        let result = Config::from_sources(
            ConfigFile::default(),
            env_of(&[("OPENAI_API_KEY", "sk-1"), ("PORT", "fifty")]),
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn session_ttl_from_env() {
        let config = Config::from_sources(
            ConfigFile::default(),
            env_of(&[("OPENAI_API_KEY", "sk-1"), ("MINSSEM_SESSION_TTL_SECS", "60")]),
        )
        .unwrap();
        assert_eq!(config.session.idle_ttl, Duration::from_secs(60));
    }
}
