//! TOML configuration file loading
//!
//! Supports `~/.config/minssem/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::persona::Persona;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    /// Model selection
    #[serde(default)]
    pub models: ModelsFileConfig,

    /// Voice/audio configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// Server/runtime configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Session store configuration
    #[serde(default)]
    pub session: SessionFileConfig,

    /// Persona prompt overrides
    #[serde(default)]
    pub persona: Option<Persona>,

    /// `OpenAI` API key (prefer the `OPENAI_API_KEY` environment variable)
    pub openai_api_key: Option<String>,

    /// `OpenAI`-compatible API base URL
    pub openai_base_url: Option<String>,
}

/// Model identifiers
#[derive(Debug, Default, Deserialize)]
pub struct ModelsFileConfig {
    /// Tutor conversation model (e.g. "gpt-4")
    pub chat: Option<String>,

    /// Transcript clean-up model
    pub correction: Option<String>,

    /// Korean to English translation model
    pub translate: Option<String>,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// STT language hint (ISO 639-1)
    pub stt_language: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// TTS voice identifier (e.g. "alloy")
    pub tts_voice: Option<String>,

    /// TTS speed multiplier
    pub tts_speed: Option<f32>,
}

/// Server/runtime configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// Bind address
    pub host: Option<String>,

    /// Listen port
    pub port: Option<u16>,

    /// Directory holding the browser client
    pub static_dir: Option<PathBuf>,
}

/// Session store configuration
#[derive(Debug, Default, Deserialize)]
pub struct SessionFileConfig {
    /// Idle seconds before a session expires
    pub ttl_secs: Option<u64>,

    /// Maximum live sessions
    pub max_sessions: Option<u64>,
}

/// Load the TOML config file
///
/// Uses `explicit` when given, otherwise the standard path. Returns
/// `ConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file(explicit: Option<&Path>) -> ConfigFile {
    let Some(path) = explicit.map(Path::to_path_buf).or_else(config_file_path) else {
        return ConfigFile::default();
    };

    if !path.exists() {
        if explicit.is_some() {
            tracing::warn!(path = %path.display(), "config file not found, using defaults");
        }
        return ConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match parse_config(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                ConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            ConfigFile::default()
        }
    }
}

/// Parse config file contents
///
/// # Errors
///
/// Returns error if the TOML is malformed
pub fn parse_config(content: &str) -> crate::Result<ConfigFile> {
    Ok(toml::from_str(content)?)
}

/// Return the config file path: `~/.config/minssem/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("minssem").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_file() {
        let file = parse_config(
            r#"
            [models]
            chat = "gpt-4o"

            [server]
            port = 8080

            [persona]
            opening_message = "시작해요!"
            "#,
        )
        .unwrap();

        assert_eq!(file.models.chat.as_deref(), Some("gpt-4o"));
        assert!(file.models.translate.is_none());
        assert_eq!(file.server.port, Some(8080));
        let persona = file.persona.unwrap();
        assert_eq!(persona.opening_message, "시작해요!");
        assert_eq!(persona.name, "민쌤");
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(parse_config("[server\nport = ").is_err());
    }

    #[test]
    fn missing_explicit_file_falls_back_to_defaults() {
        let file = load_config_file(Some(Path::new("/nonexistent/minssem.toml")));
        assert!(file.server.port.is_none());
        assert!(file.persona.is_none());
    }
}
