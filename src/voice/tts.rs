//! Text-to-speech (TTS) processing

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use super::SpeechSynthesizer;
use crate::{Error, Result};

/// Synthesizes speech from text with `OpenAI` TTS
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    voice: String,
    speed: f32,
    model: String,
}

impl TextToSpeech {
    /// Create a new TTS instance using `OpenAI`
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_openai(
        api_key: SecretString,
        base_url: &str,
        model: String,
        voice: String,
        speed: f32,
    ) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config("OpenAI API key required for TTS".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            voice,
            speed: speed.clamp(0.25, 4.0),
            model,
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for TextToSpeech {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
        }

        if text.trim().is_empty() {
            return Err(Error::Validation("empty text for speech synthesis".to_string()));
        }

        let request = TtsRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            speed: self.speed,
        };

        let response = self
            .client
            .post(format!("{}/audio/speech", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("OpenAI TTS request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "OpenAI TTS error");
            return Err(Error::from_status("OpenAI TTS", status, &body));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| Error::Upstream(format!("failed to read TTS audio: {e}")))?;
        tracing::debug!(audio_bytes = audio.len(), voice = %self.voice, "speech synthesized");
        Ok(audio.to_vec())
    }
}
