//! Speech-to-text (STT) processing

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};

use super::Transcriber;
use crate::{Error, Result};

/// Response from `OpenAI` Whisper transcription API
#[derive(serde::Deserialize)]
struct WhisperResponse {
    text: String,
}

/// Transcribes speech to text with `OpenAI` Whisper
pub struct SpeechToText {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    language: Option<String>,
}

impl SpeechToText {
    /// Create a new Whisper STT instance
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_whisper(
        api_key: SecretString,
        base_url: &str,
        model: String,
        language: Option<String>,
    ) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for Whisper".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            language: language.filter(|l| !l.is_empty()),
        })
    }

    /// Get file extension for MIME type
    ///
    /// Browsers record `audio/webm;codecs=opus`, so parameters are ignored.
    fn extension_for_mime(mime_type: &str) -> &'static str {
        let essence = mime_type.split(';').next().unwrap_or_default().trim();
        match essence {
            "audio/mpeg" | "audio/mp3" => "mp3",
            "audio/mp4" | "audio/m4a" | "audio/x-m4a" => "m4a",
            "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
            "audio/ogg" => "ogg",
            "audio/flac" => "flac",
            _ => "webm",
        }
    }
}

#[async_trait]
impl Transcriber for SpeechToText {
    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> Result<String> {
        tracing::debug!(audio_bytes = audio.len(), mime_type, "starting Whisper transcription");

        let filename = format!("audio.{}", Self::extension_for_mime(mime_type));
        let part = Part::bytes(audio.to_vec())
            .file_name(filename)
            .mime_str(mime_type)
            .or_else(|_| Part::bytes(audio.to_vec()).file_name("audio.webm").mime_str("audio/webm"))
            .map_err(|e| Error::Validation(format!("invalid audio MIME type: {e}")))?;

        let mut form = Form::new()
            .part("file", part)
            .text("model", self.model.clone())
            .text("response_format", "json");

        if let Some(ref lang) = self.language {
            form = form.text("language", lang.clone());
        }

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Whisper request failed");
                Error::Upstream(format!("Whisper request failed: {e}"))
            })?;

        let status = response.status();
        tracing::debug!(status = %status, "received response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Whisper API error");
            return Err(Error::from_status("Whisper", status, &body));
        }

        let result: WhisperResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse response");
            Error::Upstream(format!("failed to parse Whisper response: {e}"))
        })?;

        tracing::info!(transcript = %result.text, "transcription complete");
        Ok(result.text)
    }
}
