//! Two-stage transcription: raw speech-to-text, then a corrective completion

use std::sync::Arc;

use super::Transcriber;
use crate::llm::{CompletionClient, Message};
use crate::prompt::CORRECTION_PROMPT;
use crate::{Error, Result};

/// Turns recorded audio into cleaned-up learner text
///
/// The raw transcript is discarded once the correction stage returns.
#[derive(Clone)]
pub struct TranscriptionAdapter {
    stt: Arc<dyn Transcriber>,
    completion: Arc<dyn CompletionClient>,
    correction_model: String,
}

impl TranscriptionAdapter {
    /// Create a new adapter
    #[must_use]
    pub fn new(
        stt: Arc<dyn Transcriber>,
        completion: Arc<dyn CompletionClient>,
        correction_model: String,
    ) -> Self {
        Self {
            stt,
            completion,
            correction_model,
        }
    }

    /// Transcribe audio and return the corrected text
    ///
    /// # Errors
    ///
    /// Returns `Validation` for empty audio, otherwise `Upstream` when either
    /// stage fails
    pub async fn transcribe_and_correct(&self, audio: &[u8], mime_type: &str) -> Result<String> {
        if audio.is_empty() {
            return Err(Error::Validation("empty audio upload".to_string()));
        }

        let raw = self
            .stt
            .transcribe(audio, mime_type)
            .await
            .map_err(|e| e.into_upstream("transcription"))?;

        if raw.trim().is_empty() {
            return Err(Error::Upstream("transcription returned no speech".to_string()));
        }

        let messages = [Message::system(CORRECTION_PROMPT), Message::user(raw)];
        let corrected = self
            .completion
            .complete(&self.correction_model, &messages)
            .await
            .map_err(|e| e.into_upstream("transcript correction"))?;

        let text = corrected.content.trim().to_string();
        if text.is_empty() {
            return Err(Error::Upstream("transcript correction returned no text".to_string()));
        }
        tracing::debug!(
            provider = self.completion.name(),
            corrected = %text,
            "transcript corrected"
        );
        Ok(text)
    }
}
