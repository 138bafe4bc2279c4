//! Speech processing
//!
//! Speech-to-text feeds the [`TranscriptionAdapter`], which cleans the raw
//! transcript with a completion call. Text-to-speech renders every tutor
//! reply to MP3.

mod stt;
mod transcribe;
mod tts;

pub use stt::SpeechToText;
pub use transcribe::TranscriptionAdapter;
pub use tts::TextToSpeech;

use async_trait::async_trait;

use crate::Result;

/// Converts recorded audio into raw text
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe audio bytes of the given MIME type
    ///
    /// # Errors
    ///
    /// Returns error if the transcription API fails
    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> Result<String>;
}

/// Renders text as encoded audio
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize text to MP3 bytes
    ///
    /// # Errors
    ///
    /// Returns error if the speech API fails
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}
