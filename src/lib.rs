//! Minssem - conversational Korean tutor backend
//!
//! This library provides the core functionality for the tutor gateway:
//! - Conversation sessions keyed by browser cookie, with an optional TOPIK level
//! - Completion calls shaped by the "민쌤" tutor persona
//! - Speech-to-text with transcript correction, and text-to-speech replies
//! - One-shot Korean to English translation
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   Browser client                     │
//! │   /start  │  /set_level  │  /chat  │  /translate     │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                 Route layer (axum)                   │
//! │   Session store  │  Persona  │  Transcription        │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │              OpenAI-compatible API                   │
//! │   Chat completions  │  Whisper STT  │  TTS           │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod llm;
pub mod persona;
pub mod prompt;
pub mod session;
pub mod voice;

pub use api::{ApiServer, ApiServerBuilder, ApiState};
pub use config::Config;
pub use error::{Error, Result};
pub use llm::{CompletionClient, Message, Role};
pub use persona::Persona;
pub use session::{Conversation, Session, SessionId, SessionStore, TopikLevel};
pub use voice::{SpeechSynthesizer, Transcriber, TranscriptionAdapter};
