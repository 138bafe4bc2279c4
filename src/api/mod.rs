//! HTTP API server for the tutor gateway

pub mod health;
pub mod session;
pub mod translate;
pub mod tutor;

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::response::Html;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::config::{Config, DEFAULT_PORT, ModelConfig};
use crate::llm::{CompletionClient, OpenAiChat};
use crate::persona::Persona;
use crate::session::{SessionConfig, SessionStore};
use crate::voice::{SpeechSynthesizer, SpeechToText, TextToSpeech, Transcriber, TranscriptionAdapter};
use crate::{Error, Result};

/// Browser client served at `/` when no static directory is configured
const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Shared state for API handlers
pub struct ApiState {
    /// Conversation sessions keyed by cookie
    pub sessions: SessionStore,
    /// Language-model completions
    pub completion: Arc<dyn CompletionClient>,
    /// Audio to corrected learner text
    pub transcription: TranscriptionAdapter,
    /// Reply text to audio
    pub speech: Arc<dyn SpeechSynthesizer>,
    /// Model identifiers
    pub models: ModelConfig,
}

/// Configuration for building an API server
pub struct ApiServerBuilder {
    completion: Arc<dyn CompletionClient>,
    transcriber: Arc<dyn Transcriber>,
    speech: Arc<dyn SpeechSynthesizer>,
    models: ModelConfig,
    persona: Persona,
    session_config: SessionConfig,
    host: String,
    port: u16,
    static_dir: Option<PathBuf>,
}

impl ApiServerBuilder {
    /// Create a new API server builder around the three external collaborators
    #[must_use]
    pub fn new(
        completion: Arc<dyn CompletionClient>,
        transcriber: Arc<dyn Transcriber>,
        speech: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        Self {
            completion,
            transcriber,
            speech,
            models: ModelConfig::default(),
            persona: Persona::default(),
            session_config: SessionConfig::default(),
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            static_dir: None,
        }
    }

    /// Create a builder wired to the `OpenAI` HTTP APIs
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty
    pub fn from_config(config: &Config) -> Result<Self> {
        let completion = OpenAiChat::new(config.api_key.clone(), &config.base_url)?;
        let stt = SpeechToText::new_whisper(
            config.api_key.clone(),
            &config.base_url,
            config.voice.stt_model.clone(),
            config.voice.stt_language.clone(),
        )?;
        let tts = TextToSpeech::new_openai(
            config.api_key.clone(),
            &config.base_url,
            config.voice.tts_model.clone(),
            config.voice.tts_voice.clone(),
            config.voice.tts_speed,
        )?;

        Ok(Self::new(Arc::new(completion), Arc::new(stt), Arc::new(tts))
            .models(config.models.clone())
            .persona(config.persona.clone())
            .session_config(config.session)
            .bind(config.server.host.clone(), config.server.port)
            .static_dir(config.server.static_dir.clone()))
    }

    /// Set the model identifiers
    #[must_use]
    pub fn models(mut self, models: ModelConfig) -> Self {
        self.models = models;
        self
    }

    /// Set the tutor persona
    #[must_use]
    pub fn persona(mut self, persona: Persona) -> Self {
        self.persona = persona;
        self
    }

    /// Set session expiry and capacity
    #[must_use]
    pub const fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Set the bind address
    #[must_use]
    pub fn bind(mut self, host: String, port: u16) -> Self {
        self.host = host;
        self.port = port;
        self
    }

    /// Set the static files directory for serving the web client
    #[must_use]
    pub fn static_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.static_dir = dir;
        self
    }

    /// Build the API server
    #[must_use]
    pub fn build(self) -> ApiServer {
        let transcription = TranscriptionAdapter::new(
            self.transcriber,
            self.completion.clone(),
            self.models.correction.clone(),
        );

        let state = Arc::new(ApiState {
            sessions: SessionStore::new(Arc::new(self.persona), self.session_config),
            completion: self.completion,
            transcription,
            speech: self.speech,
            models: self.models,
        });

        ApiServer {
            state,
            host: self.host,
            port: self.port,
            static_dir: self.static_dir,
        }
    }
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    host: String,
    port: u16,
    static_dir: Option<PathBuf>,
}

impl ApiServer {
    /// Shared handler state
    #[must_use]
    pub fn state(&self) -> Arc<ApiState> {
        self.state.clone()
    }

    /// Build the router with all routes
    #[must_use]
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .merge(tutor::router(self.state.clone()))
            .merge(translate::router(self.state.clone()))
            .merge(health::router());

        // Serve static files if configured, otherwise the embedded client
        if let Some(static_dir) = &self.static_dir {
            let index_file = static_dir.join("index.html");
            let serve_dir = ServeDir::new(static_dir).not_found_service(ServeFile::new(&index_file));

            router = router.fallback_service(serve_dir);
            tracing::info!(path = %static_dir.display(), "serving static files");
        } else {
            router = router.route("/", get(index));
        }

        // CORS layer for cross-origin requests from a separately hosted client
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        router.layer(cors).layer(TraceLayer::new_for_http())
    }

    /// Run the API server until Ctrl-C
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
            }
        })
        .await
    }

    /// Run the API server until `shutdown` resolves
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run_until(self, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<()> {
        let addr = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Config(format!("failed to bind API server on {addr}: {e}")))?;

        tracing::info!(%addr, "API server listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("API server stopped");
        Ok(())
    }
}

/// Embedded browser client
async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
