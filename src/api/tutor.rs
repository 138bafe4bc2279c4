//! Tutor conversation endpoints: `/start`, `/set_level`, `/chat`
//!
//! Every successful call ends the same way: the model's reply is appended to
//! the session, rendered to speech, and returned with base64 audio.

use std::sync::Arc;

use axum::{
    Extension, Json, RequestExt, Router,
    extract::{DefaultBodyLimit, Multipart, Request, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::ApiState;
use super::session::session_middleware;
use crate::Error;
use crate::llm::Message;
use crate::prompt::CHAT_APOLOGY;
use crate::session::{SessionId, TopikLevel};

/// Whisper rejects uploads above 25 MB
const MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;

/// MIME type assumed for audio parts that do not declare one
const DEFAULT_AUDIO_MIME: &str = "audio/webm";

/// Build tutor router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/start", post(start))
        .route("/set_level", post(set_level))
        .route(
            "/chat",
            post(chat).layer(DefaultBodyLimit::max(MAX_AUDIO_BYTES)),
        )
        .layer(axum::middleware::from_fn(session_middleware))
        .with_state(state)
}

/// Successful tutor reply
#[derive(Debug, Serialize)]
pub struct TutorReply {
    pub message: String,
    pub audio: String,
    pub success: bool,
}

/// Failed tutor call; always rendered as the fixed apology
#[derive(Debug, Serialize)]
pub struct TutorFailure {
    pub message: &'static str,
    pub success: bool,
}

/// `/set_level` request body
#[derive(Debug, Deserialize)]
pub struct SetLevelRequest {
    pub level: i64,
}

/// `/chat` JSON request body
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Learner input for one chat turn
#[derive(Debug)]
enum ChatInput {
    Text(String),
    Audio { bytes: Vec<u8>, mime_type: String },
}

/// Reset the conversation and greet the learner
async fn start(
    State(state): State<Arc<ApiState>>,
    Extension(id): Extension<SessionId>,
) -> Result<Json<TutorReply>, TutorError> {
    tracing::info!(session = %id, "starting conversation");
    let messages = state.sessions.start(&id);
    respond(&state, &id, &messages).await
}

/// Record the learner's TOPIK level and let the tutor acknowledge it
async fn set_level(
    State(state): State<Arc<ApiState>>,
    Extension(id): Extension<SessionId>,
    payload: Result<Json<SetLevelRequest>, JsonRejection>,
) -> Result<Json<TutorReply>, TutorError> {
    let Json(request) =
        payload.map_err(|e| Error::Validation(format!("invalid level payload: {e}")))?;
    let level = TopikLevel::new(request.level)?;

    tracing::info!(session = %id, level = level.get(), "setting level");
    let messages = state.sessions.set_level(&id, level);
    respond(&state, &id, &messages).await
}

/// One conversational turn from typed text or recorded audio
async fn chat(
    State(state): State<Arc<ApiState>>,
    Extension(id): Extension<SessionId>,
    req: Request,
) -> Result<Json<TutorReply>, TutorError> {
    let text = match parse_chat_input(req).await? {
        ChatInput::Text(text) => text,
        ChatInput::Audio { bytes, mime_type } => {
            tracing::debug!(session = %id, audio_bytes = bytes.len(), %mime_type, "transcribing learner audio");
            state
                .transcription
                .transcribe_and_correct(&bytes, &mime_type)
                .await?
        }
    };

    if text.trim().is_empty() {
        return Err(Error::Validation("empty message".to_string()).into());
    }

    let messages = state.sessions.append_user_turn(&id, &text)?;
    respond(&state, &id, &messages).await
}

/// Complete, store the reply, synthesize speech
async fn respond(
    state: &ApiState,
    id: &SessionId,
    messages: &[Message],
) -> Result<Json<TutorReply>, TutorError> {
    let reply = state
        .completion
        .complete(&state.models.chat, messages)
        .await?;
    if reply.content.trim().is_empty() {
        return Err(Error::Upstream("completion returned empty reply".to_string()).into());
    }
    state.sessions.append_assistant_turn(id, &reply.content);

    let audio = state.speech.synthesize(&reply.content).await?;
    tracing::info!(
        session = %id,
        reply_chars = reply.content.chars().count(),
        audio_bytes = audio.len(),
        "tutor replied"
    );

    Ok(Json(TutorReply {
        message: reply.content,
        audio: base64::engine::general_purpose::STANDARD.encode(audio),
        success: true,
    }))
}

/// Read a chat turn from a JSON body or a multipart `audio` upload
async fn parse_chat_input(req: Request) -> Result<ChatInput, Error> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with("multipart/form-data") {
        let multipart = req
            .extract::<Multipart, _>()
            .await
            .map_err(|e| Error::Validation(format!("invalid multipart payload: {e}")))?;
        return parse_multipart(multipart).await;
    }

    let Json(request) = req
        .extract::<Json<ChatRequest>, _>()
        .await
        .map_err(|e| Error::Validation(format!("invalid chat payload: {e}")))?;
    Ok(ChatInput::Text(request.message))
}

/// Audio takes precedence over a `message` field in the same form
async fn parse_multipart(mut multipart: Multipart) -> Result<ChatInput, Error> {
    let mut message = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Validation(format!("failed reading multipart field: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "audio" => {
                let mime_type = field
                    .content_type()
                    .map_or_else(|| DEFAULT_AUDIO_MIME.to_string(), ToString::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| Error::Validation(format!("failed reading audio: {e}")))?;
                if bytes.is_empty() {
                    return Err(Error::Validation("empty audio upload".to_string()));
                }
                return Ok(ChatInput::Audio {
                    bytes: bytes.to_vec(),
                    mime_type,
                });
            }
            "message" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| Error::Validation(format!("failed reading message: {e}")))?;
                message = Some(text);
            }
            _ => {}
        }
    }

    message
        .map(ChatInput::Text)
        .ok_or_else(|| Error::Validation("missing `audio` file or `message` field".to_string()))
}

/// Error surfaced by a tutor route
#[derive(Debug)]
pub struct TutorError(Error);

impl From<Error> for TutorError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl TutorError {
    fn status(&self) -> StatusCode {
        match self.0 {
            Error::DuplicateTurn | Error::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for TutorError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self.0 {
            Error::DuplicateTurn => tracing::warn!("duplicate user turn rejected"),
            Error::Validation(msg) => tracing::warn!(error = %msg, "invalid tutor request"),
            e => tracing::error!(error = %e, upstream = e.is_upstream(), "tutor request failed"),
        }

        (
            status,
            Json(TutorFailure {
                message: CHAT_APOLOGY,
                success: false,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_status_mapping() {
        assert_eq!(TutorError(Error::DuplicateTurn).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            TutorError(Error::Validation("x".to_string())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            TutorError(Error::RateLimited("x".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            TutorError(Error::Upstream("x".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
