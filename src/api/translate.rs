//! Stateless Korean to English translation endpoint

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::{Deserialize, Serialize};

use super::ApiState;
use crate::Error;
use crate::llm::Message;
use crate::prompt::{TRANSLATION_ERROR, TRANSLATOR_PROMPT};

/// Build translation router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/translate", post(translate))
        .with_state(state)
}

/// Translation request
#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
}

/// Translation response
#[derive(Debug, Serialize)]
pub struct TranslateResponse {
    pub translation: String,
}

/// Translate Korean text to English with a one-off completion
///
/// Independent of any session; nothing is stored or cached.
async fn translate(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<TranslateRequest>, JsonRejection>,
) -> Result<Json<TranslateResponse>, TranslateError> {
    let Json(request) =
        payload.map_err(|e| Error::Validation(format!("invalid translate payload: {e}")))?;

    if request.text.trim().is_empty() {
        return Err(Error::Validation("empty text".to_string()).into());
    }

    let messages = [Message::system(TRANSLATOR_PROMPT), Message::user(request.text)];
    let reply = state
        .completion
        .complete(&state.models.translate, &messages)
        .await?;

    tracing::debug!(chars = reply.content.chars().count(), "translation complete");
    Ok(Json(TranslateResponse {
        translation: reply.content.trim().to_string(),
    }))
}

/// Error surfaced by `/translate`
#[derive(Debug)]
pub struct TranslateError(Error);

impl From<Error> for TranslateError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for TranslateError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: &'static str,
        }

        let status = match &self.0 {
            Error::Validation(msg) => {
                tracing::warn!(error = %msg, "invalid translate request");
                StatusCode::BAD_REQUEST
            }
            e => {
                tracing::error!(error = %e, "translation failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: TRANSLATION_ERROR,
            }),
        )
            .into_response()
    }
}
