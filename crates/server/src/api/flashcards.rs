//! Flashcard generation endpoint.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use cardsmith_core::{FlashcardSet, InputError};
use cardsmith_llm::GenerateError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::auth::VerifiedUser;
use crate::state::AppState;

use super::{error_response, ApiError};

pub const RATE_LIMITED_MESSAGE: &str = "Too many requests, please try again later.";
pub const GENERATION_FAILED_MESSAGE: &str = "Failed to generate any valid flashcards.";

#[derive(Deserialize)]
pub struct GenerateRequest {
    /// Kept untyped so a non-string value is reported as such.
    #[serde(default)]
    pub content: Option<Value>,
}

#[derive(Serialize)]
pub struct GenerateResponse {
    pub cards: FlashcardSet,
}

fn content_text(req: &GenerateRequest) -> Result<&str, InputError> {
    match &req.content {
        None | Some(Value::Null) => Err(InputError::Missing),
        Some(Value::String(text)) => Ok(text),
        Some(_) => Err(InputError::NotText),
    }
}

fn invalid_input(e: &InputError) -> ApiError {
    error_response(StatusCode::BAD_REQUEST, format!("Invalid input: {}.", e))
}

pub async fn generate_flashcards(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<VerifiedUser>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    if !state.rate_limiter.try_acquire(&user.uid) {
        warn!(uid = %user.uid, "Rate limit exceeded");
        return Err(error_response(StatusCode::TOO_MANY_REQUESTS, RATE_LIMITED_MESSAGE));
    }

    let generator = state.generator.as_ref().ok_or_else(|| {
        error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "Flashcard generator not configured. Set LLM_PROVIDER and API keys.",
        )
    })?;

    let Json(req) = body.map_err(|rejection| {
        let status = match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        };
        error_response(status, rejection.body_text())
    })?;

    let text = content_text(&req).map_err(|e| invalid_input(&e))?;

    match generator.generate(text).await {
        Ok(cards) => {
            info!(uid = %user.uid, cards = cards.len(), "Flashcards generated");
            Ok(Json(GenerateResponse { cards }))
        }
        Err(GenerateError::InvalidInput(e)) => Err(invalid_input(&e)),
        Err(e @ GenerateError::GenerationFailed { .. }) => {
            let response = error_response(StatusCode::INTERNAL_SERVER_ERROR, GENERATION_FAILED_MESSAGE);
            error!(uid = %user.uid, error_id = %response.1.error_id, error = %e, "Flashcard generation failed");
            Err(response)
        }
    }
}
