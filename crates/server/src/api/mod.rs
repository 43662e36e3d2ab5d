//! HTTP endpoint modules.
//!
//! Shared error body and helpers live here in mod.rs.

mod flashcards;
mod health;

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

// ── Shared types ─────────────────────────────────────────────────

/// Body of every non-2xx response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Status category, e.g. "Bad Request".
    pub error: String,
    pub message: String,
    /// Correlates the response with server logs.
    pub error_id: String,
    /// RFC 3339.
    pub timestamp: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: message.into(),
            error_id: Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }),
    )
}

// ── Re-exports ───────────────────────────────────────────────────

pub use flashcards::generate_flashcards;
pub use health::{favicon, health, root};
