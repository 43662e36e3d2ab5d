//! Liveness and status endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

pub const BANNER: &str = "Flashcard Generator Backend is running.";

pub async fn root() -> &'static str {
    BANNER
}

pub async fn favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub llm_provider: String,
    pub llm_configured: bool,
    pub auth_configured: bool,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        llm_provider: state.llm_provider.clone(),
        llm_configured: state.generator.is_some(),
        auth_configured: state.verifier.is_some(),
    })
}
