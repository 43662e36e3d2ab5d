//! HTTP router construction.
//!
//! Assembles routes, CORS, body limit, and the auth layer into a single `Router`.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use cardsmith_core::config::ServerConfig;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::state::AppState;
use crate::{api, auth};

/// Preflight responses may be cached for a day.
const CORS_MAX_AGE: Duration = Duration::from_secs(86_400);

/// Build the complete application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>, server: &ServerConfig) -> Router {
    let protected = Router::new()
        .route("/api/flashcards/generate", post(api::generate_flashcards))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_auth));

    Router::new()
        .route("/", get(api::root))
        .route("/health", get(api::health))
        .route("/favicon.ico", get(api::favicon))
        .merge(protected)
        .layer(DefaultBodyLimit::max(body_limit_bytes(server.body_limit_mb)))
        .layer(cors_layer(&server.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn body_limit_bytes(megabytes: usize) -> usize {
    megabytes.saturating_mul(1024 * 1024)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
        .max_age(CORS_MAX_AGE)
}

#[cfg(test)]
mod tests;
