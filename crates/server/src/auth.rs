//! Bearer-token authentication.
//!
//! Tokens are verified by an injected [`TokenVerifier`]. The production
//! verifier resolves ID tokens through the identity provider's account
//! lookup endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use cardsmith_core::config::AuthConfig;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::api::{error_response, ApiError};
use crate::state::AppState;

/// Identity established for the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedUser {
    pub uid: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<VerifiedUser, AuthError>;
}

/// Verifies ID tokens with `POST {lookup_url}?key={api_key}`.
pub struct IdentityToolkitVerifier {
    client: reqwest::Client,
    api_key: String,
    lookup_url: String,
}

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Deserialize)]
struct LookupUser {
    #[serde(rename = "localId")]
    local_id: String,
}

impl IdentityToolkitVerifier {
    pub fn new(api_key: String, lookup_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            lookup_url,
        }
    }

    /// None when no API key is configured.
    pub fn from_config(config: &AuthConfig) -> Option<Self> {
        config
            .api_key
            .as_ref()
            .map(|key| Self::new(key.clone(), config.lookup_url.clone()))
    }
}

#[async_trait]
impl TokenVerifier for IdentityToolkitVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedUser, AuthError> {
        let response = self
            .client
            .post(&self.lookup_url)
            .query(&[("key", self.api_key.as_str())])
            .json(&serde_json::json!({ "idToken": token }))
            .send()
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            debug!(status = status.as_u16(), "Identity provider rejected token");
            return Err(AuthError::InvalidToken);
        }
        if !status.is_success() {
            return Err(AuthError::Unavailable(format!("lookup returned {}", status)));
        }

        let lookup: LookupResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Unavailable(format!("unreadable lookup response: {}", e)))?;

        lookup
            .users
            .into_iter()
            .next()
            .map(|user| VerifiedUser { uid: user.local_id })
            .ok_or(AuthError::InvalidToken)
    }
}

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Rejects the request unless it carries a verifiable bearer token, then
/// stores the [`VerifiedUser`] in the request extensions.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let verifier = state.verifier.as_ref().ok_or_else(|| {
        error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "Authentication is not configured. Set IDENTITY_API_KEY.",
        )
    })?;

    let token = bearer_token(req.headers()).ok_or_else(|| {
        error_response(StatusCode::UNAUTHORIZED, "Missing or malformed Authorization header.")
    })?;

    let user = match verifier.verify(token).await {
        Ok(user) => user,
        Err(AuthError::InvalidToken) => {
            return Err(error_response(StatusCode::UNAUTHORIZED, "Invalid or expired token."));
        }
        Err(e @ AuthError::Unavailable(_)) => {
            warn!(error = %e, "Token verification failed");
            return Err(error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "Authentication service unavailable, please try again later.",
            ));
        }
    };

    debug!(uid = %user.uid, "Request authenticated");
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
