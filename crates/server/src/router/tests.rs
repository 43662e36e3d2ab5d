use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use cardsmith_core::config::ServerConfig;
use cardsmith_llm::{FlashcardGenerator, GenerationSettings, LlmError, LlmProvider, Message};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::{body_limit_bytes, build_router};
use crate::auth::{AuthError, TokenVerifier, VerifiedUser};
use crate::rate_limit::RateLimiter;
use crate::state::AppState;

const GOOD_TOKEN: &str = "good-token";
const ORIGIN: &str = "http://localhost:5173";

// ── Test doubles ─────────────────────────────────────────────────

struct MockVerifier;

#[async_trait]
impl TokenVerifier for MockVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedUser, AuthError> {
        match token {
            GOOD_TOKEN => Ok(VerifiedUser { uid: "user-1".into() }),
            "provider-down" => Err(AuthError::Unavailable("connection refused".into())),
            _ => Err(AuthError::InvalidToken),
        }
    }
}

struct FixedProvider {
    response: &'static str,
    calls: AtomicUsize,
}

#[async_trait]
impl LlmProvider for FixedProvider {
    async fn complete(
        &self,
        _messages: Vec<Message>,
        _temperature: f32,
        _max_tokens: u32,
    ) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.to_string())
    }
}

struct Harness {
    app: Router,
    provider: Arc<FixedProvider>,
}

struct Options {
    response: &'static str,
    with_generator: bool,
    with_verifier: bool,
    rate_limit: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            response: r#"Here are your cards: [{"question": "What is H2O?", "answer": "Water"}]"#,
            with_generator: true,
            with_verifier: true,
            rate_limit: 100,
        }
    }
}

fn harness(opts: Options) -> Harness {
    let provider = Arc::new(FixedProvider {
        response: opts.response,
        calls: AtomicUsize::new(0),
    });
    let settings = GenerationSettings {
        call_timeout: Duration::from_secs(5),
        max_input_chars: 200,
        ..GenerationSettings::default()
    };
    let state = Arc::new(AppState {
        generator: opts
            .with_generator
            .then(|| FlashcardGenerator::new(provider.clone(), settings)),
        verifier: opts
            .with_verifier
            .then(|| Arc::new(MockVerifier) as Arc<dyn TokenVerifier>),
        rate_limiter: RateLimiter::new(opts.rate_limit, Duration::from_secs(900)),
        llm_provider: "mock".into(),
    });
    let server = ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
        cors_origins: vec![ORIGIN.into()],
        body_limit_mb: 1,
    };
    Harness {
        app: build_router(state, &server),
        provider,
    }
}

impl Harness {
    fn calls(&self) -> usize {
        self.provider.calls.load(Ordering::SeqCst)
    }
}

fn generate_request(token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/flashcards/generate")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, body)
}

fn assert_error_body(body: &Value, message: &str) {
    assert_eq!(body["message"], message);
    assert!(body["error"].is_string());
    assert_eq!(body["error_id"].as_str().map(str::len), Some(36));
    let timestamp = body["timestamp"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
}

// ── Public routes ────────────────────────────────────────────────

#[tokio::test]
async fn root_returns_banner() {
    let h = harness(Options::default());
    let req = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, body) = send(&h.app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("Flashcard Generator Backend is running.".into()));
}

#[tokio::test]
async fn favicon_is_no_content() {
    let h = harness(Options::default());
    let req = Request::builder().uri("/favicon.ico").body(Body::empty()).unwrap();
    let (status, _) = send(&h.app, req).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn health_reports_configuration() {
    let h = harness(Options { with_verifier: false, ..Options::default() });
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(&h.app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["llm_provider"], "mock");
    assert_eq!(body["llm_configured"], true);
    assert_eq!(body["auth_configured"], false);
}

#[tokio::test]
async fn cors_preflight_allows_client_origin() {
    let h = harness(Options::default());
    let req = Request::builder()
        .method("OPTIONS")
        .uri("/api/flashcards/generate")
        .header(header::ORIGIN, ORIGIN)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = h.app.clone().oneshot(req).await.unwrap();
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], ORIGIN);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "86400");
}

// ── Authentication ───────────────────────────────────────────────

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let h = harness(Options::default());
    let (status, body) = send(&h.app, generate_request(None, r#"{"content": "notes"}"#)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_error_body(&body, "Missing or malformed Authorization header.");
    assert_eq!(h.calls(), 0);
}

#[tokio::test]
async fn invalid_token_is_unauthorized_before_any_generation() {
    let h = harness(Options::default());
    let (status, body) =
        send(&h.app, generate_request(Some("forged"), r#"{"content": "notes"}"#)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
    assert_eq!(h.calls(), 0);
}

#[tokio::test]
async fn unreachable_identity_provider_is_unavailable() {
    let h = harness(Options::default());
    let (status, _) =
        send(&h.app, generate_request(Some("provider-down"), r#"{"content": "notes"}"#)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn unconfigured_auth_is_unavailable() {
    let h = harness(Options { with_verifier: false, ..Options::default() });
    let (status, _) =
        send(&h.app, generate_request(Some(GOOD_TOKEN), r#"{"content": "notes"}"#)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(h.calls(), 0);
}

// ── Generation ───────────────────────────────────────────────────

#[tokio::test]
async fn valid_request_returns_cards() {
    let h = harness(Options::default());
    let (status, body) = send(
        &h.app,
        generate_request(Some(GOOD_TOKEN), r#"{"content": "Water is H2O."}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"cards": [{"question": "What is H2O?", "answer": "Water"}]}));
    assert_eq!(h.calls(), 1);
}

#[tokio::test]
async fn invalid_content_is_bad_request() {
    let cases = [
        (r#"{}"#, "Invalid input: content is missing."),
        (r#"{"content": 7}"#, "Invalid input: content must be a string."),
        (r#"{"content": "   "}"#, "Invalid input: content is empty."),
    ];
    for (payload, message) in cases {
        let h = harness(Options::default());
        let (status, body) = send(&h.app, generate_request(Some(GOOD_TOKEN), payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload: {payload}");
        assert_error_body(&body, message);
        assert_eq!(h.calls(), 0);
    }
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let h = harness(Options::default());
    let (status, body) =
        send(&h.app, generate_request(Some(GOOD_TOKEN), r#"{"content": "#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bad Request");
}

#[tokio::test]
async fn over_length_content_makes_no_model_call() {
    let h = harness(Options::default());
    let payload = json!({ "content": "x".repeat(201) }).to_string();
    let (status, body) = send(&h.app, generate_request(Some(GOOD_TOKEN), &payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_body(&body, "Invalid input: content is too long: 201 characters (max 200).");
    assert_eq!(h.calls(), 0);
}

#[tokio::test]
async fn no_valid_cards_is_server_error() {
    let h = harness(Options {
        response: "I'm sorry, I cannot produce flashcards for this.",
        ..Options::default()
    });
    let (status, body) =
        send(&h.app, generate_request(Some(GOOD_TOKEN), r#"{"content": "notes"}"#)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_error_body(&body, "Failed to generate any valid flashcards.");
    assert_eq!(body["error"], "Internal Server Error");
}

#[tokio::test]
async fn unconfigured_generator_is_unavailable() {
    let h = harness(Options { with_generator: false, ..Options::default() });
    let (status, body) =
        send(&h.app, generate_request(Some(GOOD_TOKEN), r#"{"content": "notes"}"#)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Service Unavailable");
}

#[tokio::test]
async fn requests_over_the_limit_are_rejected() {
    let h = harness(Options { rate_limit: 1, ..Options::default() });
    let (first, _) =
        send(&h.app, generate_request(Some(GOOD_TOKEN), r#"{"content": "notes"}"#)).await;
    let (second, body) =
        send(&h.app, generate_request(Some(GOOD_TOKEN), r#"{"content": "notes"}"#)).await;
    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
    assert_error_body(&body, "Too many requests, please try again later.");
    assert_eq!(h.calls(), 1);
}

// ── Body limit ───────────────────────────────────────────────────

#[test]
fn body_limit_saturates_instead_of_overflowing() {
    assert_eq!(body_limit_bytes(32), 32 * 1024 * 1024);
    assert_eq!(body_limit_bytes(usize::MAX), usize::MAX);
}

#[tokio::test]
async fn oversized_body_is_payload_too_large() {
    let h = harness(Options::default());
    let payload = json!({ "content": "x".repeat(1024 * 1024 + 1) }).to_string();
    let (status, _) = send(&h.app, generate_request(Some(GOOD_TOKEN), &payload)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(h.calls(), 0);
}
