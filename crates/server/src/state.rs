use std::sync::Arc;

use cardsmith_llm::FlashcardGenerator;

use crate::auth::TokenVerifier;
use crate::rate_limit::RateLimiter;

pub struct AppState {
    /// None when no LLM provider is configured; generation returns 503.
    pub generator: Option<FlashcardGenerator>,
    /// None when the identity provider is not configured; generation returns 503.
    pub verifier: Option<Arc<dyn TokenVerifier>>,
    pub rate_limiter: RateLimiter,
    pub llm_provider: String,
}
