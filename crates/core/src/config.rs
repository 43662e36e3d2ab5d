use std::env;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_parse<T: std::str::FromStr>(profile: &str, key: &str, default: T) -> T {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub ollama: OllamaConfig,
    pub generation: GenerationConfig,
    pub auth: AuthConfig,
    pub rate_limit: RateLimitConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `CARDSMITH_PROFILE` env var. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("CARDSMITH_PROFILE", "");
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            llm: LlmConfig::from_env_profiled(p),
            ollama: OllamaConfig::from_env_profiled(p),
            generation: GenerationConfig::from_env_profiled(p),
            auth: AuthConfig::from_env_profiled(p),
            rate_limit: RateLimitConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:      {}:{}, origins={}", self.server.host, self.server.port, self.server.cors_origins.join(","));
        tracing::info!("  llm:         provider={}, configured={}, temperature={}, max_tokens={}, timeout={}s",
            self.llm.provider, self.llm.is_configured(), self.llm.temperature, self.llm.max_tokens, self.llm.timeout_secs);
        tracing::info!("  ollama:      url={}", self.ollama.url);
        tracing::info!("  generation:  max_chunk_chars={}, max_input_chars={}", self.generation.max_chunk_chars, self.generation.max_input_chars);
        tracing::info!("  auth:        configured={}", self.auth.is_configured());
        tracing::info!("  rate_limit:  {} requests / {}s", self.rate_limit.max_requests, self.rate_limit.window_secs);
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins, from the comma-separated `CLIENT_URL`.
    pub cors_origins: Vec<String>,
    pub body_limit_mb: usize,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_parse(p, "PORT", 5000),
            cors_origins: split_list(&profiled_env_or(p, "CLIENT_URL", "http://localhost:5173")),
            body_limit_mb: profiled_env_parse(p, "BODY_LIMIT_MB", 32),
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

// ── LLM (Together / OpenAI / Anthropic / Gemini) ─────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "together", "openai", "anthropic", "gemini", "ollama"
    pub provider: String,
    pub together_api_key: Option<String>,
    pub together_model: String,
    pub together_base_url: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Upper bound on a single completion call, in seconds.
    pub timeout_secs: u64,
}

impl LlmConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            provider: profiled_env_or(p, "LLM_PROVIDER", "together").to_lowercase(),
            together_api_key: profiled_env_opt(p, "TOGETHER_API_KEY"),
            together_model: profiled_env_or(
                p,
                "TOGETHER_MODEL",
                "deepseek-ai/DeepSeek-R1-Distill-Llama-70B-free",
            ),
            together_base_url: profiled_env_or(p, "TOGETHER_BASE_URL", "https://api.together.xyz"),
            openai_api_key: profiled_env_opt(p, "OPENAI_API_KEY"),
            openai_model: profiled_env_or(p, "OPENAI_MODEL", "gpt-4o-mini"),
            openai_base_url: profiled_env_opt(p, "OPENAI_BASE_URL"),
            anthropic_api_key: profiled_env_opt(p, "ANTHROPIC_API_KEY"),
            anthropic_model: profiled_env_or(p, "ANTHROPIC_MODEL", "claude-sonnet-4-5-20250929"),
            gemini_api_key: profiled_env_opt(p, "GEMINI_API_KEY"),
            gemini_model: profiled_env_or(p, "GEMINI_MODEL", "gemini-1.5-flash"),
            temperature: profiled_env_parse(p, "LLM_TEMPERATURE", 0.7),
            max_tokens: profiled_env_parse(p, "LLM_MAX_TOKENS", 1024),
            timeout_secs: profiled_env_parse(p, "LLM_TIMEOUT_SECS", 60),
        }
    }

    pub fn is_configured(&self) -> bool {
        match self.provider.as_str() {
            "together" => self.together_api_key.is_some(),
            "openai" => self.openai_api_key.is_some(),
            "anthropic" | "claude" => self.anthropic_api_key.is_some(),
            "gemini" => self.gemini_api_key.is_some(),
            "ollama" => true,
            _ => false,
        }
    }
}

// ── Ollama (local models) ─────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub url: String,
    pub model: String,
}

impl OllamaConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            url: profiled_env_or(p, "OLLAMA_URL", "http://localhost:11434"),
            model: profiled_env_or(p, "OLLAMA_MODEL", "llama3.2"),
        }
    }
}

// ── Flashcard generation ──────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Maximum characters per chunk sent to the model.
    pub max_chunk_chars: usize,
    /// Inputs longer than this are rejected before any work starts.
    pub max_input_chars: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: 4000,
            max_input_chars: 20_000_000,
        }
    }
}

impl GenerationConfig {
    fn from_env_profiled(p: &str) -> Self {
        let defaults = Self::default();
        Self {
            max_chunk_chars: profiled_env_parse(p, "MAX_CHUNK_CHARS", defaults.max_chunk_chars),
            max_input_chars: profiled_env_parse(p, "MAX_INPUT_CHARS", defaults.max_input_chars),
        }
    }
}

// ── Identity provider ─────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub api_key: Option<String>,
    /// Account lookup endpoint that resolves an ID token to a user record.
    pub lookup_url: String,
}

impl AuthConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            api_key: profiled_env_opt(p, "IDENTITY_API_KEY"),
            lookup_url: profiled_env_or(
                p,
                "IDENTITY_LOOKUP_URL",
                "https://identitytoolkit.googleapis.com/v1/accounts:lookup",
            ),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

// ── Rate limiting ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_secs: u64,
}

impl RateLimitConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            max_requests: profiled_env_parse(p, "RATE_LIMIT_MAX_REQUESTS", 100),
            window_secs: profiled_env_parse(p, "RATE_LIMIT_WINDOW_SECS", 900),
        }
    }
}
