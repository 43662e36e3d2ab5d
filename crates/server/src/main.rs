mod api;
mod auth;
mod cli;
mod rate_limit;
mod router;
mod state;

use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use cardsmith_core::Config;
use cardsmith_llm::FlashcardGenerator;

use crate::auth::{IdentityToolkitVerifier, TokenVerifier};
use crate::rate_limit::RateLimiter;
use crate::state::AppState;

fn build_state(config: &Config) -> Arc<AppState> {
    let generator =
        match FlashcardGenerator::from_config(&config.llm, &config.ollama, &config.generation) {
            Ok(generator) => {
                info!("Flashcard generator ready (provider: {})", config.llm.provider);
                Some(generator)
            }
            Err(e) => {
                warn!("Flashcard generator not available: {}, POST /api/flashcards/generate will return 503", e);
                None
            }
        };

    let verifier = match IdentityToolkitVerifier::from_config(&config.auth) {
        Some(verifier) => Some(Arc::new(verifier) as Arc<dyn TokenVerifier>),
        None => {
            warn!("IDENTITY_API_KEY not set, authenticated routes will return 503");
            None
        }
    };

    Arc::new(AppState {
        generator,
        verifier,
        rate_limiter: RateLimiter::from_config(&config.rate_limit),
        llm_provider: config.llm.provider.clone(),
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, draining connections");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // .env must be loaded before clap reads env-backed flags.
    cardsmith_core::config::load_dotenv();
    let cli = cli::Cli::parse();
    let config = cli.load_config();
    config.log_summary();

    let state = build_state(&config);
    let app = router::build_router(state, &config.server);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
