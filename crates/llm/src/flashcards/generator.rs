//! Chunk-by-chunk flashcard generation.
//!
//! Chunks are processed sequentially in order, one model call in flight.
//! Every chunk produces an explicit [`ChunkOutcome`]; failures are logged and
//! skipped, and the outcomes are folded into a single [`FlashcardSet`].

use std::sync::Arc;
use std::time::Duration;

use cardsmith_core::config::{GenerationConfig, LlmConfig, OllamaConfig};
use cardsmith_core::{chunk_text, Chunk, Flashcard, FlashcardSet, InputError, RawInput};
use tracing::{debug, info, warn};

use crate::provider::{LlmError, LlmProvider};

use super::extract::{try_extract, ExtractError, Extraction};
use super::prompt::{build_messages, PromptVariant};

/// Sampling and sizing knobs for one generator instance.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_tokens: u32,
    /// Upper bound on one model call; expiry fails only that chunk.
    pub call_timeout: Duration,
    pub max_chunk_chars: usize,
    pub max_input_chars: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        let generation = GenerationConfig::default();
        Self {
            temperature: 0.7,
            max_tokens: 1024,
            call_timeout: Duration::from_secs(60),
            max_chunk_chars: generation.max_chunk_chars,
            max_input_chars: generation.max_input_chars,
        }
    }
}

impl GenerationSettings {
    pub fn from_config(llm: &LlmConfig, generation: &GenerationConfig) -> Self {
        Self {
            temperature: llm.temperature,
            max_tokens: llm.max_tokens,
            call_timeout: Duration::from_secs(llm.timeout_secs),
            max_chunk_chars: generation.max_chunk_chars,
            max_input_chars: generation.max_input_chars,
        }
    }
}

/// Why a single chunk produced nothing. Never crosses the request boundary.
#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    #[error("model call timed out after {0:?}")]
    Timeout(Duration),
    #[error("model call failed: {0}")]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Result of processing one chunk.
#[derive(Debug)]
pub enum ChunkOutcome {
    Generated {
        index: usize,
        cards: Vec<Flashcard>,
        discarded: usize,
    },
    Failed {
        index: usize,
        error: ChunkError,
    },
}

/// Request-level failures.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),
    #[error("no flashcards generated from {chunks} chunk(s), {failed} failed")]
    GenerationFailed { chunks: usize, failed: usize },
}

/// Turns study material into flashcards through an injected model provider.
pub struct FlashcardGenerator {
    provider: Arc<dyn LlmProvider>,
    settings: GenerationSettings,
}

impl FlashcardGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>, settings: GenerationSettings) -> Self {
        Self { provider, settings }
    }

    /// Build from config, creating the appropriate provider.
    pub fn from_config(
        llm_config: &LlmConfig,
        ollama_config: &OllamaConfig,
        generation_config: &GenerationConfig,
    ) -> Result<Self, LlmError> {
        let provider = crate::providers::create_provider(llm_config, ollama_config)?;
        Ok(Self::new(
            provider,
            GenerationSettings::from_config(llm_config, generation_config),
        ))
    }

    /// Validate, classify, chunk, and generate. Invalid input fails before
    /// any chunking or model call.
    pub async fn generate(&self, text: &str) -> Result<FlashcardSet, GenerateError> {
        let input = RawInput::new(text, self.settings.max_input_chars)?;
        let variant = PromptVariant::classify(input.as_str());
        let chunks = chunk_text(input.as_str(), self.settings.max_chunk_chars);

        info!(
            chars = input.as_str().chars().count(),
            chunks = chunks.len(),
            variant = variant.as_str(),
            "Generating flashcards"
        );

        self.generate_from_chunks(&chunks, variant).await
    }

    /// Process `chunks` in order and fold their outcomes.
    pub async fn generate_from_chunks(
        &self,
        chunks: &[Chunk],
        variant: PromptVariant,
    ) -> Result<FlashcardSet, GenerateError> {
        let mut outcomes = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            outcomes.push(self.process_chunk(chunk, variant).await);
        }
        collect_outcomes(outcomes)
    }

    async fn process_chunk(&self, chunk: &Chunk, variant: PromptVariant) -> ChunkOutcome {
        match self.try_chunk(chunk, variant).await {
            Ok(Extraction { cards, discarded }) => {
                debug!(chunk = chunk.index, cards = cards.len(), discarded, "Chunk processed");
                ChunkOutcome::Generated {
                    index: chunk.index,
                    cards,
                    discarded,
                }
            }
            Err(error) => {
                warn!(chunk = chunk.index, error = %error, "Chunk generation failed, skipping");
                ChunkOutcome::Failed {
                    index: chunk.index,
                    error,
                }
            }
        }
    }

    async fn try_chunk(&self, chunk: &Chunk, variant: PromptVariant) -> Result<Extraction, ChunkError> {
        let messages = build_messages(chunk, variant);
        debug!(chunk = chunk.index, chunk_chars = chunk.char_len(), "Sending chunk to model");

        let call = self.provider.complete(messages, self.settings.temperature, self.settings.max_tokens);
        let response = tokio::time::timeout(self.settings.call_timeout, call)
            .await
            .map_err(|_| ChunkError::Timeout(self.settings.call_timeout))??;

        debug!(chunk = chunk.index, "Model response: {}", response);
        Ok(try_extract(&response)?)
    }
}

/// Fold per-chunk outcomes, in order, into the request's flashcard set.
///
/// Fails with [`GenerateError::GenerationFailed`] when no chunk produced a
/// card. Otherwise the set is re-validated once more before returning.
pub fn collect_outcomes(outcomes: Vec<ChunkOutcome>) -> Result<FlashcardSet, GenerateError> {
    let chunks = outcomes.len();
    let (set, failed, discarded) = outcomes.into_iter().fold(
        (FlashcardSet::new(), 0usize, 0usize),
        |(mut set, failed, discarded), outcome| match outcome {
            ChunkOutcome::Generated { cards, discarded: d, .. } => {
                set.extend(cards);
                (set, failed, discarded + d)
            }
            ChunkOutcome::Failed { .. } => (set, failed + 1, discarded),
        },
    );

    let (set, dropped) = set.revalidated();
    if dropped > 0 {
        warn!(dropped, "Re-validation removed flashcards that passed the chunk filter");
    }

    if set.is_empty() {
        warn!(chunks, failed, discarded, "No flashcards generated");
        return Err(GenerateError::GenerationFailed { chunks, failed });
    }

    info!(chunks, failed, discarded, cards = set.len(), "Flashcard generation complete");
    Ok(set)
}
