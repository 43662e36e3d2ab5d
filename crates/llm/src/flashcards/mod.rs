//! Flashcard generation on top of an [`LlmProvider`](crate::LlmProvider).

pub mod extract;
pub mod generator;
pub mod prompt;
pub mod repair;

pub use extract::{extract, try_extract, ExtractError, Extraction};
pub use generator::{
    collect_outcomes, ChunkError, ChunkOutcome, FlashcardGenerator, GenerateError,
    GenerationSettings,
};
pub use prompt::{build_prompt, target_card_count, PromptVariant};
