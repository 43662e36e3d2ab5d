pub mod flashcards;
pub mod provider;
pub mod providers;

pub use flashcards::{FlashcardGenerator, GenerateError, GenerationSettings, PromptVariant};
pub use provider::{LlmError, LlmProvider, Message, Role};
