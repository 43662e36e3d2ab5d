pub mod chunker;
pub mod config;
pub mod error;
pub mod flashcard;
pub mod input;

pub use chunker::{chunk_text, Chunk};
pub use config::Config;
pub use error::*;
pub use flashcard::{is_valid_pair, Flashcard, FlashcardSet};
pub use input::RawInput;
