//! Prompt selection and construction for flashcard generation.

use cardsmith_core::Chunk;

use crate::provider::Message;

/// Placeholder replaced with the number of cards to request.
const COUNT_PLACEHOLDER: &str = "<<<count>>>";

/// Placeholder replaced with the chunk text.
const CHUNK_PLACEHOLDER: &str = "<<<chunk>>>";

const FREEFORM_TEMPLATE: &str = include_str!("../../prompts/freeform.md");
const STRUCTURED_TEMPLATE: &str = include_str!("../../prompts/structured.md");

/// Row marker emitted by the upstream spreadsheet/CSV extraction ("Entry 1:").
const ROW_MARKER: &str = "Entry";

/// Field delimiter in extracted "key: value" lines.
const FIELD_DELIMITER: char = ':';

/// Standing instruction sent ahead of every chunk prompt.
pub const SYSTEM_PROMPT: &str =
    "You create study flashcards. Reply with a JSON array of question/answer objects and nothing else.";

/// Upper bound on cards requested per chunk.
const MAX_CARDS_PER_CHUNK: usize = 5;

/// Characters of chunk text per requested card.
const CHARS_PER_CARD: usize = 1000;

/// Shape of the study material, which picks the prompt template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptVariant {
    /// Row/field records from a spreadsheet or CSV.
    Structured,
    /// Everything else: prose notes, PDF or Word text.
    Freeform,
}

impl PromptVariant {
    /// Heuristic: the material is structured when it contains both the row
    /// marker and a field delimiter anywhere. Prose that happens to contain
    /// "Entry" and a colon is classified as structured too; the structured
    /// template still yields usable cards for such text.
    pub fn classify(text: &str) -> Self {
        if text.contains(ROW_MARKER) && text.contains(FIELD_DELIMITER) {
            Self::Structured
        } else {
            Self::Freeform
        }
    }

    fn template(self) -> &'static str {
        match self {
            Self::Structured => STRUCTURED_TEMPLATE,
            Self::Freeform => FREEFORM_TEMPLATE,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Structured => "structured",
            Self::Freeform => "freeform",
        }
    }
}

/// Cards to request for a chunk of `chunk_chars` characters:
/// `min(5, ceil(len / 1000))`, never less than 1.
pub fn target_card_count(chunk_chars: usize) -> usize {
    chunk_chars.div_ceil(CHARS_PER_CARD).clamp(1, MAX_CARDS_PER_CHUNK)
}

/// Build the user prompt for one chunk.
pub fn build_prompt(chunk: &Chunk, variant: PromptVariant) -> String {
    let count = target_card_count(chunk.char_len());
    // Count first so placeholder-like text inside the chunk is left alone.
    variant
        .template()
        .replace(COUNT_PLACEHOLDER, &count.to_string())
        .replace(CHUNK_PLACEHOLDER, &chunk.content)
}

/// System instruction followed by the chunk prompt.
pub fn build_messages(chunk: &Chunk, variant: PromptVariant) -> Vec<Message> {
    vec![Message::system(SYSTEM_PROMPT), Message::user(build_prompt(chunk, variant))]
}
