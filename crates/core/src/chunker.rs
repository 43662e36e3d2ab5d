//! Word-aligned chunking of study material.
//!
//! Packs whitespace-delimited words greedily into chunks of at most
//! `max_chunk_chars` characters. Words are never split: a single word longer
//! than the limit becomes a chunk of its own.

use serde::Serialize;

/// One bounded slice of the input, words joined by single spaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    /// 1-based position in the chunk sequence.
    pub index: usize,
    pub content: String,
}

impl Chunk {
    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// Split `text` into ordered chunks of at most `max_chunk_chars` characters.
///
/// Each packed word costs its length plus one for the joining space, so a
/// word joins the current chunk only while `size + len + 1 <= max`.
/// Whitespace-only input yields no chunks. A limit of 0 is treated as 1.
pub fn chunk_text(text: &str, max_chunk_chars: usize) -> Vec<Chunk> {
    let max = max_chunk_chars.max(1);
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_size = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if !current.is_empty() && current_size + word_len + 1 > max {
            chunks.push(Chunk {
                index: chunks.len() + 1,
                content: current.join(" "),
            });
            current.clear();
            current_size = 0;
        }
        current.push(word);
        current_size += word_len + 1;
    }

    if !current.is_empty() {
        chunks.push(Chunk {
            index: chunks.len() + 1,
            content: current.join(" "),
        });
    }

    chunks
}
