
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Represents a chunk of manual text ready for embedding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentChunk {
    /// The content text
    pub content: String,
    /// The index of this chunk within the manual
    pub chunk_index: usize,
    /// Character offset of the first character in the normalized manual text
    pub start_offset: usize,
    /// Estimated token count
    pub token_count: usize,
}

/// Configuration for content chunking. Sizes are measured in characters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk length
    pub chunk_size: usize,
    /// Characters shared by adjacent chunks
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 100,
        }
    }
}

impl ChunkingConfig {
    /// Distance between the starts of two adjacent chunks
    #[inline]
    pub fn step(&self) -> Result<usize, ChunkingError> {
        if self.chunk_size == 0 || self.chunk_overlap >= self.chunk_size {
            return Err(ChunkingError::InvalidWindow {
                chunk_size: self.chunk_size,
                chunk_overlap: self.chunk_overlap,
            });
        }
        Ok(self.chunk_size - self.chunk_overlap)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChunkingError {
    #[error("Invalid chunk window: overlap {chunk_overlap} must be smaller than size {chunk_size}")]
    InvalidWindow {
        chunk_size: usize,
        chunk_overlap: usize,
    },
}

/// Chunk manual text into overlapping fixed-size windows.
///
/// The text is normalized first (line endings unified, outer whitespace trimmed). Windows are
/// `chunk_size` characters long and advance by `chunk_size - chunk_overlap`, so adjacent chunks
/// share exactly `chunk_overlap` characters. The final window may be shorter. Empty input
/// yields no chunks.
#[inline]
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Result<Vec<ContentChunk>, ChunkingError> {
    let step = config.step()?;
    let normalized = normalize_text(text);
    let chars: Vec<char> = normalized.chars().collect();

    let mut chunks = Vec::new();
    if chars.is_empty() {
        return Ok(chunks);
    }

    let mut start = 0;
    loop {
        let end = (start + config.chunk_size).min(chars.len());
        let content: String = chars[start..end].iter().collect();
        let token_count = estimate_token_count(&content);
        chunks.push(ContentChunk {
            content,
            chunk_index: chunks.len(),
            start_offset: start,
            token_count,
        });

        if end == chars.len() {
            break;
        }
        start += step;
    }

    debug!(
        "Chunked {} characters into {} chunks (size {}, overlap {})",
        chars.len(),
        chunks.len(),
        config.chunk_size,
        config.chunk_overlap
    );

    Ok(chunks)
}

/// Unify line endings and trim the outer whitespace of a manual
#[inline]
pub fn normalize_text(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n").trim().to_string()
}

/// Estimate token count using a simple heuristic
#[inline]
pub fn estimate_token_count(text: &str) -> usize {
    // Rough heuristic: 1 token ≈ 0.75 words, plus a little for punctuation
    let word_count = text.split_whitespace().count();
    let punct_count = text.chars().filter(|c| c.is_ascii_punctuation()).count();

    (punct_count as f64).mul_add(0.1, word_count as f64 / 0.75) as usize
}
