// Vector index storage module
// In-memory index representation, on-disk persistence, and the startup registry

#[cfg(test)]
mod tests;

pub mod disk;
pub mod registry;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::embeddings::chunking::ContentChunk;

pub use disk::IndexStore;
pub use registry::ModelRegistry;

/// Metadata stored alongside each document's text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentMetadata {
    /// Index of this chunk within the manual (build order)
    pub chunk_index: usize,
    /// Character offset of the chunk in the normalized manual text
    pub start_offset: usize,
    /// Token count of the chunk
    pub token_count: usize,
}

/// A chunk of manual text as stored in an index
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    pub content: String,
    pub metadata: DocumentMetadata,
}

impl From<ContentChunk> for Document {
    #[inline]
    fn from(chunk: ContentChunk) -> Self {
        Self {
            content: chunk.content,
            metadata: DocumentMetadata {
                chunk_index: chunk.chunk_index,
                start_offset: chunk.start_offset,
                token_count: chunk.token_count,
            },
        }
    }
}

/// A document together with its embedding vector
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexEntry {
    pub document: Document,
    pub vector: Vec<f32>,
}

/// Searchable collection of embedded documents for one product model.
///
/// The index is pinned to the embedding model that produced its vectors and is never mutated
/// after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    name: String,
    embedding_model: String,
    dimension: usize,
    created_at: DateTime<Utc>,
    entries: Vec<IndexEntry>,
}

/// Search result from vector similarity search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub document: Document,
    /// Squared Euclidean distance to the query vector
    pub distance: f32,
    pub similarity_score: f32,
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("No index found for model '{name}' at {}", path.display())]
    NotFound { name: String, path: PathBuf },

    #[error("Index '{name}' is corrupt: {reason}")]
    Corrupt { name: String, reason: String },

    #[error("Index '{name}' is invalid: {reason}")]
    Invalid { name: String, reason: String },

    #[error("Index storage error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize index '{name}': {source}")]
    Serialize {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

impl VectorIndex {
    /// Assemble an index, checking that every vector has the same non-zero dimension
    #[inline]
    pub fn new(
        name: impl Into<String>,
        embedding_model: impl Into<String>,
        entries: Vec<IndexEntry>,
    ) -> Result<Self, IndexError> {
        Self::with_created_at(name, embedding_model, entries, Utc::now())
    }

    pub(crate) fn with_created_at(
        name: impl Into<String>,
        embedding_model: impl Into<String>,
        entries: Vec<IndexEntry>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, IndexError> {
        let name = name.into();
        let dimension = entries.first().map_or(0, |entry| entry.vector.len());

        if entries.is_empty() {
            return Err(IndexError::Invalid {
                name,
                reason: "an index needs at least one document".to_string(),
            });
        }
        if dimension == 0 {
            return Err(IndexError::Invalid {
                name,
                reason: "embedding vectors are empty".to_string(),
            });
        }
        if let Some(position) = entries.iter().position(|e| e.vector.len() != dimension) {
            return Err(IndexError::Invalid {
                name,
                reason: format!(
                    "entry {} has {} dimensions, expected {}",
                    position,
                    entries[position].vector.len(),
                    dimension
                ),
            });
        }

        Ok(Self {
            name,
            embedding_model: embedding_model.into(),
            dimension,
            created_at,
            entries,
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identifier of the embedding space the vectors live in
    #[inline]
    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[inline]
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `k` entries closest to `query`, nearest first.
    ///
    /// Equal distances keep build order. `query` must have the index dimension.
    #[inline]
    pub fn nearest(&self, query: &[f32], k: usize) -> Vec<SearchResult> {
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (position, squared_l2(query, &entry.vector)))
            .collect();

        // Stable sort: ties stay in insertion order
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));

        scored
            .into_iter()
            .take(k)
            .map(|(position, distance)| SearchResult {
                document: self.entries[position].document.clone(),
                distance,
                similarity_score: 1.0 / (1.0 + distance),
            })
            .collect()
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
