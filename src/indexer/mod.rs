// Indexer module
// Turns manuals into embedded, persisted indexes, one per product model

pub mod manuals;

#[cfg(test)]
mod tests;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::embeddings::{
    ChunkingConfig, ChunkingError, EmbeddingProvider, ProviderError, chunk_text,
};
use crate::store::{Document, IndexEntry, IndexError, IndexStore, VectorIndex};

pub use manuals::{ManualCatalog, ManualCollision, discover_manuals};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Chunking failed: {0}")]
    Chunking(#[from] ChunkingError),

    #[error("Embedding provider failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Manual for model '{0}' contains no text")]
    EmptyManual(String),

    #[error(
        "Embedding {position} for model '{name}' has {actual} dimensions, expected {expected}"
    )]
    DimensionMismatch {
        name: String,
        position: usize,
        expected: usize,
        actual: usize,
    },

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Outcome of a batch build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Models whose index was built and saved
    pub succeeded: Vec<String>,
    /// Models that failed, with the reason
    pub failed: Vec<(String, String)>,
}

impl BuildReport {
    #[inline]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Builds and persists model indexes with one embedding provider
pub struct IndexBuilder<'a> {
    provider: &'a dyn EmbeddingProvider,
    store: &'a IndexStore,
    chunking: ChunkingConfig,
}

impl<'a> IndexBuilder<'a> {
    #[inline]
    pub fn new(
        provider: &'a dyn EmbeddingProvider,
        store: &'a IndexStore,
        chunking: ChunkingConfig,
    ) -> Self {
        Self {
            provider,
            store,
            chunking,
        }
    }

    /// Chunk, embed and save the manual text for `model_name`.
    ///
    /// The index is stored under the uppercased name and replaces any previous index of that
    /// name.
    #[inline]
    pub fn build(&self, model_name: &str, manual_text: &str) -> Result<VectorIndex, BuildError> {
        let name = model_name.trim().to_uppercase();

        let chunks = chunk_text(manual_text, &self.chunking)?;
        if chunks.is_empty() {
            return Err(BuildError::EmptyManual(name));
        }
        info!("Processing model {} ({} chunks)", name, chunks.len());

        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.content.clone()).collect();
        let vectors = self.provider.embed_batch(&texts)?;
        if vectors.len() != texts.len() {
            return Err(ProviderError::InvalidResponse(format!(
                "requested {} embeddings but received {}",
                texts.len(),
                vectors.len()
            ))
            .into());
        }

        let expected = vectors.first().map_or(0, Vec::len);
        if let Some(position) = vectors.iter().position(|v| v.len() != expected) {
            return Err(BuildError::DimensionMismatch {
                name,
                position,
                expected,
                actual: vectors[position].len(),
            });
        }
        debug!("Embedded {} chunks at dimension {}", vectors.len(), expected);

        let entries = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexEntry {
                document: Document::from(chunk),
                vector,
            })
            .collect();

        let index = VectorIndex::new(name, self.provider.model_id(), entries)?;
        self.store.save(&index)?;
        Ok(index)
    }

    /// Read the manual at `path` and build its index under `model_name`
    #[inline]
    pub fn build_file(
        &self,
        model_name: &str,
        path: &Path,
    ) -> Result<VectorIndex, BuildError> {
        let text = fs::read_to_string(path).map_err(|source| BuildError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.build(model_name, &text)
    }

    /// Build every manual in `catalog`, isolating failures per model
    #[inline]
    pub fn build_all(&self, catalog: &ManualCatalog) -> BuildReport {
        self.build_all_with_progress(catalog, |_| {})
    }

    /// Like [`Self::build_all`], calling `on_model` after each model is attempted
    #[inline]
    pub fn build_all_with_progress<F>(&self, catalog: &ManualCatalog, mut on_model: F) -> BuildReport
    where
        F: FnMut(&str),
    {
        let mut report = BuildReport::default();

        for (name, path) in catalog.manuals() {
            match self.build_file(name, path) {
                Ok(index) => {
                    info!("Vectors saved for {} ({} documents)", name, index.len());
                    report.succeeded.push(name.clone());
                }
                Err(e) => {
                    error!("Failed to build index for {}: {}", name, e);
                    report.failed.push((name.clone(), e.to_string()));
                }
            }
            on_model(name);
        }

        for collision in catalog.collisions() {
            warn!(
                "Skipping {}: model {} is already built from {}",
                collision.path.display(),
                collision.name,
                collision.kept.display()
            );
            report.failed.push((collision.name.clone(), collision.to_string()));
        }

        report
    }
}
