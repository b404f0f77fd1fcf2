
use thiserror::Error;
use tracing::debug;

use crate::embeddings::{EmbeddingProvider, ProviderError};
use crate::store::{SearchResult, VectorIndex};

#[derive(Debug, Error)]
pub enum SearchError {
    #[error(
        "Index '{index}' was built with embedding model '{indexed}' but the active provider is '{active}'"
    )]
    EmbeddingModelMismatch {
        index: String,
        indexed: String,
        active: String,
    },

    #[error("Query embedding has {actual} dimensions but index '{index}' expects {expected}")]
    DimensionMismatch {
        index: String,
        expected: usize,
        actual: usize,
    },

    #[error("Failed to embed query: {0}")]
    Provider(#[from] ProviderError),
}

/// Retrieve the `k` documents of `index` most similar to `query`, nearest first.
///
/// The provider must report the embedding model the index was built with.
#[inline]
pub fn search(
    index: &VectorIndex,
    provider: &dyn EmbeddingProvider,
    query: &str,
    k: usize,
) -> Result<Vec<SearchResult>, SearchError> {
    if provider.model_id() != index.embedding_model() {
        return Err(SearchError::EmbeddingModelMismatch {
            index: index.name().to_string(),
            indexed: index.embedding_model().to_string(),
            active: provider.model_id().to_string(),
        });
    }

    if k == 0 {
        return Ok(Vec::new());
    }

    let query_vector = provider.embed(query)?;
    if query_vector.len() != index.dimension() {
        return Err(SearchError::DimensionMismatch {
            index: index.name().to_string(),
            expected: index.dimension(),
            actual: query_vector.len(),
        });
    }

    let results = index.nearest(&query_vector, k);
    debug!(
        "Search in '{}' returned {} of {} documents",
        index.name(),
        results.len(),
        index.len()
    );
    Ok(results)
}
