// Embeddings module
// Manual chunking plus the providers that turn text into vectors

pub mod chunking;
pub mod http;
pub mod ollama;
pub mod openai;


use thiserror::Error;

use crate::config::{Config, EmbeddingBackend};

pub use chunking::{ChunkingConfig, ChunkingError, ContentChunk, chunk_text, estimate_token_count};
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

/// Failure talking to an external embedding or language-model provider
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Missing API credential: environment variable {0} is not set")]
    MissingCredential(String),

    #[error("Provider unavailable after {attempts} attempt(s): {message}")]
    Transient { attempts: u32, message: String },

    #[error("Provider rejected the request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

/// Converts text into fixed-dimension vectors.
///
/// Implementations must be deterministic in the sense that matters for retrieval: the same
/// `model_id` always maps text into the same vector space. Indexes are pinned to `model_id`.
pub trait EmbeddingProvider: Send + Sync {
    /// Stable identifier of the embedding space, e.g. `openai:text-embedding-3-small`
    fn model_id(&self) -> &str;

    /// Embed a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;

    /// Embed many texts, returning one vector per input in input order
    #[inline]
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}

/// Build the embedding provider selected in the configuration
#[inline]
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn EmbeddingProvider>> {
    let provider: Box<dyn EmbeddingProvider> = match config.embedding.provider {
        EmbeddingBackend::OpenAi => Box::new(OpenAiClient::new(config)?),
        EmbeddingBackend::Ollama => Box::new(OllamaClient::new(config)?),
    };
    Ok(provider)
}
