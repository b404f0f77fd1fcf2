
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::http::{
    DEFAULT_BACKOFF, DEFAULT_RETRY_ATTEMPTS, DEFAULT_TIMEOUT_SECONDS, agent_with_timeout,
    send_with_retry,
};
use super::{EmbeddingProvider, ProviderError};
use crate::config::Config;

/// Blocking client for a local Ollama server's `/api/embed` endpoint
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: Url,
    model: String,
    model_id: String,
    batch_size: usize,
    agent: ureq::Agent,
    retry_attempts: u32,
    backoff: Duration,
}

#[derive(Debug, Serialize)]
struct BatchEmbedRequest<'a> {
    model: &'a str,
    #[serde(rename = "input")]
    inputs: &'a [String],
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaClient {
    #[inline]
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = config
            .embedding_url()
            .context("Failed to generate Ollama URL from config")?;

        Ok(Self::from_parts(base_url, &config.embedding.model)
            .with_batch_size(config.embedding.batch_size as usize)
            .with_timeout(Duration::from_secs(config.embedding.timeout_seconds))
            .with_retry_attempts(config.embedding.retry_attempts))
    }

    #[inline]
    pub fn from_parts(base_url: Url, model: &str) -> Self {
        Self {
            base_url,
            model: model.to_string(),
            model_id: format!("ollama:{}", model),
            batch_size: 16,
            agent: agent_with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)),
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        }
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = agent_with_timeout(timeout);
        self
    }

    #[inline]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    #[inline]
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    #[inline]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    fn generate_embeddings_single_batch(
        &self,
        texts: &[String],
    ) -> Result<Vec<Vec<f32>>, ProviderError> {
        let url = self
            .base_url
            .join("api/embed")
            .map_err(|e| ProviderError::InvalidResponse(format!("bad embed URL: {}", e)))?;

        let request_json = serde_json::to_string(&BatchEmbedRequest {
            model: &self.model,
            inputs: texts,
        })
        .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        let response_text = send_with_retry(
            url.as_str(),
            self.retry_attempts,
            self.backoff,
            || {
                self.agent
                    .post(url.as_str())
                    .header("Content-Type", "application/json")
                    .send(&request_json)
                    .and_then(|mut resp| resp.body_mut().read_to_string())
            },
        )?;

        let batch_response: BatchEmbedResponse =
            serde_json::from_str(&response_text).map_err(|e| {
                ProviderError::InvalidResponse(format!(
                    "Failed to parse batch embedding response: {}",
                    e
                ))
            })?;

        if batch_response.embeddings.len() != texts.len() {
            return Err(ProviderError::InvalidResponse(format!(
                "Mismatch between request and response counts: {} vs {}",
                texts.len(),
                batch_response.embeddings.len()
            )));
        }

        Ok(batch_response.embeddings)
    }
}

impl EmbeddingProvider for OllamaClient {
    #[inline]
    fn model_id(&self) -> &str {
        &self.model_id
    }

    #[inline]
    fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        debug!("Generating embedding for text (length: {})", text.len());
        let mut vectors = self.generate_embeddings_single_batch(&[text.to_string()])?;
        vectors
            .pop()
            .ok_or_else(|| ProviderError::InvalidResponse("empty embed response".to_string()))
    }

    /// Process in batches to avoid overwhelming the server
    #[inline]
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut results = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            results.extend(self.generate_embeddings_single_batch(chunk)?);
        }

        debug!("Generated {} embeddings total", results.len());
        Ok(results)
    }
}
