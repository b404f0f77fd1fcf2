
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

/// Blocking client for OpenAI-compatible `/embeddings` endpoints
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    base_url: Url,
    model: String,
    model_id: String,
    api_key: String,
    batch_size: usize,
    agent: ureq::Agent,
    retry_attempts: u32,
    backoff: Duration,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
    index: usize,
}

impl OpenAiClient {
    /// Create a client from configuration, failing fast when the API key is absent
    #[inline]
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = config
            .embedding_url()
            .context("Failed to build embedding URL from config")?;
        let api_key = config.api_key()?;

        Ok(Self::from_parts(base_url, &config.embedding.model, api_key)
            .with_batch_size(config.embedding.batch_size as usize)
            .with_timeout(Duration::from_secs(config.embedding.timeout_seconds))
            .with_retry_attempts(config.embedding.retry_attempts))
    }

    /// Create a client against an explicit API root such as `https://api.openai.com/v1/`
    #[inline]
    pub fn from_parts(base_url: Url, model: &str, api_key: String) -> Self {
        Self {
            base_url,
            model: model.to_string(),
            model_id: format!("openai:{}", model),
            api_key,
            batch_size: 64,
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

    fn embed_single_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        let url = self
            .base_url
            .join("embeddings")
            .map_err(|e| ProviderError::InvalidResponse(format!("bad embeddings URL: {}", e)))?;

        let request_json = serde_json::to_string(&EmbeddingsRequest {
            model: &self.model,
            input: texts,
        })
        .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        let authorization = format!("Bearer {}", self.api_key);
        let response_text = send_with_retry(
            url.as_str(),
            self.retry_attempts,
            self.backoff,
            || {
                self.agent
                    .post(url.as_str())
                    .header("Authorization", &authorization)
                    .header("Content-Type", "application/json")
                    .send(&request_json)
                    .and_then(|mut resp| resp.body_mut().read_to_string())
            },
        )?;

        let mut response: EmbeddingsResponse = serde_json::from_str(&response_text)
            .map_err(|e| {
                ProviderError::InvalidResponse(format!("Failed to parse embeddings response: {}", e))
            })?;

        if response.data.len() != texts.len() {
            return Err(ProviderError::InvalidResponse(format!(
                "Mismatch between request and response counts: {} vs {}",
                texts.len(),
                response.data.len()
            )));
        }

        response.data.sort_by_key(|datum| datum.index);
        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }
}

impl EmbeddingProvider for OpenAiClient {
    #[inline]
    fn model_id(&self) -> &str {
        &self.model_id
    }

    #[inline]
    fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let mut vectors = self.embed_single_batch(&[text.to_string()])?;
        vectors
            .pop()
            .ok_or_else(|| ProviderError::InvalidResponse("empty embeddings response".to_string()))
    }

    #[inline]
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            "Generating embeddings for {} texts with {}",
            texts.len(),
            self.model
        );

        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            vectors.extend(self.embed_single_batch(batch)?);
        }

        debug!("Generated {} embeddings total", vectors.len());
        Ok(vectors)
    }
}
