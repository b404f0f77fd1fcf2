// Answer generation
// Hands retrieved manual passages and the user question to a chat model


use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::embeddings::ProviderError;
use crate::embeddings::http::{
    DEFAULT_BACKOFF, DEFAULT_RETRY_ATTEMPTS, agent_with_timeout, send_with_retry,
};

pub const SYSTEM_PROMPT: &str = "Eres un mecánico experto en motocicletas y mantenimiento.";

/// Produces a natural-language answer from a question and retrieved context
pub trait AnswerService: Send + Sync {
    fn answer(&self, question: &str, context: &str) -> Result<String, ProviderError>;
}

/// Render the user prompt for a question over manual excerpts
#[inline]
pub fn build_prompt(question: &str, context: &str) -> String {
    format!(
        "Eres MOTOFIX, un asistente técnico para el mantenimiento de motocicletas. \
Responde usando los fragmentos del manual que aparecen abajo, con un tono técnico y claro.

Si el manual no cubre lo que se pregunta, da una recomendación razonada a partir de \
conocimientos generales de motos similares, sin inventar cifras.

---
Fragmentos del manual:
{context}
---
Pregunta:
{question}
---"
    )
}

/// Blocking client for OpenAI-compatible `/chat/completions` endpoints
#[derive(Debug, Clone)]
pub struct OpenAiChatClient {
    base_url: Url,
    model: String,
    api_key: String,
    temperature: f32,
    max_tokens: u32,
    agent: ureq::Agent,
    retry_attempts: u32,
    backoff: Duration,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiChatClient {
    /// Create a client from configuration, failing fast when the API key is absent
    #[inline]
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = config
            .answer_url()
            .context("Failed to build answer URL from config")?;
        let api_key = config.api_key()?;

        Ok(Self::from_parts(base_url, &config.answer.model, api_key)
            .with_sampling(config.answer.temperature, config.answer.max_tokens)
            .with_timeout(Duration::from_secs(config.answer.timeout_seconds))
            .with_retry_attempts(config.answer.retry_attempts))
    }

    #[inline]
    pub fn from_parts(base_url: Url, model: &str, api_key: String) -> Self {
        Self {
            base_url,
            model: model.to_string(),
            api_key,
            temperature: 0.7,
            max_tokens: 400,
            agent: agent_with_timeout(Duration::from_secs(60)),
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        }
    }

    #[inline]
    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
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
}

impl AnswerService for OpenAiChatClient {
    #[inline]
    fn answer(&self, question: &str, context: &str) -> Result<String, ProviderError> {
        let url = self
            .base_url
            .join("chat/completions")
            .map_err(|e| ProviderError::InvalidResponse(format!("bad chat URL: {}", e)))?;

        let prompt = build_prompt(question, context);
        let request_json = serde_json::to_string(&ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        })
        .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        debug!(
            "Requesting answer from {} ({} context characters)",
            self.model,
            context.len()
        );

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

        let response: ChatResponse = serde_json::from_str(&response_text).map_err(|e| {
            ProviderError::InvalidResponse(format!("Failed to parse chat response: {}", e))
        })?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| ProviderError::InvalidResponse("chat response has no content".to_string()))
    }
}
