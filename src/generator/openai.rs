//! OpenAI-compatible chat completions provider.
//!
//! Works against any endpoint speaking the `/chat/completions` dialect
//! (OpenAI, DeepSeek, most gateways). The rendered prompt is sent as the user
//! message and the reply content is handed to [`parse_reply`].

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Instant;
use tracing::debug;

use super::{parse_reply, CommentaryGenerator, GenerationRequest, GeneratorError};
use crate::config::GeneratorConfig;
use crate::engine::types::Candidate;

const SYSTEM_PROMPT: &str = "You place short inner-voice comments on a journal entry. \
     Always answer with a single JSON object and nothing else.";

pub struct OpenAiGenerator {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiGenerator {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: 600,
            temperature: 0.7,
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            anyhow::anyhow!(
                "generator API key not found: set the {} environment variable",
                config.api_key_env
            )
        })?;
        anyhow::ensure!(!api_key.trim().is_empty(), "{} is empty", config.api_key_env);

        let mut generator = Self::new(&config.endpoint, api_key, &config.model);
        generator.max_tokens = config.max_tokens;
        generator.temperature = config.temperature;
        Ok(generator)
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt },
            ],
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "response_format": { "type": "json_object" },
        })
    }
}

/// Pull the assistant message text out of a chat completions response.
fn extract_content(raw: &Value) -> Result<&str, GeneratorError> {
    raw["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| GeneratorError::Malformed("no content in completion response".into()))
}

#[async_trait]
impl CommentaryGenerator for OpenAiGenerator {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn propose(
        &self,
        request: &GenerationRequest,
    ) -> Result<Option<Candidate>, GeneratorError> {
        let start = Instant::now();
        debug!(model = %self.model, attempt = request.attempt, "chat completion request");

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&self.request_body(&request.prompt))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GeneratorError::Status { status, body });
        }

        let raw = response.json::<Value>().await?;
        debug!(
            latency_ms = start.elapsed().as_millis() as u64,
            "chat completion response"
        );

        parse_reply(extract_content(&raw)?)
    }
}
