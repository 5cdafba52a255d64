//! Commentary generation: the external collaborator that proposes candidates.
//!
//! Provides the [`CommentaryGenerator`] trait, the [`GeneratorError`] type the
//! orchestrator absorbs at each attempt, reply parsing shared by providers,
//! and [`create_generator`] to build a provider from configuration.

pub mod openai;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::config::GeneratorConfig;
use crate::engine::rejections::RejectionRecord;
use crate::engine::types::{Candidate, Comment};

/// Everything a generator sees for one attempt.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Fully rendered prompt.
    pub prompt: String,
    /// 1-based attempt number within the chain.
    pub attempt: usize,
    pub committed: Vec<Comment>,
    pub rejections: RejectionRecord,
}

#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("generator timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("generator returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed generator reply: {0}")]
    Malformed(String),
}

/// Proposes at most one candidate per call.
///
/// `Ok(None)` means the generator has nothing to say; the orchestrator ends
/// the chain without a comment. Errors cost one attempt and are never
/// propagated past the orchestrator.
#[async_trait]
pub trait CommentaryGenerator: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &'static str;

    async fn propose(
        &self,
        request: &GenerationRequest,
    ) -> Result<Option<Candidate>, GeneratorError>;
}

#[derive(Debug, Deserialize)]
struct Reply {
    #[serde(default)]
    voice: Option<ReplyVoice>,
}

#[derive(Debug, Deserialize)]
struct ReplyVoice {
    #[serde(default)]
    #[allow(dead_code)]
    reasoning: Option<String>,
    phrase: String,
    #[serde(alias = "voice")]
    voice_id: String,
    comment: String,
}

/// Parse a model reply into at most one candidate.
///
/// Accepts bare JSON or JSON wrapped in a Markdown code fence. A bare `null`
/// or `{"voice": null}` means "nothing to say".
pub fn parse_reply(raw: &str) -> Result<Option<Candidate>, GeneratorError> {
    let body = strip_code_fence(raw.trim());
    if body.is_empty() {
        return Err(GeneratorError::Malformed("empty reply".into()));
    }
    if body == "null" {
        return Ok(None);
    }
    let reply: Reply =
        serde_json::from_str(body).map_err(|e| GeneratorError::Malformed(e.to_string()))?;
    Ok(reply
        .voice
        .map(|v| Candidate::new(v.phrase, v.voice_id, v.comment)))
}

fn strip_code_fence(s: &str) -> &str {
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    let rest = rest.trim_end();
    let body = rest.strip_suffix("```").unwrap_or(rest);
    // Drop an optional language tag on the opening fence line.
    match body.split_once('\n') {
        Some((tag, inner)) if tag.trim().chars().all(|c| c.is_ascii_alphanumeric()) => {
            inner.trim()
        }
        _ => body.trim(),
    }
}

/// Create a commentary generator from config.
///
/// Currently only `"openai"` (any OpenAI-compatible chat completions endpoint)
/// is supported. Returns an error if the API key variable is unset.
pub fn create_generator(config: &GeneratorConfig) -> Result<Arc<dyn CommentaryGenerator>> {
    match config.provider.as_str() {
        "openai" => {
            let generator = openai::OpenAiGenerator::from_config(config)?;
            Ok(Arc::new(generator))
        }
        other => anyhow::bail!("unknown generator provider: {other}. Supported: openai"),
    }
}
