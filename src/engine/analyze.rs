//! Request-level entry point.
//!
//! [`Engine::analyze`] runs one analysis call for a session: checkout and
//! lock, optional adoption of client-held comments, prune and re-settle
//! against the edited text, request gates, one retry chain, and commit.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use super::orchestrator::{AttemptResult, Chain, ChainOutcome, Orchestrator};
use super::rejections::RejectionRecord;
use super::session::SessionRegistry;
use super::types::{Comment, DensityPolicy, PlacedComment};
use super::validate::Validator;
use crate::config::EngineConfig;
use crate::generator::CommentaryGenerator;
use crate::persona::PersonaCatalog;

/// One analysis call.
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    pub session_id: String,
    pub text: String,
    /// Overrides the engine's default catalog for this call.
    pub personas: Option<PersonaCatalog>,
    /// Client-held comments; when present they replace the session's list.
    pub applied_comments: Option<Vec<Comment>>,
    pub meta_prompt: Option<String>,
    pub state_prompt: Option<String>,
    pub density_policy: Option<DensityPolicy>,
}

impl AnalysisRequest {
    pub fn new(session_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Why a call ended the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    /// A new comment was accepted.
    Commented,
    /// The generator had nothing to add.
    Declined,
    /// Every attempt was rejected or failed.
    Exhausted,
    /// Text shorter than the configured minimum; no generation ran.
    TextTooShort,
    /// Text barely changed since the last chain; no generation ran.
    Unchanged,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub session_id: String,
    pub status: AnalysisStatus,
    /// Zero or one newly accepted comment.
    pub new_comments: Vec<PlacedComment>,
    pub new_comments_added: usize,
    /// Every comment the session holds after this call.
    pub comments: Vec<PlacedComment>,
    /// Comments removed because their phrase left the text or an edit made them collide.
    pub pruned: usize,
    pub attempts: Vec<AttemptResult>,
    pub rejections: RejectionRecord,
}

/// Owns the session registry and the generator; shared across requests.
pub struct Engine {
    registry: SessionRegistry,
    generator: Arc<dyn CommentaryGenerator>,
    catalog: PersonaCatalog,
    config: EngineConfig,
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        catalog: PersonaCatalog,
        generator: Arc<dyn CommentaryGenerator>,
    ) -> Self {
        Self {
            registry: SessionRegistry::new(config.session_ttl()),
            generator,
            catalog,
            config,
        }
    }

    pub fn catalog(&self) -> &PersonaCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Forget a session's comments now instead of waiting for the TTL.
    pub fn reset_session(&self, session_id: &str) -> bool {
        let removed = self.registry.reset(session_id);
        info!(session_id = %session_id, removed, "session reset");
        removed
    }

    pub async fn analyze(&self, request: AnalysisRequest) -> AnalysisReport {
        let AnalysisRequest {
            session_id,
            text,
            personas,
            applied_comments,
            meta_prompt,
            state_prompt,
            density_policy,
        } = request;
        let catalog = personas.as_ref().unwrap_or(&self.catalog);
        let policy = density_policy.unwrap_or(self.config.density_policy);
        let split = self.config.sentence_split;

        let handle = self.registry.checkout(&session_id);
        let mut session = handle.lock().await;

        info!(
            session_id = %session_id,
            text_len = text.len(),
            comments = session.comments().len(),
            policy = %policy,
            "analysis requested"
        );

        let validator = Validator::new(&text, catalog, policy, split);
        let mut pruned = 0;
        if let Some(applied) = applied_comments {
            let (kept, dropped) = validator.reconcile(applied);
            session.replace_comments(kept);
            pruned += dropped;
        }
        pruned += session.prune(&text);

        // Edits can push surviving phrases into each other or into one sentence.
        let (settled, displaced) = validator.settle(session.comments().to_vec());
        if displaced > 0 {
            debug!(session_id = %session_id, displaced, "dropped comments displaced by an edit");
            session.replace_comments(settled);
            pruned += displaced;
        }

        let text_chars = text.chars().count();
        let last_chars = session.last_text().chars().count();
        let gated = if text.trim().chars().count() < self.config.min_text_length {
            Some(AnalysisStatus::TextTooShort)
        } else if !session.comments().is_empty()
            && text_chars.abs_diff(last_chars) < self.config.min_text_change
        {
            Some(AnalysisStatus::Unchanged)
        } else {
            None
        };

        let mut report = AnalysisReport {
            session_id: session_id.clone(),
            status: AnalysisStatus::Declined,
            new_comments: Vec::new(),
            new_comments_added: 0,
            comments: Vec::new(),
            pruned,
            attempts: Vec::new(),
            rejections: RejectionRecord::new(),
        };

        if let Some(status) = gated {
            info!(session_id = %session_id, status = ?status, "skipping generation");
            report.status = status;
        } else {
            let orchestrator = Orchestrator::new(
                self.generator.as_ref(),
                self.config.max_attempts,
                self.config.attempt_timeout(),
            );
            let chain = orchestrator
                .run(Chain {
                    text: &text,
                    catalog,
                    committed: session.comments(),
                    policy,
                    split,
                    meta_prompt: meta_prompt.as_deref(),
                    state_prompt: state_prompt.as_deref(),
                })
                .await;

            report.status = match chain.outcome {
                ChainOutcome::Accepted { comment, .. } => {
                    report
                        .new_comments
                        .push(PlacedComment::from_comment(&comment, catalog));
                    session.commit(comment);
                    AnalysisStatus::Commented
                }
                ChainOutcome::Declined => AnalysisStatus::Declined,
                ChainOutcome::Exhausted => AnalysisStatus::Exhausted,
            };
            report.attempts = chain.attempts;
            report.rejections = chain.rejections;
            session.set_last_text(&text);
        }

        report.new_comments_added = report.new_comments.len();
        report.comments = session
            .comments()
            .iter()
            .map(|c| PlacedComment::from_comment(c, catalog))
            .collect();

        info!(
            session_id = %session_id,
            status = ?report.status,
            added = report.new_comments_added,
            total = report.comments.len(),
            pruned = report.pruned,
            "analysis finished"
        );
        report
    }
}
