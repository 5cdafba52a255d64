//! Bounded generate-validate-retry loop.
//!
//! Each attempt renders a prompt carrying the chain's cumulative rejections,
//! asks the generator for one candidate under a timeout, and validates it.
//! The loop ends on the first acceptance, when the generator declines, or
//! when the attempt budget is spent. Generator failures cost an attempt and
//! never escape.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::locate::Occupancy;
use super::prompt::PromptBuilder;
use super::rejections::RejectionRecord;
use super::types::{Candidate, Comment, DensityPolicy, SentenceSplit};
use super::validate::{Placement, Rejection, Validator, Verdict};
use crate::generator::{CommentaryGenerator, GenerationRequest, GeneratorError};
use crate::persona::PersonaCatalog;

/// Inputs for one retry chain.
#[derive(Debug, Clone, Copy)]
pub struct Chain<'a> {
    pub text: &'a str,
    pub catalog: &'a PersonaCatalog,
    pub committed: &'a [Comment],
    pub policy: DensityPolicy,
    pub split: SentenceSplit,
    pub meta_prompt: Option<&'a str>,
    pub state_prompt: Option<&'a str>,
}

/// How a chain ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainOutcome {
    Accepted { comment: Comment, placement: Placement },
    /// The generator had nothing to say.
    Declined,
    /// Every attempt was rejected or failed.
    Exhausted,
}

/// Per-attempt trace, kept for logging and reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum AttemptResult {
    Accepted { phrase: String },
    Rejected { phrase: String, reason: String },
    Declined,
    Failed { error: String },
}

#[derive(Debug, Clone)]
pub struct ChainReport {
    pub outcome: ChainOutcome,
    pub attempts: Vec<AttemptResult>,
    pub rejections: RejectionRecord,
}

impl ChainReport {
    pub fn accepted(&self) -> Option<&Comment> {
        match &self.outcome {
            ChainOutcome::Accepted { comment, .. } => Some(comment),
            _ => None,
        }
    }
}

pub struct Orchestrator<'g> {
    generator: &'g dyn CommentaryGenerator,
    max_attempts: usize,
    attempt_timeout: Duration,
}

impl<'g> Orchestrator<'g> {
    pub fn new(
        generator: &'g dyn CommentaryGenerator,
        max_attempts: usize,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            generator,
            max_attempts: max_attempts.max(1),
            attempt_timeout,
        }
    }

    pub async fn run(&self, chain: Chain<'_>) -> ChainReport {
        let validator = Validator::new(chain.text, chain.catalog, chain.policy, chain.split);
        let occupancy = Occupancy::build(chain.text, chain.committed, chain.split);
        let mut rejections = RejectionRecord::new();
        let mut attempts = Vec::with_capacity(self.max_attempts);

        for attempt in 1..=self.max_attempts {
            let prompt = PromptBuilder::new(chain.text, chain.catalog)
                .committed(chain.committed)
                .rejections(&rejections)
                .meta_prompt(chain.meta_prompt)
                .state_prompt(chain.state_prompt)
                .build();
            let request = GenerationRequest {
                prompt,
                attempt,
                committed: chain.committed.to_vec(),
                rejections: rejections.clone(),
            };

            let candidate = match self.propose(&request).await {
                Ok(Some(candidate)) => candidate,
                Ok(None) => {
                    info!(attempt, generator = self.generator.name(), "generator declined to comment");
                    attempts.push(AttemptResult::Declined);
                    return ChainReport {
                        outcome: ChainOutcome::Declined,
                        attempts,
                        rejections,
                    };
                }
                Err(e) => {
                    warn!(attempt, generator = self.generator.name(), "generator attempt failed: {e}");
                    attempts.push(AttemptResult::Failed {
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            // A hallucinated phrase stays dead for the rest of the chain.
            let verdict = if rejections.is_not_found(&candidate.phrase) {
                Verdict::Reject(Rejection::NotFound)
            } else {
                validator.check_against(&occupancy, &candidate)
            };

            match verdict {
                Verdict::Accept(placement) => {
                    info!(
                        attempt,
                        phrase = %candidate.phrase,
                        persona_id = %candidate.persona_id,
                        sentence = ?placement.sentence,
                        "candidate accepted"
                    );
                    attempts.push(AttemptResult::Accepted {
                        phrase: candidate.phrase.clone(),
                    });
                    return ChainReport {
                        outcome: ChainOutcome::Accepted {
                            comment: candidate.into_comment(),
                            placement,
                        },
                        attempts,
                        rejections,
                    };
                }
                Verdict::Reject(rejection) => {
                    debug!(
                        attempt,
                        phrase = %candidate.phrase,
                        persona_id = %candidate.persona_id,
                        reason = %rejection,
                        "candidate rejected"
                    );
                    rejections.record(&candidate.phrase, &rejection);
                    attempts.push(AttemptResult::Rejected {
                        phrase: candidate.phrase,
                        reason: rejection.to_string(),
                    });
                }
            }
        }

        info!(
            attempts = self.max_attempts,
            not_found = rejections.not_found.len(),
            overlapping = rejections.overlapping.len(),
            "attempts exhausted without a new comment"
        );
        ChainReport {
            outcome: ChainOutcome::Exhausted,
            attempts,
            rejections,
        }
    }

    async fn propose(
        &self,
        request: &GenerationRequest,
    ) -> Result<Option<Candidate>, GeneratorError> {
        tokio::time::timeout(self.attempt_timeout, self.generator.propose(request))
            .await
            .unwrap_or(Err(GeneratorError::Timeout(self.attempt_timeout)))
    }
}
