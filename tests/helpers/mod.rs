#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use marginalia::config::EngineConfig;
use marginalia::engine::types::{Candidate, Comment};
use marginalia::engine::Engine;
use marginalia::generator::{CommentaryGenerator, GenerationRequest, GeneratorError};
use marginalia::persona::{Persona, PersonaCatalog};

pub const EXAM_TEXT: &str = "I am anxious about tomorrow's exam. I hope it goes well.";

/// One scripted generator response.
#[derive(Debug, Clone)]
pub enum Step {
    Propose(Candidate),
    Decline,
    Fail,
    /// Sleep far past any attempt timeout.
    Hang,
}

/// Shorthand for a `Step::Propose` from the holder voice.
pub fn propose(phrase: &str) -> Step {
    Step::Propose(Candidate::new(phrase, "holder", "I'm here with you."))
}

pub fn propose_as(phrase: &str, persona_id: &str) -> Step {
    Step::Propose(Candidate::new(phrase, persona_id, "..."))
}

/// Generator that replays a fixed script and records every request it sees.
/// Once the script runs out it declines.
#[derive(Default)]
pub struct ScriptedGenerator {
    steps: Mutex<VecDeque<Step>>,
    seen: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into_iter().collect()),
            seen: Mutex::new(Vec::new()),
        })
    }

    /// Append more steps, e.g. between analysis rounds.
    pub fn push(&self, steps: impl IntoIterator<Item = Step>) {
        self.steps.lock().unwrap().extend(steps);
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl CommentaryGenerator for ScriptedGenerator {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn propose(
        &self,
        request: &GenerationRequest,
    ) -> Result<Option<Candidate>, GeneratorError> {
        self.seen.lock().unwrap().push(request.clone());
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Propose(candidate)) => Ok(Some(candidate)),
            Some(Step::Decline) | None => Ok(None),
            Some(Step::Fail) => Err(GeneratorError::Malformed("scripted failure".into())),
            Some(Step::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(None)
            }
        }
    }
}

/// Two-voice catalog used across tests.
pub fn test_catalog() -> PersonaCatalog {
    PersonaCatalog::new()
        .with("holder", Persona::new("The Holder", "Receive feelings.", "heart", "pink"))
        .with("starter", Persona::new("The Starter", "Suggest a step.", "fist", "yellow"))
}

pub fn test_engine_with(config: EngineConfig, generator: &Arc<ScriptedGenerator>) -> Engine {
    let generator: Arc<dyn CommentaryGenerator> = generator.clone();
    Engine::new(config, test_catalog(), generator)
}

/// Engine with default settings backed by `generator`.
pub fn test_engine(generator: &Arc<ScriptedGenerator>) -> Engine {
    test_engine_with(EngineConfig::default(), generator)
}

pub fn comment(phrase: &str, persona_id: &str) -> Comment {
    Comment {
        phrase: phrase.into(),
        persona_id: persona_id.into(),
        text: "...".into(),
    }
}
