//! Core engine type definitions.
//!
//! Defines the committed [`Comment`], the generator's raw [`Candidate`], the
//! caller-facing [`PlacedComment`], and the two policy switches
//! ([`DensityPolicy`] and [`SentenceSplit`]) that shape validation.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::persona::PersonaCatalog;

/// How many comments a session may hold, and where.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DensityPolicy {
    /// At most one comment per sentence; a persona may speak in many sentences.
    #[default]
    SentenceExclusive,
    /// At most one comment per persona across the whole session; sentences are not checked.
    PersonaUnique,
}

impl DensityPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SentenceExclusive => "sentence_exclusive",
            Self::PersonaUnique => "persona_unique",
        }
    }
}

impl std::fmt::Display for DensityPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DensityPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sentence_exclusive" => Ok(Self::SentenceExclusive),
            "persona_unique" => Ok(Self::PersonaUnique),
            _ => Err(format!("unknown density policy: {s}")),
        }
    }
}

/// Which punctuation ends a sentence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentenceSplit {
    /// `. ! ?`, `。 ！ ？` and line breaks.
    #[default]
    Standard,
    /// Everything in `Standard`, plus the CJK comma `，`.
    CjkComma,
}

impl SentenceSplit {
    pub fn is_terminator(&self, c: char) -> bool {
        match c {
            '.' | '!' | '?' | '。' | '！' | '？' | '\n' | '\r' => true,
            '，' => matches!(self, Self::CjkComma),
            _ => false,
        }
    }
}

/// A comment the session has accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Comment {
    /// Verbatim trigger phrase the comment is anchored to.
    pub phrase: String,
    pub persona_id: String,
    /// What the voice says.
    #[serde(alias = "comment")]
    pub text: String,
}

/// One proposal from the commentary generator, not yet validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub phrase: String,
    pub persona_id: String,
    pub comment: String,
}

impl Candidate {
    pub fn new(
        phrase: impl Into<String>,
        persona_id: impl Into<String>,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            phrase: phrase.into(),
            persona_id: persona_id.into(),
            comment: comment.into(),
        }
    }

    pub fn into_comment(self) -> Comment {
        Comment {
            phrase: self.phrase,
            persona_id: self.persona_id,
            text: self.comment,
        }
    }
}

/// A committed comment decorated with its persona's display fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacedComment {
    pub phrase: String,
    pub persona_id: String,
    pub persona_name: String,
    pub comment: String,
    pub icon: String,
    pub color: String,
}

impl PlacedComment {
    /// Decorate a comment from the catalog. Unknown personas fall back to the raw id.
    pub fn from_comment(comment: &Comment, catalog: &PersonaCatalog) -> Self {
        let persona = catalog.get(&comment.persona_id);
        Self {
            phrase: comment.phrase.clone(),
            persona_id: comment.persona_id.clone(),
            persona_name: persona
                .map(|p| p.name.clone())
                .unwrap_or_else(|| comment.persona_id.clone()),
            comment: comment.text.clone(),
            icon: persona.map(|p| p.icon.clone()).unwrap_or_default(),
            color: persona.map(|p| p.color.clone()).unwrap_or_default(),
        }
    }
}
