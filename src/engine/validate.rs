//! Candidate validation.
//!
//! [`Validator::check`] is a pure decision over the current text, the
//! committed comments, and one candidate. Checks run in a fixed order and
//! stop at the first failure:
//!
//! 1. persona known, phrase not blank → otherwise [`Rejection::Invalid`]
//! 2. phrase occurs in the text → otherwise [`Rejection::NotFound`]
//! 3. occurrence clear of claimed ranges (and, under sentence exclusivity,
//!    of occupied sentences) → otherwise [`Rejection::Overlap`]
//! 4. under persona uniqueness, persona not yet used → otherwise
//!    [`Rejection::Overlap`]
//!
//! [`Validator::reconcile`] and [`Validator::settle`] replay a whole comment
//! list through these rules, earliest first, keeping only what still fits.

use std::ops::Range;

use serde::Serialize;

use super::locate::{locate, sentence_of, Occupancy};
use super::types::{Candidate, Comment, DensityPolicy, SentenceSplit};
use crate::persona::PersonaCatalog;

/// Why a candidate is malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    BlankPhrase,
    UnknownPersona(String),
}

/// What an otherwise valid phrase collides with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    /// Shares characters with an existing comment's phrase.
    Range,
    /// Lands in a sentence that already carries a comment.
    Sentence(usize),
    /// The persona has already spoken in this session.
    Persona,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Invalid(InvalidReason),
    NotFound,
    Overlap(Conflict),
}

/// Coarse rejection classes, as fed back to the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionClass {
    Invalid,
    NotFound,
    Overlap,
}

impl Rejection {
    pub fn class(&self) -> RejectionClass {
        match self {
            Self::Invalid(_) => RejectionClass::Invalid,
            Self::NotFound => RejectionClass::NotFound,
            Self::Overlap(_) => RejectionClass::Overlap,
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(InvalidReason::BlankPhrase) => f.write_str("invalid: blank phrase"),
            Self::Invalid(InvalidReason::UnknownPersona(id)) => {
                write!(f, "invalid: unknown persona {id}")
            }
            Self::NotFound => f.write_str("not found in text"),
            Self::Overlap(Conflict::Range) => f.write_str("overlaps an existing comment"),
            Self::Overlap(Conflict::Sentence(i)) => write!(f, "sentence {i} already has a comment"),
            Self::Overlap(Conflict::Persona) => f.write_str("persona already used"),
        }
    }
}

/// Where an accepted candidate lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub span: Range<usize>,
    /// Sentence containing the start of the phrase, if any.
    pub sentence: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accept(Placement),
    Reject(Rejection),
}

impl Verdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, Self::Accept(_))
    }
}

/// Placement rules for one text snapshot.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'a> {
    pub text: &'a str,
    pub catalog: &'a PersonaCatalog,
    pub policy: DensityPolicy,
    pub split: SentenceSplit,
}

impl<'a> Validator<'a> {
    pub fn new(
        text: &'a str,
        catalog: &'a PersonaCatalog,
        policy: DensityPolicy,
        split: SentenceSplit,
    ) -> Self {
        Self {
            text,
            catalog,
            policy,
            split,
        }
    }

    /// Decide whether `candidate` may join `committed`.
    pub fn check(&self, committed: &[Comment], candidate: &Candidate) -> Verdict {
        let occupancy = Occupancy::build(self.text, committed, self.split);
        self.check_against(&occupancy, candidate)
    }

    /// Same as [`check`](Self::check) with a prebuilt occupancy index.
    pub fn check_against(&self, occupancy: &Occupancy<'_>, candidate: &Candidate) -> Verdict {
        if candidate.phrase.trim().is_empty() {
            return Verdict::Reject(Rejection::Invalid(InvalidReason::BlankPhrase));
        }
        if !self.catalog.contains(&candidate.persona_id) {
            return Verdict::Reject(Rejection::Invalid(InvalidReason::UnknownPersona(
                candidate.persona_id.clone(),
            )));
        }

        self.check_placement(occupancy, candidate)
    }

    /// Placement rules only: the phrase occurs and the density policy allows it.
    fn check_placement(&self, occupancy: &Occupancy<'_>, candidate: &Candidate) -> Verdict {
        let Some(span) = locate(self.text, &candidate.phrase) else {
            return Verdict::Reject(Rejection::NotFound);
        };

        if occupancy.range_taken(&span) {
            return Verdict::Reject(Rejection::Overlap(Conflict::Range));
        }

        match self.policy {
            DensityPolicy::SentenceExclusive => {
                if let Some(index) = occupancy.sentence_taken(&span) {
                    return Verdict::Reject(Rejection::Overlap(Conflict::Sentence(index)));
                }
            }
            DensityPolicy::PersonaUnique => {
                if occupancy.persona_used(&candidate.persona_id) {
                    return Verdict::Reject(Rejection::Overlap(Conflict::Persona));
                }
            }
        }

        let sentence = sentence_of(occupancy.sentences(), span.start);
        Verdict::Accept(Placement { span, sentence })
    }

    /// Re-admit `comments` one by one, dropping any that no longer validate.
    pub fn reconcile(&self, comments: Vec<Comment>) -> (Vec<Comment>, usize) {
        self.admit_each(comments, |occupancy, candidate| {
            self.check_against(occupancy, candidate)
        })
    }

    /// Re-place already committed comments after an edit, earliest first.
    ///
    /// Comments that left the text, now overlap an earlier one, or break the
    /// density policy are dropped. A persona missing from this call's catalog
    /// does not drop a comment.
    pub fn settle(&self, comments: Vec<Comment>) -> (Vec<Comment>, usize) {
        self.admit_each(comments, |occupancy, candidate| {
            self.check_placement(occupancy, candidate)
        })
    }

    fn admit_each(
        &self,
        comments: Vec<Comment>,
        check: impl Fn(&Occupancy<'_>, &Candidate) -> Verdict,
    ) -> (Vec<Comment>, usize) {
        let mut kept: Vec<Comment> = Vec::with_capacity(comments.len());
        let mut dropped = 0;
        for comment in comments {
            let candidate = Candidate::new(
                comment.phrase.clone(),
                comment.persona_id.clone(),
                comment.text.clone(),
            );
            let occupancy = Occupancy::build(self.text, &kept, self.split);
            if check(&occupancy, &candidate).is_accept() {
                kept.push(comment);
            } else {
                dropped += 1;
            }
        }
        (kept, dropped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "I am anxious about tomorrow's exam. I hope it goes well.";

    fn catalog() -> PersonaCatalog {
        PersonaCatalog::builtin()
    }

    fn committed(phrase: &str, persona: &str) -> Comment {
        Comment {
            phrase: phrase.into(),
            persona_id: persona.into(),
            text: "...".into(),
        }
    }

    fn check(policy: DensityPolicy, existing: &[Comment], candidate: Candidate) -> Verdict {
        let catalog = catalog();
        Validator::new(TEXT, &catalog, policy, SentenceSplit::Standard).check(existing, &candidate)
    }

    #[test]
    fn first_candidate_is_accepted_in_sentence_zero() {
        let verdict = check(
            DensityPolicy::SentenceExclusive,
            &[],
            Candidate::new("anxious about tomorrow's exam", "holder", "That's a lot."),
        );
        assert_eq!(
            verdict,
            Verdict::Accept(Placement {
                span: 5..34,
                sentence: Some(0)
            })
        );
    }

    #[test]
    fn second_sentence_is_still_free() {
        let existing = [committed("anxious about tomorrow's exam", "holder")];
        let verdict = check(
            DensityPolicy::SentenceExclusive,
            &existing,
            Candidate::new("I hope it goes well", "starter", "Plan one thing."),
        );
        assert!(matches!(verdict, Verdict::Accept(Placement { sentence: Some(1), .. })));
    }

    #[test]
    fn phrase_inside_claimed_range_is_overlap() {
        let existing = [committed("anxious about tomorrow's exam", "holder")];
        let verdict = check(
            DensityPolicy::SentenceExclusive,
            &existing,
            Candidate::new("exam", "mirror", "Exam, exam."),
        );
        assert_eq!(verdict, Verdict::Reject(Rejection::Overlap(Conflict::Range)));
    }

    #[test]
    fn occupied_sentence_is_overlap_even_without_shared_chars() {
        let existing = [committed("anxious", "holder")];
        let verdict = check(
            DensityPolicy::SentenceExclusive,
            &existing,
            Candidate::new("tomorrow's exam", "mirror", "Tomorrow."),
        );
        assert_eq!(
            verdict,
            Verdict::Reject(Rejection::Overlap(Conflict::Sentence(0)))
        );
    }

    #[test]
    fn phrase_not_in_text_is_not_found() {
        let verdict = check(
            DensityPolicy::SentenceExclusive,
            &[],
            Candidate::new("final exam", "holder", "..."),
        );
        assert_eq!(verdict, Verdict::Reject(Rejection::NotFound));
    }

    #[test]
    fn unknown_persona_and_blank_phrase_are_invalid() {
        let verdict = check(
            DensityPolicy::SentenceExclusive,
            &[],
            Candidate::new("exam", "narrator", "..."),
        );
        assert_eq!(
            verdict,
            Verdict::Reject(Rejection::Invalid(InvalidReason::UnknownPersona(
                "narrator".into()
            )))
        );

        let verdict = check(
            DensityPolicy::SentenceExclusive,
            &[],
            Candidate::new("   ", "holder", "..."),
        );
        assert_eq!(verdict, Verdict::Reject(Rejection::Invalid(InvalidReason::BlankPhrase)));
    }

    #[test]
    fn invalid_wins_over_not_found() {
        let verdict = check(
            DensityPolicy::SentenceExclusive,
            &[],
            Candidate::new("final exam", "narrator", "..."),
        );
        assert!(matches!(verdict, Verdict::Reject(Rejection::Invalid(_))));
    }

    #[test]
    fn persona_unique_ignores_sentences_but_not_personas() {
        let existing = [committed("anxious", "holder")];

        let same_sentence = check(
            DensityPolicy::PersonaUnique,
            &existing,
            Candidate::new("tomorrow's exam", "mirror", "..."),
        );
        assert!(same_sentence.is_accept());

        let reused = check(
            DensityPolicy::PersonaUnique,
            &existing,
            Candidate::new("I hope it goes well", "holder", "..."),
        );
        assert_eq!(reused, Verdict::Reject(Rejection::Overlap(Conflict::Persona)));
    }

    #[test]
    fn persona_unique_still_forbids_shared_characters() {
        let existing = [committed("anxious about", "holder")];
        let verdict = check(
            DensityPolicy::PersonaUnique,
            &existing,
            Candidate::new("about tomorrow", "mirror", "..."),
        );
        assert_eq!(verdict, Verdict::Reject(Rejection::Overlap(Conflict::Range)));
    }

    #[test]
    fn phrase_spanning_into_an_occupied_sentence_is_overlap() {
        let existing = [committed("goes well", "holder")];
        let verdict = check(
            DensityPolicy::SentenceExclusive,
            &existing,
            Candidate::new("exam. I", "mirror", "..."),
        );
        assert_eq!(
            verdict,
            Verdict::Reject(Rejection::Overlap(Conflict::Sentence(1)))
        );
    }

    #[test]
    fn reconcile_drops_conflicting_and_missing_comments() {
        let catalog = catalog();
        let validator = Validator::new(
            TEXT,
            &catalog,
            DensityPolicy::SentenceExclusive,
            SentenceSplit::Standard,
        );
        let (kept, dropped) = validator.reconcile(vec![
            committed("anxious", "holder"),
            committed("exam", "mirror"),
            committed("no longer here", "weaver"),
            committed("goes well", "starter"),
        ]);
        assert_eq!(dropped, 2);
        let phrases: Vec<_> = kept.iter().map(|c| c.phrase.as_str()).collect();
        assert_eq!(phrases, vec!["anxious", "goes well"]);
    }

    #[test]
    fn settle_drops_comments_an_edit_pushed_together() {
        let catalog = catalog();
        let text = "I am anxious about tomorrow's exam and I hope it goes well.";
        let validator = Validator::new(
            text,
            &catalog,
            DensityPolicy::SentenceExclusive,
            SentenceSplit::Standard,
        );
        let (kept, dropped) = validator.settle(vec![
            committed("anxious about tomorrow's exam", "holder"),
            committed("I hope it goes well", "starter"),
        ]);
        assert_eq!(dropped, 1);
        assert_eq!(kept, vec![committed("anxious about tomorrow's exam", "holder")]);
    }

    #[test]
    fn settle_keeps_comments_from_personas_outside_the_catalog() {
        let catalog = catalog();
        let validator = Validator::new(
            TEXT,
            &catalog,
            DensityPolicy::SentenceExclusive,
            SentenceSplit::Standard,
        );
        let (kept, dropped) = validator.settle(vec![
            committed("anxious", "retired_voice"),
            committed("exam", "holder"),
        ]);
        assert_eq!(dropped, 1);
        assert_eq!(kept[0].persona_id, "retired_voice");
    }

    #[test]
    fn rejection_classes() {
        assert_eq!(Rejection::NotFound.class(), RejectionClass::NotFound);
        assert_eq!(
            Rejection::Overlap(Conflict::Persona).class(),
            RejectionClass::Overlap
        );
        assert_eq!(
            Rejection::Invalid(InvalidReason::BlankPhrase).class(),
            RejectionClass::Invalid
        );
    }
}
