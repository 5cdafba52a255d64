//! Rejection bookkeeping for one retry chain.

use serde::Serialize;

use super::validate::{Rejection, RejectionClass};

/// Phrases rejected so far in a chain, split by class.
///
/// Both lists only grow, keep first-seen order, and never share a phrase.
/// Entries are keyed on the trimmed, lowercased phrase: a hallucinated
/// `"exam "` is stored as `"exam"` and blacklists `"Exam"` and `"exam"` for
/// the rest of the chain. `Invalid` rejections are not recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RejectionRecord {
    pub not_found: Vec<String>,
    pub overlapping: Vec<String>,
}

fn same_phrase(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

impl RejectionRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `phrase` under the class of `rejection`. Returns `true` if it was new.
    pub fn record(&mut self, phrase: &str, rejection: &Rejection) -> bool {
        let phrase = phrase.trim();
        if phrase.is_empty() || self.contains(phrase) {
            return false;
        }
        match rejection.class() {
            RejectionClass::NotFound => self.not_found.push(phrase.to_string()),
            RejectionClass::Overlap => self.overlapping.push(phrase.to_string()),
            RejectionClass::Invalid => return false,
        }
        true
    }

    /// Whether `phrase` is on the chain's hallucination blacklist.
    pub fn is_not_found(&self, phrase: &str) -> bool {
        let phrase = phrase.trim();
        self.not_found.iter().any(|p| same_phrase(p, phrase))
    }

    pub fn contains(&self, phrase: &str) -> bool {
        let phrase = phrase.trim();
        self.not_found
            .iter()
            .chain(&self.overlapping)
            .any(|p| same_phrase(p, phrase))
    }

    pub fn is_empty(&self) -> bool {
        self.not_found.is_empty() && self.overlapping.is_empty()
    }

    pub fn len(&self) -> usize {
        self.not_found.len() + self.overlapping.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::validate::{Conflict, InvalidReason};

    #[test]
    fn records_by_class() {
        let mut record = RejectionRecord::new();
        assert!(record.record("final exam", &Rejection::NotFound));
        assert!(record.record("exam", &Rejection::Overlap(Conflict::Sentence(0))));
        assert_eq!(record.not_found, vec!["final exam"]);
        assert_eq!(record.overlapping, vec!["exam"]);
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn duplicates_are_ignored_case_insensitively() {
        let mut record = RejectionRecord::new();
        record.record("Final Exam", &Rejection::NotFound);
        assert!(!record.record("final exam", &Rejection::NotFound));
        assert!(!record.record("FINAL EXAM", &Rejection::Overlap(Conflict::Range)));
        assert_eq!(record.len(), 1);
        assert!(record.is_not_found("final exam "));
    }

    #[test]
    fn blacklist_keys_are_whitespace_normalized() {
        let mut record = RejectionRecord::new();
        assert!(record.record("  exam ", &Rejection::NotFound));
        assert_eq!(record.not_found, vec!["exam"]);
        assert!(record.is_not_found("exam"));
        assert!(record.is_not_found("EXAM"));
        assert!(!record.is_not_found("exams"));
    }

    #[test]
    fn invalid_rejections_are_not_blacklisted() {
        let mut record = RejectionRecord::new();
        let invalid = Rejection::Invalid(InvalidReason::UnknownPersona("x".into()));
        assert!(!record.record("exam", &invalid));
        assert!(record.is_empty());
    }
}
