//! Phrase location and occupancy.
//!
//! Phrases match case-insensitively by folding each character to lowercase,
//! so returned byte ranges always fall on char boundaries of the original
//! text even when lowercasing changes a character's encoded length.

use std::collections::{BTreeSet, HashSet};
use std::ops::Range;

use super::segment::{sentences, Sentence};
use super::types::{Comment, SentenceSplit};

fn fold(s: &str) -> Vec<char> {
    s.chars().flat_map(char::to_lowercase).collect()
}

/// Match the folded needle at byte `start`; returns the end byte of the match.
fn match_at(haystack: &str, start: usize, needle: &[char]) -> Option<usize> {
    let mut matched = 0;
    for (offset, c) in haystack[start..].char_indices() {
        for lower in c.to_lowercase() {
            // Needle ended inside a multi-char fold: not a whole-char match.
            if matched == needle.len() || needle[matched] != lower {
                return None;
            }
            matched += 1;
        }
        if matched == needle.len() {
            return Some(start + offset + c.len_utf8());
        }
    }
    None
}

/// First case-insensitive occurrence of `phrase` in `text`, as a byte range.
pub fn locate(text: &str, phrase: &str) -> Option<Range<usize>> {
    let needle = fold(phrase);
    if needle.is_empty() {
        return None;
    }
    text.char_indices()
        .find_map(|(start, _)| match_at(text, start, &needle).map(|end| start..end))
}

/// Every case-insensitive occurrence of `phrase`, overlapping ones included.
pub fn locate_all(text: &str, phrase: &str) -> Vec<Range<usize>> {
    let needle = fold(phrase);
    if needle.is_empty() {
        return Vec::new();
    }
    text.char_indices()
        .filter_map(|(start, _)| match_at(text, start, &needle).map(|end| start..end))
        .collect()
}

/// Whether `phrase` still occurs in `text`, ignoring case.
pub fn contains(text: &str, phrase: &str) -> bool {
    locate(text, phrase).is_some()
}

/// Index of the sentence containing byte `offset`.
pub fn sentence_of(sentences: &[Sentence<'_>], offset: usize) -> Option<usize> {
    sentences
        .iter()
        .position(|s| s.start <= offset && offset < s.end)
}

/// Indices of every sentence the byte range touches.
pub fn touched_sentences(sentences: &[Sentence<'_>], span: &Range<usize>) -> Vec<usize> {
    sentences
        .iter()
        .enumerate()
        .filter(|(_, s)| s.intersects(span.start, span.end))
        .map(|(i, _)| i)
        .collect()
}

fn ranges_intersect(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

/// What the committed comments already claim in the current text.
///
/// Built fresh for every call: edits shift offsets, so nothing is cached.
#[derive(Debug, Default)]
pub struct Occupancy<'a> {
    sentences: Vec<Sentence<'a>>,
    ranges: Vec<Range<usize>>,
    occupied: BTreeSet<usize>,
    personas: HashSet<String>,
}

impl<'a> Occupancy<'a> {
    pub fn build(text: &'a str, comments: &[Comment], split: SentenceSplit) -> Self {
        let mut occupancy = Self {
            sentences: sentences(text, split).collect(),
            ..Self::default()
        };
        for comment in comments {
            occupancy.personas.insert(comment.persona_id.clone());
            for span in locate_all(text, &comment.phrase) {
                let touched = touched_sentences(&occupancy.sentences, &span);
                occupancy.occupied.extend(touched);
                occupancy.ranges.push(span);
            }
        }
        occupancy
    }

    pub fn sentences(&self) -> &[Sentence<'a>] {
        &self.sentences
    }

    pub fn ranges(&self) -> &[Range<usize>] {
        &self.ranges
    }

    pub fn occupied_sentences(&self) -> impl Iterator<Item = usize> + '_ {
        self.occupied.iter().copied()
    }

    pub fn range_taken(&self, span: &Range<usize>) -> bool {
        self.ranges.iter().any(|r| ranges_intersect(r, span))
    }

    /// First occupied sentence the span touches, if any.
    pub fn sentence_taken(&self, span: &Range<usize>) -> Option<usize> {
        touched_sentences(&self.sentences, span)
            .into_iter()
            .find(|i| self.occupied.contains(i))
    }

    pub fn persona_used(&self, persona_id: &str) -> bool {
        self.personas.contains(persona_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "I am anxious about tomorrow's exam. I hope it goes well.";

    fn comment(phrase: &str, persona: &str) -> Comment {
        Comment {
            phrase: phrase.into(),
            persona_id: persona.into(),
            text: "...".into(),
        }
    }

    #[test]
    fn locate_is_case_insensitive() {
        assert_eq!(locate(TEXT, "ANXIOUS"), Some(5..12));
        assert_eq!(&TEXT[locate(TEXT, "i HOPE").unwrap()], "I hope");
    }

    #[test]
    fn locate_returns_first_occurrence() {
        assert_eq!(locate("go, go, go", "go"), Some(0..2));
        assert_eq!(locate_all("go, go, go", "go"), vec![0..2, 4..6, 8..10]);
    }

    #[test]
    fn locate_all_includes_overlapping_matches() {
        assert_eq!(locate_all("aaa", "aa"), vec![0..2, 1..3]);
    }

    #[test]
    fn missing_and_empty_phrases_are_not_found() {
        assert_eq!(locate(TEXT, "final exam"), None);
        assert_eq!(locate(TEXT, ""), None);
        assert!(locate_all(TEXT, "").is_empty());
    }

    #[test]
    fn ranges_respect_multibyte_text() {
        let text = "今天很累。明天考试！";
        let span = locate(text, "明天考试").unwrap();
        assert_eq!(&text[span], "明天考试");
    }

    #[test]
    fn folding_that_changes_length_keeps_char_boundaries() {
        // 'İ' lowercases to two chars; a needle covering only half of it must not match.
        let text = "İstanbul";
        assert_eq!(locate(text, "i"), None);
        let span = locate(text, "i\u{307}stanbul").unwrap();
        assert_eq!(span, 0..text.len());
    }

    #[test]
    fn sentence_of_maps_offsets() {
        let sentences: Vec<_> = sentences(TEXT, SentenceSplit::Standard).collect();
        assert_eq!(sentence_of(&sentences, 5), Some(0));
        assert_eq!(sentence_of(&sentences, TEXT.find("hope").unwrap()), Some(1));
        // The period between sentences belongs to neither.
        assert_eq!(sentence_of(&sentences, TEXT.find('.').unwrap()), None);
    }

    #[test]
    fn occupancy_tracks_ranges_sentences_and_personas() {
        let comments = vec![comment("anxious about tomorrow's exam", "holder")];
        let occupancy = Occupancy::build(TEXT, &comments, SentenceSplit::Standard);

        assert_eq!(occupancy.occupied_sentences().collect::<Vec<_>>(), vec![0]);
        assert_eq!(occupancy.ranges(), &[5..34]);
        assert!(occupancy.persona_used("holder"));
        assert!(!occupancy.persona_used("mirror"));

        let exam = locate(TEXT, "exam").unwrap();
        assert!(occupancy.range_taken(&exam));
        assert_eq!(occupancy.sentence_taken(&exam), Some(0));

        let hope = locate(TEXT, "I hope it goes well").unwrap();
        assert!(!occupancy.range_taken(&hope));
        assert_eq!(occupancy.sentence_taken(&hope), None);
    }

    #[test]
    fn comments_missing_from_text_claim_nothing() {
        let comments = vec![comment("deleted words", "holder")];
        let occupancy = Occupancy::build(TEXT, &comments, SentenceSplit::Standard);
        assert!(occupancy.ranges().is_empty());
        assert_eq!(occupancy.occupied_sentences().count(), 0);
    }
}
