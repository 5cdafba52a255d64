//! Sentence segmentation.
//!
//! [`sentences`] yields trimmed, non-empty sentence spans in document order.
//! Offsets come from a single forward scan, so a sentence whose text repeats
//! earlier in the document still gets its own position.

use super::types::SentenceSplit;

/// A sentence span over the analysed text. `start..end` are byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sentence<'a> {
    pub start: usize,
    pub end: usize,
    pub text: &'a str,
}

impl Sentence<'_> {
    /// Whether `start..end` shares at least one byte with this sentence.
    pub fn intersects(&self, start: usize, end: usize) -> bool {
        start < self.end && self.start < end
    }
}

/// Lazy iterator over the sentences of a text. Clone it to restart.
#[derive(Debug, Clone)]
pub struct Sentences<'a> {
    text: &'a str,
    cursor: usize,
    split: SentenceSplit,
}

/// Segment `text` into sentences using the given terminator set.
pub fn sentences(text: &str, split: SentenceSplit) -> Sentences<'_> {
    Sentences {
        text,
        cursor: 0,
        split,
    }
}

impl<'a> Iterator for Sentences<'a> {
    type Item = Sentence<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let text: &'a str = self.text;
        let split = self.split;
        while self.cursor < text.len() {
            let rest = &text[self.cursor..];
            let chunk_len = rest
                .find(|c: char| split.is_terminator(c))
                .unwrap_or(rest.len());
            let chunk_start = self.cursor;

            // Skip the chunk and every terminator directly after it.
            let after = &rest[chunk_len..];
            let run = after
                .find(|c: char| !split.is_terminator(c))
                .unwrap_or(after.len());
            self.cursor += chunk_len + run;

            let chunk = &rest[..chunk_len];
            let trimmed = chunk.trim();
            if trimmed.is_empty() {
                continue;
            }
            let lead = chunk.len() - chunk.trim_start().len();
            let start = chunk_start + lead;
            return Some(Sentence {
                start,
                end: start + trimmed.len(),
                text: trimmed,
            });
        }
        None
    }
}
