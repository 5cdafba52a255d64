//! Prompt assembly for the commentary generator.
//!
//! [`PromptBuilder`] renders structured sections into one deterministic
//! prompt string. Sections with nothing to say are omitted.

use std::fmt::Write;

use super::rejections::RejectionRecord;
use super::types::Comment;
use crate::persona::PersonaCatalog;

const RULE: &str = "════════════════════════════════════════════════════════════════";

/// Shape the generator must answer in.
pub const REPLY_FORMAT: &str = r#"{"voice": null}
or
{"voice": {"reasoning": "...", "phrase": "...", "voice_id": "...", "comment": "..."}}"#;

#[derive(Debug, Clone, Copy)]
pub struct PromptBuilder<'a> {
    text: &'a str,
    catalog: &'a PersonaCatalog,
    committed: &'a [Comment],
    rejections: Option<&'a RejectionRecord>,
    meta_prompt: Option<&'a str>,
    state_prompt: Option<&'a str>,
}

fn heading(out: &mut String, title: &str) {
    let _ = write!(out, "\n\n{RULE}\n{title}\n{RULE}\n");
}

fn quoted_list(phrases: &[String]) -> String {
    let items: Vec<String> = phrases.iter().map(|p| format!("\"{p}\"")).collect();
    format!("[{}]", items.join(", "))
}

impl<'a> PromptBuilder<'a> {
    pub fn new(text: &'a str, catalog: &'a PersonaCatalog) -> Self {
        Self {
            text,
            catalog,
            committed: &[],
            rejections: None,
            meta_prompt: None,
            state_prompt: None,
        }
    }

    pub fn committed(mut self, committed: &'a [Comment]) -> Self {
        self.committed = committed;
        self
    }

    pub fn rejections(mut self, rejections: &'a RejectionRecord) -> Self {
        self.rejections = Some(rejections);
        self
    }

    /// Extra instructions that apply to every voice. Blank input is ignored.
    pub fn meta_prompt(mut self, meta: Option<&'a str>) -> Self {
        self.meta_prompt = meta.map(str::trim).filter(|s| !s.is_empty());
        self
    }

    /// The writer's current emotional state. Blank input is ignored.
    pub fn state_prompt(mut self, state: Option<&'a str>) -> Self {
        self.state_prompt = state.map(str::trim).filter(|s| !s.is_empty());
        self
    }

    fn highlighted(&self) -> Vec<String> {
        self.committed.iter().map(|c| c.phrase.clone()).collect()
    }

    pub fn build(&self) -> String {
        let empty = RejectionRecord::default();
        let rejections = self.rejections.unwrap_or(&empty);
        let highlighted = self.highlighted();
        let overlapping = quoted_list(&rejections.overlapping);
        let not_found = quoted_list(&rejections.not_found);

        let mut out = String::from(
            "You are analyzing internal dialogue as distinct inner voice personas.",
        );

        heading(&mut out, "TEXT TO ANALYZE (extract your phrase from THIS text ONLY):");
        let _ = write!(out, "\n\"{}\"", self.text);

        heading(&mut out, "AVAILABLE VOICE PERSONAS (choose ONE from this list):");
        for (id, persona) in self.catalog.iter() {
            let _ = write!(
                out,
                "\n- ID: {id} | Name: {} | ({}, {})",
                persona.name, persona.icon, persona.color
            );
            if !persona.system_prompt.is_empty() {
                let _ = write!(out, "\n  {}", persona.system_prompt);
            }
        }

        if !self.committed.is_empty() {
            heading(
                &mut out,
                "EXISTING CONVERSATION (for context - do NOT extract phrases from here):",
            );
            for comment in self.committed {
                let name = self
                    .catalog
                    .get(&comment.persona_id)
                    .map(|p| p.name.as_str())
                    .unwrap_or(comment.persona_id.as_str());
                let _ = write!(
                    out,
                    "\n{name} commented on \"{}\":\n  → {}\n",
                    comment.phrase, comment.text
                );
            }
            let _ = write!(
                out,
                "\nAlready highlighted phrases (do NOT overlap): {}\n",
                quoted_list(&highlighted)
            );
        }

        if !rejections.overlapping.is_empty() {
            heading(&mut out, "REJECTED PHRASES (these were tried but overlapped):");
            for phrase in &rejections.overlapping {
                let _ = write!(out, "\n  ✗ \"{phrase}\" - REJECTED, do NOT suggest again");
            }
            out.push_str("\n\nDo NOT suggest any variation of these phrases!");
        }

        if !rejections.not_found.is_empty() {
            heading(
                &mut out,
                "HARD BLACKLIST - NOT FOUND (extraction errors, never suggest):",
            );
            for phrase in &rejections.not_found {
                let _ = write!(
                    out,
                    "\n  ✗ \"{phrase}\" - NOT FOUND IN TEXT, do NOT suggest again"
                );
            }
            out.push_str(
                "\n\nThese phrases failed character-by-character verification. \
                 Treat them as forbidden even if they look present. \
                 If you cannot find a safe phrase, return null.",
            );
        }

        heading(&mut out, "YOUR TASK:");
        let _ = write!(
            out,
            "\nFind ONE NEW voice to comment.\n\
             \n\
             0. Reasoning: list 1-3 candidate substrings of the text, verify each is an exact \
             substring, drop any on the rejected or not-found lists, then choose exactly one.\n\
             1. Extract a SHORT phrase (2-4 words) from TEXT TO ANALYZE. It MUST be an exact \
             substring of that text.\n\
             2. Choose a voice ID from the persona list. Return the ID, not the name.\n\
             3. Write what this voice is saying (1-2 sentences), in the same language as the text.\n\
             \n\
             RULES:\n\
             - Return ONLY ONE comment, or null if nothing is worth commenting on\n\
             - DO NOT overlap already highlighted phrases: {}\n\
             - DO NOT suggest rejected phrases: {overlapping}\n\
             - DO NOT suggest not-found phrases: {not_found}\n\
             - DO NOT invent voice IDs\n\
             \n\
             Reply with JSON only:\n{REPLY_FORMAT}",
            quoted_list(&highlighted)
        );

        if let Some(meta) = self.meta_prompt {
            let _ = write!(out, "\n\nAdditional instructions:\n{meta}");
        }
        if let Some(state) = self.state_prompt {
            let _ = write!(out, "\n\nUser's current state:\n{state}");
        }

        let _ = write!(
            out,
            "\n\nFINAL REMINDER (hard constraints):\n\
             - DO NOT suggest rejected phrases: {overlapping}\n\
             - DO NOT suggest not-found phrases: {not_found}\n\
             If you cannot comply, return null."
        );

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::validate::{Conflict, Rejection};

    const TEXT: &str = "I am anxious about tomorrow's exam. I hope it goes well.";

    #[test]
    fn minimal_prompt_has_text_and_personas_only() {
        let catalog = PersonaCatalog::builtin();
        let prompt = PromptBuilder::new(TEXT, &catalog).build();

        assert!(prompt.contains(&format!("\"{TEXT}\"")));
        assert!(prompt.contains("- ID: holder | Name: 接纳者 (The Holder) | (heart, pink)"));
        assert!(!prompt.contains("EXISTING CONVERSATION"));
        assert!(!prompt.contains("REJECTED PHRASES"));
        assert!(!prompt.contains("HARD BLACKLIST"));
        assert!(!prompt.contains("Additional instructions"));
    }

    #[test]
    fn sections_follow_supplied_state() {
        let catalog = PersonaCatalog::builtin();
        let committed = vec![Comment {
            phrase: "anxious about tomorrow's exam".into(),
            persona_id: "holder".into(),
            text: "It makes sense to feel this.".into(),
        }];
        let mut rejections = RejectionRecord::new();
        rejections.record("final exam", &Rejection::NotFound);
        rejections.record("exam", &Rejection::Overlap(Conflict::Range));

        let prompt = PromptBuilder::new(TEXT, &catalog)
            .committed(&committed)
            .rejections(&rejections)
            .meta_prompt(Some("  Be brief.  "))
            .state_prompt(Some("tired"))
            .build();

        assert!(prompt.contains("接纳者 (The Holder) commented on \"anxious about tomorrow's exam\""));
        assert!(prompt.contains("Already highlighted phrases (do NOT overlap): [\"anxious about tomorrow's exam\"]"));
        assert!(prompt.contains("✗ \"exam\" - REJECTED"));
        assert!(prompt.contains("✗ \"final exam\" - NOT FOUND IN TEXT"));
        assert!(prompt.contains("Additional instructions:\nBe brief."));
        assert!(prompt.contains("User's current state:\ntired"));

        // Blacklists are repeated at the very end.
        let reminder = prompt.rfind("FINAL REMINDER").unwrap();
        assert!(prompt[reminder..].contains("[\"final exam\"]"));
        assert!(prompt[reminder..].contains("[\"exam\"]"));
    }

    #[test]
    fn blank_instructions_are_dropped() {
        let catalog = PersonaCatalog::builtin();
        let prompt = PromptBuilder::new(TEXT, &catalog)
            .meta_prompt(Some("   "))
            .state_prompt(None)
            .build();
        assert!(!prompt.contains("Additional instructions"));
        assert!(!prompt.contains("User's current state"));
    }

    #[test]
    fn output_is_deterministic() {
        let catalog = PersonaCatalog::builtin();
        let a = PromptBuilder::new(TEXT, &catalog).build();
        let b = PromptBuilder::new(TEXT, &catalog).build();
        assert_eq!(a, b);
    }
}
