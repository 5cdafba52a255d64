//! Inline persona commentary for journal text.
//!
//! Marginalia watches a journal entry as it is written and, on each call,
//! asks a text-generation model for one short comment from a persona voice,
//! anchored to a verbatim phrase of the entry. The engine decides which
//! proposals are legal placements:
//!
//! | Rule | Rejection |
//! |------|-----------|
//! | Persona must be in the catalog, phrase must not be blank | Invalid |
//! | Phrase must occur in the text (case-insensitive) | Not found |
//! | Phrase must not share characters with an existing comment | Overlap |
//! | One comment per sentence (default) or per persona | Overlap |
//!
//! Rejected phrases are fed back into the next attempt's prompt, up to a fixed
//! attempt budget. Sessions keep their comments in memory, drop the ones whose
//! phrase was deleted, and expire after a period of inactivity.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`engine`]: Segmentation, validation, the retry loop, and session state
//! - [`generator`]: The commentary generator trait and its OpenAI-compatible client
//! - [`persona`]: Persona catalogs and the built-in voices

pub mod config;
pub mod engine;
pub mod generator;
pub mod persona;
