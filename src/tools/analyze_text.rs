//! MCP `analyze_text` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::engine::types::Comment;
use crate::persona::PersonaCatalog;

/// Parameters for the `analyze_text` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct AnalyzeTextParams {
    #[schemars(description = "The full current text of the journal entry")]
    pub text: String,

    #[schemars(
        description = "Writing session ID. Comments accumulate per session until it idles past the TTL."
    )]
    pub session_id: String,

    #[schemars(
        description = "Optional persona catalog keyed by persona ID (name, system_prompt, icon, color). Defaults to the server's catalog."
    )]
    pub personas: Option<PersonaCatalog>,

    #[schemars(
        description = "Optional list of comments the client already shows. When given, it replaces the session's own list."
    )]
    pub applied_comments: Option<Vec<Comment>>,

    #[schemars(description = "Extra instructions applied to every voice")]
    pub meta_prompt: Option<String>,

    #[schemars(description = "The writer's current emotional state")]
    pub state_prompt: Option<String>,

    #[schemars(
        description = "Density policy: 'sentence_exclusive' (one comment per sentence) or 'persona_unique' (one comment per persona). Defaults to the server setting."
    )]
    pub density_policy: Option<String>,
}
