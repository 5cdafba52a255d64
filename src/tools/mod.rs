pub mod analyze_text;
pub mod list_personas;
pub mod reset_session;

use analyze_text::AnalyzeTextParams;
use list_personas::ListPersonasParams;
use reset_session::ResetSessionParams;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use std::sync::Arc;

use crate::engine::types::DensityPolicy;
use crate::engine::{AnalysisRequest, Engine};

/// The Marginalia MCP tool handler. Holds the shared engine and exposes all
/// MCP tools via the `#[tool_router]` macro.
#[derive(Clone)]
pub struct MarginaliaTools {
    tool_router: ToolRouter<Self>,
    engine: Arc<Engine>,
}

#[tool_router]
impl MarginaliaTools {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            engine,
        }
    }

    /// Ask for one new inline comment on the current text.
    #[tool(description = "Analyze the current journal text and return at most one new inline comment from a persona voice, plus every comment the session now holds. Comments whose phrase was deleted from the text are dropped.")]
    async fn analyze_text(
        &self,
        Parameters(params): Parameters<AnalyzeTextParams>,
    ) -> Result<String, String> {
        // 1. Validate inputs
        if params.session_id.trim().is_empty() {
            return Err("session_id must not be empty".into());
        }
        let density_policy = params
            .density_policy
            .as_deref()
            .map(str::parse::<DensityPolicy>)
            .transpose()?;
        if let Some(personas) = &params.personas {
            if personas.is_empty() {
                return Err("personas must define at least one persona".into());
            }
        }

        tracing::info!(
            session_id = %params.session_id,
            text_len = params.text.len(),
            "analyze_text called"
        );

        // 2. Run one analysis round
        let report = self
            .engine
            .analyze(AnalysisRequest {
                session_id: params.session_id,
                text: params.text,
                personas: params.personas,
                applied_comments: params.applied_comments,
                meta_prompt: params.meta_prompt,
                state_prompt: params.state_prompt,
                density_policy,
            })
            .await;

        serde_json::to_string(&report).map_err(|e| format!("serialization failed: {e}"))
    }

    /// Drop a session's comments immediately.
    #[tool(description = "Forget every comment held for a writing session. The next analyze_text call starts from an empty list.")]
    async fn reset_session(
        &self,
        Parameters(params): Parameters<ResetSessionParams>,
    ) -> Result<String, String> {
        tracing::info!(session_id = %params.session_id, "reset_session called");
        let removed = self.engine.reset_session(&params.session_id);
        Ok(serde_json::json!({
            "session_id": params.session_id,
            "removed": removed,
        })
        .to_string())
    }

    /// List the server's default persona catalog.
    #[tool(description = "List the default persona voices (ID, name, style prompt, icon, color), or look up a single persona by ID.")]
    async fn list_personas(
        &self,
        Parameters(params): Parameters<ListPersonasParams>,
    ) -> Result<String, String> {
        let catalog = self.engine.catalog();
        let body = match params.persona_id.as_deref() {
            Some(id) => {
                let persona = catalog
                    .get(id)
                    .ok_or_else(|| format!("unknown persona: {id}"))?;
                serde_json::json!({ "id": id, "persona": persona })
            }
            None => serde_json::to_value(catalog)
                .map_err(|e| format!("serialization failed: {e}"))?,
        };
        Ok(body.to_string())
    }
}

#[tool_handler]
impl ServerHandler for MarginaliaTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "Marginalia places short persona comments on journal text. Call analyze_text \
                 with the full text after each edit, list_personas to see the voices, and \
                 reset_session to start a session over."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
