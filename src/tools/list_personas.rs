use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ListPersonasParams {
    #[schemars(description = "Optional persona ID to look up instead of listing all")]
    pub persona_id: Option<String>,
}
