use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ResetSessionParams {
    #[schemars(description = "ID of the writing session to forget")]
    pub session_id: String,
}
