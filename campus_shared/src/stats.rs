use serde::{Deserialize, Serialize};

/// Per-user activity record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserStats {
    #[serde(default)]
    pub messages: u64,
    #[serde(default)]
    pub commands_used: u64,
    #[serde(default)]
    pub joined_at: Option<String>,
    #[serde(default)]
    pub modules: Vec<String>,
}
