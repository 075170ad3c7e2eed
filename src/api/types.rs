//! Request and response records exchanged with the replica API.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub id: String,
    pub email: String,
    pub name: String,
}

/// A replica as returned by listing or creation. Creation only echoes `uuid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaRecord {
    pub uuid: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplicaList {
    #[serde(default)]
    pub items: Vec<ReplicaRecord>,
}

impl ReplicaList {
    pub fn find_by_slug(&self, slug: &str) -> Option<&ReplicaRecord> {
        self.items.iter().find(|r| r.slug == slug)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReplica {
    pub name: String,
    pub short_description: String,
    pub greeting: String,
    pub slug: String,
    #[serde(rename = "ownerID")]
    pub owner_id: String,
    pub llm: LlmSettings,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmSettings {
    pub model: String,
    pub memory_mode: String,
    pub system_message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub content: String,
    pub source: String,
    pub skip_chat_history: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
}
