use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::ChatMessage;
use crate::chat::repo_types::{ChatEntry, RecentChatUser};

/// Incoming transcript. The system prompt is ours; client-supplied system
/// turns are discarded before the model sees the transcript.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub messages: Vec<String>,
    pub text_response: String,
    pub session_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_history_limit")]
    pub limit: i64,
}

fn default_history_limit() -> i64 {
    10
}

#[derive(Debug, Serialize)]
pub struct ChatHistoryResponse {
    pub user_id: Uuid,
    pub total_chats: i64,
    pub chats: Vec<ChatEntry>,
}

#[derive(Debug, Serialize)]
pub struct DeleteHistoryResponse {
    pub deleted: u64,
}

#[derive(Debug, Serialize)]
pub struct RecentUsersResponse {
    pub users: Vec<RecentChatUser>,
}

#[derive(Debug, Serialize)]
pub struct ChatStatsResponse {
    pub total_chats: i64,
    pub total_users: i64,
    pub chats_last_7_days: i64,
}
