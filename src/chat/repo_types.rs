use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// One stored question/answer exchange.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub user_message: String,
    pub ai_response: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RecentChatUser {
    pub user_id: Uuid,
    pub last_chat: OffsetDateTime,
    pub total_chats: i64,
}
