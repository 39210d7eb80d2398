use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::{
    agent::{ChatMessage, Role, SYSTEM_PROMPT},
    auth::extractors::{AdminUser, CurrentUser},
    chat::{
        dto::{
            ChatHistoryResponse, ChatRequest, ChatResponse, ChatStatsResponse,
            DeleteHistoryResponse, HistoryQuery, RecentUsersResponse,
        },
        repo,
    },
    error::{AppError, AppResult},
    state::AppState,
};

pub fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat))
        .route("/chat/history", get(history).delete(clear_history))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/chat/admin/recent-users", get(recent_users))
        .route("/chat/admin/stats", get(stats))
}

/// The system prompt is ours alone; any system turn a client smuggles into
/// the transcript is dropped before it reaches the model.
fn client_turns(messages: &[ChatMessage]) -> Vec<ChatMessage> {
    messages
        .iter()
        .filter(|m| m.role != Role::System)
        .cloned()
        .collect()
}

#[instrument(skip(state, user, payload), fields(user_id = %user.0.id))]
pub async fn chat(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    let CurrentUser(user) = user;
    let turns = client_turns(&payload.messages);
    if turns.is_empty() {
        return Err(AppError::Validation(
            "messages must contain a user or assistant turn".into(),
        ));
    }

    let mut transcript = Vec::with_capacity(turns.len() + 1);
    transcript.push(ChatMessage::system(SYSTEM_PROMPT));
    transcript.extend(turns.iter().cloned());

    let reply = state.agent.complete(&transcript).await.map_err(|e| {
        error!(error = %e, "agent completion failed");
        AppError::BadGateway("Agent is unavailable".into())
    })?;

    // Last client turn is what we index the history on
    let user_message = turns.last().map(|m| m.content.clone()).unwrap_or_default();

    let session_id = Uuid::new_v4();
    repo::insert_entry(&state.db, user.id, session_id, &user_message, &reply).await?;
    let pruned = repo::prune_history(&state.db, user.id, repo::HISTORY_KEEP).await?;
    if pruned > 0 {
        info!(user_id = %user.id, pruned, "old chat entries pruned");
    }

    Ok(Json(ChatResponse {
        messages: vec![reply.clone()],
        text_response: reply,
        session_id,
        user_id: user.id,
    }))
}

#[instrument(skip(state, user), fields(user_id = %user.0.id))]
pub async fn history(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(q): Query<HistoryQuery>,
) -> AppResult<Json<ChatHistoryResponse>> {
    let CurrentUser(user) = user;
    let limit = q.limit.clamp(1, repo::HISTORY_KEEP);
    let chats = repo::history_for_user(&state.db, user.id, limit).await?;
    let total_chats = repo::count_for_user(&state.db, user.id).await?;
    Ok(Json(ChatHistoryResponse {
        user_id: user.id,
        total_chats,
        chats,
    }))
}

#[instrument(skip(state, user), fields(user_id = %user.0.id))]
pub async fn clear_history(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<DeleteHistoryResponse>> {
    let CurrentUser(user) = user;
    let deleted = repo::delete_for_user(&state.db, user.id).await?;
    info!(user_id = %user.id, deleted, "chat history cleared");
    Ok(Json(DeleteHistoryResponse { deleted }))
}

#[instrument(skip_all)]
pub async fn recent_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> AppResult<Json<RecentUsersResponse>> {
    let users = repo::recent_users(&state.db, 20).await?;
    Ok(Json(RecentUsersResponse { users }))
}

#[instrument(skip_all)]
pub async fn stats(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> AppResult<Json<ChatStatsResponse>> {
    let total_chats = repo::total_chats(&state.db).await?;
    let total_users = repo::total_users_with_chats(&state.db).await?;
    let chats_last_7_days = repo::chats_last_7_days(&state.db).await?;
    Ok(Json(ChatStatsResponse {
        total_chats,
        total_users,
        chats_last_7_days,
    }))
}
