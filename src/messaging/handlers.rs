//! REST adjuncts to private chat: the conversation list and read
//! receipts. Message delivery itself happens over the socket.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::json;

use crate::error::ApiResult;
use crate::middleware::auth::AuthUser;
use crate::server::state::AppState;

use super::db;

/// `GET /api/chats` - one entry per peer, carrying the latest message
/// by creation time and the unread count.
pub async fn get_conversations(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> ApiResult<Json<serde_json::Value>> {
    let conversations = db::conversations_for(&state.db, &caller.phone_number).await?;

    Ok(Json(json!({
        "success": true,
        "totalConversations": conversations.len(),
        "conversations": conversations,
    })))
}

/// `PATCH /api/chats/{peer_phone}/read` - mark everything the peer sent
/// to the caller as read.
pub async fn mark_conversation_read(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(peer_phone): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let updated = db::mark_read_from(&state.db, &caller.phone_number, &peer_phone).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Conversation marked as read",
        "updated": updated,
    })))
}
