//! Database operations for private messages.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::chat::events::PrivateMessageOut;

#[derive(Debug, sqlx::FromRow)]
pub struct PrivateMessageRow {
    pub id: i64,
    pub sender_phone: String,
    pub receiver_phone: String,
    pub sender_avatar: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl From<PrivateMessageRow> for PrivateMessageOut {
    fn from(row: PrivateMessageRow) -> Self {
        PrivateMessageOut {
            id: row.id,
            sender_phone_number: row.sender_phone,
            receiver_phone_number: row.receiver_phone,
            sender_profile_avatar: row.sender_avatar,
            message: row.body,
            created_at: row.created_at,
        }
    }
}

/// One entry in a user's conversation list: the latest message exchanged
/// with a peer, by creation time (ties broken by id), plus the unread
/// count.
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub peer_phone: String,
    pub last_message: String,
    pub last_message_at: DateTime<Utc>,
    pub unread_count: i64,
}

/// Persist a private message.
pub async fn insert_private_message(
    pool: &PgPool,
    sender_phone: &str,
    receiver_phone: &str,
    sender_avatar: Option<&str>,
    body: &str,
) -> Result<PrivateMessageOut, sqlx::Error> {
    let row = sqlx::query_as::<_, PrivateMessageRow>(
        r#"
        INSERT INTO private_messages (sender_phone, receiver_phone, sender_avatar, body, read, created_at)
        VALUES ($1, $2, $3, $4, FALSE, $5)
        RETURNING id, sender_phone, receiver_phone, sender_avatar, body, created_at
        "#,
    )
    .bind(sender_phone)
    .bind(receiver_phone)
    .bind(sender_avatar)
    .bind(body)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(row.into())
}

/// Full history between a pair, in either direction, ordered by creation
/// time ascending. Both participants see the identical sequence.
pub async fn history_between(
    pool: &PgPool,
    a: &str,
    b: &str,
) -> Result<Vec<PrivateMessageOut>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PrivateMessageRow>(
        r#"
        SELECT id, sender_phone, receiver_phone, sender_avatar, body, created_at
        FROM private_messages
        WHERE (sender_phone = $1 AND receiver_phone = $2)
           OR (sender_phone = $2 AND receiver_phone = $1)
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(a)
    .bind(b)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(PrivateMessageOut::from).collect())
}

/// Find a message by id AND sender - ownership is enforced at the query
/// level, not with a secondary check.
pub async fn find_by_id_and_sender(
    pool: &PgPool,
    message_id: i64,
    sender_phone: &str,
) -> Result<Option<PrivateMessageRow>, sqlx::Error> {
    sqlx::query_as::<_, PrivateMessageRow>(
        r#"
        SELECT id, sender_phone, receiver_phone, sender_avatar, body, created_at
        FROM private_messages
        WHERE id = $1 AND sender_phone = $2
        "#,
    )
    .bind(message_id)
    .bind(sender_phone)
    .fetch_optional(pool)
    .await
}

pub async fn delete_private_message(pool: &PgPool, message_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query(r#"DELETE FROM private_messages WHERE id = $1"#)
        .bind(message_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Conversation list for a user: latest message per peer. Latest means
/// greatest created_at (id as tie-break), not a text-level aggregate.
pub async fn conversations_for(
    pool: &PgPool,
    phone: &str,
) -> Result<Vec<ConversationSummary>, sqlx::Error> {
    sqlx::query_as::<_, ConversationSummary>(
        r#"
        SELECT DISTINCT ON (peer_phone)
            CASE WHEN sender_phone = $1 THEN receiver_phone ELSE sender_phone END AS peer_phone,
            body AS last_message,
            created_at AS last_message_at,
            (
                SELECT COUNT(*) FROM private_messages unread
                WHERE unread.receiver_phone = $1
                  AND unread.sender_phone =
                      CASE WHEN pm.sender_phone = $1 THEN pm.receiver_phone ELSE pm.sender_phone END
                  AND unread.read = FALSE
            ) AS unread_count
        FROM private_messages pm
        WHERE sender_phone = $1 OR receiver_phone = $1
        ORDER BY peer_phone, created_at DESC, id DESC
        "#,
    )
    .bind(phone)
    .fetch_all(pool)
    .await
}

/// Mark everything a peer sent to this user as read.
pub async fn mark_read_from(
    pool: &PgPool,
    receiver_phone: &str,
    peer_phone: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE private_messages SET read = TRUE
        WHERE receiver_phone = $1 AND sender_phone = $2 AND read = FALSE
        "#,
    )
    .bind(receiver_phone)
    .bind(peer_phone)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
