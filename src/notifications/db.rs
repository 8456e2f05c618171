//! Notification rows (admin actions, account events).

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub user_id: Uuid,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

pub async fn insert_notification(
    pool: &PgPool,
    user_id: Uuid,
    message: &str,
) -> Result<Notification, sqlx::Error> {
    sqlx::query_as::<_, Notification>(
        r#"
        INSERT INTO notifications (user_id, message, is_read, created_at)
        VALUES ($1, $2, FALSE, $3)
        RETURNING id, user_id, message, is_read, created_at
        "#,
    )
    .bind(user_id)
    .bind(message)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

pub async fn list_notifications(pool: &PgPool) -> Result<Vec<Notification>, sqlx::Error> {
    sqlx::query_as::<_, Notification>(
        r#"
        SELECT id, user_id, message, is_read, created_at
        FROM notifications
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Mark one notification read; returns whether a row was touched.
pub async fn mark_notification_read(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(r#"UPDATE notifications SET is_read = TRUE WHERE id = $1"#)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
