//! Group and membership persistence.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::users::User;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChatGroup {
    pub id: i64,
    pub court_id: String,
    pub court_name: String,
    pub group_name: String,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub admin_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A group as seen by one of its members, carrying the latest message
/// by creation time (not any text-level aggregate).
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GroupWithLatest {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub group: ChatGroup,
    pub last_message: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct NewGroup {
    pub court_id: String,
    pub court_name: String,
    pub group_name: String,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub admin_id: Uuid,
}

pub async fn find_group_by_court(
    pool: &PgPool,
    court_id: &str,
) -> Result<Option<ChatGroup>, sqlx::Error> {
    sqlx::query_as::<_, ChatGroup>(
        r#"
        SELECT id, court_id, court_name, group_name, latitude, longitude, admin_id, created_at
        FROM chat_groups
        WHERE court_id = $1
        "#,
    )
    .bind(court_id)
    .fetch_optional(pool)
    .await
}

pub async fn create_group(pool: &PgPool, new_group: NewGroup) -> Result<ChatGroup, sqlx::Error> {
    sqlx::query_as::<_, ChatGroup>(
        r#"
        INSERT INTO chat_groups (court_id, court_name, group_name, latitude, longitude, admin_id, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, court_id, court_name, group_name, latitude, longitude, admin_id, created_at
        "#,
    )
    .bind(&new_group.court_id)
    .bind(&new_group.court_name)
    .bind(&new_group.group_name)
    .bind(&new_group.latitude)
    .bind(&new_group.longitude)
    .bind(new_group.admin_id)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

pub async fn is_member(
    pool: &PgPool,
    group_id: i64,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let found: Option<(i64,)> = sqlx::query_as(
        r#"SELECT id FROM group_members WHERE group_id = $1 AND user_id = $2"#,
    )
    .bind(group_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(found.is_some())
}

/// Add a user to a group, denormalizing the identity fields the
/// real-time layer reads at message time.
pub async fn add_member(pool: &PgPool, group_id: i64, user: &User) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO group_members (group_id, user_id, phone_number, user_name, user_type, profile_avatar, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (group_id, user_id) DO NOTHING
        "#,
    )
    .bind(group_id)
    .bind(user.id)
    .bind(&user.phone_number)
    .bind(&user.user_name)
    .bind(&user.user_type)
    .bind(&user.profile_avatar)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn list_groups(pool: &PgPool) -> Result<Vec<ChatGroup>, sqlx::Error> {
    sqlx::query_as::<_, ChatGroup>(
        r#"
        SELECT id, court_id, court_name, group_name, latitude, longitude, admin_id, created_at
        FROM chat_groups
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Groups a user belongs to, each with its most recent message.
pub async fn groups_for_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<GroupWithLatest>, sqlx::Error> {
    sqlx::query_as::<_, GroupWithLatest>(
        r#"
        SELECT g.id, g.court_id, g.court_name, g.group_name, g.latitude, g.longitude,
               g.admin_id, g.created_at,
               latest.body AS last_message,
               latest.created_at AS last_message_at
        FROM chat_groups g
        JOIN group_members m ON m.group_id = g.id AND m.user_id = $1
        LEFT JOIN LATERAL (
            SELECT body, created_at
            FROM messages
            WHERE group_id = g.id
            ORDER BY created_at DESC, id DESC
            LIMIT 1
        ) latest ON TRUE
        ORDER BY latest.created_at DESC NULLS LAST, g.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}
