//! Persistence for group messages, polls and votes.
//!
//! Everything here is plain sqlx against Postgres. The two multi-row
//! mutations (poll creation, vote recording) run in transactions: a poll
//! is never visible without its options, and the vote path serializes
//! per (poll, voter) with an advisory transaction lock so two racing
//! votes cannot produce duplicate rows or a skewed tally.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::events::{MessageOut, MessageWithOptions, PollOptionOut, PollSnapshot};
use crate::error::ChatError;

#[derive(Debug, sqlx::FromRow)]
pub struct MessageRow {
    pub id: i64,
    pub group_id: i64,
    pub phone_number: String,
    pub profile_avatar: Option<String>,
    pub message: String,
    pub is_poll: bool,
    pub created_at: DateTime<Utc>,
}

impl From<MessageRow> for MessageOut {
    fn from(row: MessageRow) -> Self {
        MessageOut {
            id: row.id,
            group_id: row.group_id,
            phone_number: row.phone_number,
            profile_avatar: row.profile_avatar,
            message: row.message,
            is_poll: row.is_poll,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct PollOptionRow {
    pub id: i64,
    pub poll_id: i64,
    pub option_text: String,
    pub votes: i32,
}

impl From<PollOptionRow> for PollOptionOut {
    fn from(row: PollOptionRow) -> Self {
        PollOptionOut {
            option_id: row.id,
            id: row.id,
            poll_id: row.poll_id,
            option_text: row.option_text,
            votes: row.votes,
        }
    }
}

/// Group membership row, as needed by the engine (the member's avatar is
/// denormalized onto new messages).
#[derive(Debug, sqlx::FromRow)]
pub struct MemberRow {
    pub phone_number: String,
    pub profile_avatar: Option<String>,
}

/// Look up the caller's membership row. Presence of this row is the sole
/// authorization check for joining a room or posting.
pub async fn find_member(
    pool: &PgPool,
    group_id: i64,
    phone_number: &str,
) -> Result<Option<MemberRow>, sqlx::Error> {
    sqlx::query_as::<_, MemberRow>(
        r#"
        SELECT phone_number, profile_avatar
        FROM group_members
        WHERE group_id = $1 AND phone_number = $2
        "#,
    )
    .bind(group_id)
    .bind(phone_number)
    .fetch_optional(pool)
    .await
}

/// Ordered message history for a group, with each poll's options
/// stitched in by poll id.
pub async fn group_history(
    pool: &PgPool,
    group_id: i64,
) -> Result<Vec<MessageWithOptions>, sqlx::Error> {
    let rows = sqlx::query_as::<_, MessageRow>(
        r#"
        SELECT id, group_id, phone_number, profile_avatar, body AS message, is_poll, created_at
        FROM messages
        WHERE group_id = $1
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(group_id)
    .fetch_all(pool)
    .await?;

    let poll_ids: Vec<i64> = rows.iter().filter(|m| m.is_poll).map(|m| m.id).collect();

    let options: Vec<PollOptionRow> = if poll_ids.is_empty() {
        Vec::new()
    } else {
        sqlx::query_as::<_, PollOptionRow>(
            r#"
            SELECT id, poll_id, option_text, votes
            FROM poll_options
            WHERE poll_id = ANY($1)
            ORDER BY id ASC
            "#,
        )
        .bind(&poll_ids)
        .fetch_all(pool)
        .await?
    };

    Ok(rows
        .into_iter()
        .map(|row| {
            let attached: Vec<PollOptionOut> = options
                .iter()
                .filter(|option| option.poll_id == row.id)
                .map(|option| PollOptionOut {
                    id: option.id,
                    option_id: option.id,
                    poll_id: option.poll_id,
                    option_text: option.option_text.clone(),
                    votes: option.votes,
                })
                .collect();
            MessageWithOptions {
                message: row.into(),
                options: attached,
            }
        })
        .collect())
}

/// Persist a plain group message.
pub async fn insert_message(
    pool: &PgPool,
    group_id: i64,
    phone_number: &str,
    profile_avatar: Option<&str>,
    body: &str,
) -> Result<MessageOut, sqlx::Error> {
    let row = sqlx::query_as::<_, MessageRow>(
        r#"
        INSERT INTO messages (group_id, phone_number, profile_avatar, body, is_poll, created_at)
        VALUES ($1, $2, $3, $4, FALSE, $5)
        RETURNING id, group_id, phone_number, profile_avatar, body AS message, is_poll, created_at
        "#,
    )
    .bind(group_id)
    .bind(phone_number)
    .bind(profile_avatar)
    .bind(body)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(row.into())
}

/// Persist a poll: the message row plus one option row per text, all in
/// one transaction so a failed option insert leaves no orphaned poll.
pub async fn insert_poll(
    pool: &PgPool,
    group_id: i64,
    phone_number: &str,
    profile_avatar: Option<&str>,
    question: &str,
    options: &[String],
) -> Result<MessageOut, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, MessageRow>(
        r#"
        INSERT INTO messages (group_id, phone_number, profile_avatar, body, is_poll, created_at)
        VALUES ($1, $2, $3, $4, TRUE, $5)
        RETURNING id, group_id, phone_number, profile_avatar, body AS message, is_poll, created_at
        "#,
    )
    .bind(group_id)
    .bind(phone_number)
    .bind(profile_avatar)
    .bind(question)
    .bind(Utc::now())
    .fetch_one(&mut *tx)
    .await?;

    for option_text in options {
        sqlx::query(
            r#"
            INSERT INTO poll_options (poll_id, option_text, votes)
            VALUES ($1, $2, 0)
            "#,
        )
        .bind(row.id)
        .bind(option_text)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(row.into())
}

/// Does a message with this id exist, and is it flagged as a poll?
pub async fn poll_exists(pool: &PgPool, poll_id: i64) -> Result<bool, sqlx::Error> {
    let found: Option<(i64,)> = sqlx::query_as(
        r#"SELECT id FROM messages WHERE id = $1 AND is_poll = TRUE"#,
    )
    .bind(poll_id)
    .fetch_optional(pool)
    .await?;
    Ok(found.is_some())
}

/// Record or redirect a vote.
///
/// Runs in one transaction holding an advisory lock on (poll, voter).
/// `FOR UPDATE` alone cannot serialize two first votes (there is no row
/// to lock yet), so the lock is taken before the lookup. A re-vote
/// decrements the previous option and redirects the existing row; the
/// target option's counter is always incremented last. Re-voting the
/// same option is a deliberate net-zero decrement-then-increment, never
/// a duplicate row.
pub async fn record_vote(
    pool: &PgPool,
    poll_id: i64,
    phone_number: &str,
    option_id: i64,
) -> Result<(), ChatError> {
    let mut tx = pool.begin().await.map_err(ChatError::from)?;

    // Released automatically at commit or rollback.
    sqlx::query(r#"SELECT pg_advisory_xact_lock(hashtextextended($1, 0))"#)
        .bind(format!("poll_vote:{poll_id}:{phone_number}"))
        .execute(&mut *tx)
        .await
        .map_err(ChatError::from)?;

    let (option_count,): (i64,) =
        sqlx::query_as(r#"SELECT COUNT(*) FROM poll_options WHERE poll_id = $1"#)
            .bind(poll_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(ChatError::from)?;
    if option_count == 0 {
        return Err(ChatError::NoOptions);
    }

    // The option must belong to this poll; a cross-poll option id would
    // silently corrupt another poll's tally.
    let belongs: Option<(i64,)> = sqlx::query_as(
        r#"SELECT id FROM poll_options WHERE id = $1 AND poll_id = $2"#,
    )
    .bind(option_id)
    .bind(poll_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(ChatError::from)?;
    if belongs.is_none() {
        return Err(ChatError::Validation(
            "Option does not belong to this poll".to_string(),
        ));
    }

    let previous: Option<(i64,)> = sqlx::query_as(
        r#"
        SELECT option_id FROM poll_votes
        WHERE poll_id = $1 AND phone_number = $2
        "#,
    )
    .bind(poll_id)
    .bind(phone_number)
    .fetch_optional(&mut *tx)
    .await
    .map_err(ChatError::from)?;

    match previous {
        Some((previous_option,)) => {
            sqlx::query(r#"UPDATE poll_options SET votes = votes - 1 WHERE id = $1"#)
                .bind(previous_option)
                .execute(&mut *tx)
                .await
                .map_err(ChatError::from)?;

            sqlx::query(
                r#"
                UPDATE poll_votes SET option_id = $1
                WHERE poll_id = $2 AND phone_number = $3
                "#,
            )
            .bind(option_id)
            .bind(poll_id)
            .bind(phone_number)
            .execute(&mut *tx)
            .await
            .map_err(ChatError::from)?;
        }
        None => {
            // The advisory lock serialized us; a unique violation here
            // would be a bug, so surface it instead of absorbing it
            // with an upsert that skips the counter decrement.
            sqlx::query(
                r#"
                INSERT INTO poll_votes (poll_id, phone_number, option_id)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(poll_id)
            .bind(phone_number)
            .bind(option_id)
            .execute(&mut *tx)
            .await
            .map_err(ChatError::from)?;
        }
    }

    // Increment the target last.
    sqlx::query(r#"UPDATE poll_options SET votes = votes + 1 WHERE id = $1"#)
        .bind(option_id)
        .execute(&mut *tx)
        .await
        .map_err(ChatError::from)?;

    tx.commit().await.map_err(ChatError::from)
}

/// Reload the full poll (question plus all options with current counts)
/// for the consolidated `pollResults` broadcast.
pub async fn poll_snapshot(
    pool: &PgPool,
    poll_id: i64,
) -> Result<Option<PollSnapshot>, sqlx::Error> {
    let question: Option<(i64, String)> = sqlx::query_as(
        r#"SELECT id, body FROM messages WHERE id = $1"#,
    )
    .bind(poll_id)
    .fetch_optional(pool)
    .await?;

    let Some((id, question)) = question else {
        return Ok(None);
    };

    let options = sqlx::query_as::<_, PollOptionRow>(
        r#"
        SELECT id, poll_id, option_text, votes
        FROM poll_options
        WHERE poll_id = $1
        ORDER BY id ASC
        "#,
    )
    .bind(poll_id)
    .fetch_all(pool)
    .await?;

    Ok(Some(PollSnapshot {
        id,
        question,
        options: options.into_iter().map(PollOptionOut::from).collect(),
    }))
}

/// Cascade-delete a poll: votes, then options, then the parent message,
/// in that dependency order, atomically.
pub async fn delete_poll(pool: &PgPool, poll_id: i64) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(r#"DELETE FROM poll_votes WHERE poll_id = $1"#)
        .bind(poll_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query(r#"DELETE FROM poll_options WHERE poll_id = $1"#)
        .bind(poll_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query(r#"DELETE FROM messages WHERE id = $1"#)
        .bind(poll_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await
}

/// Find a message scoped to a group (for author-only deletion).
pub async fn find_group_message(
    pool: &PgPool,
    message_id: i64,
    group_id: i64,
) -> Result<Option<MessageRow>, sqlx::Error> {
    sqlx::query_as::<_, MessageRow>(
        r#"
        SELECT id, group_id, phone_number, profile_avatar, body AS message, is_poll, created_at
        FROM messages
        WHERE id = $1 AND group_id = $2
        "#,
    )
    .bind(message_id)
    .bind(group_id)
    .fetch_optional(pool)
    .await
}

pub async fn delete_message(pool: &PgPool, message_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query(r#"DELETE FROM messages WHERE id = $1"#)
        .bind(message_id)
        .execute(pool)
        .await?;
    Ok(())
}
