//! Database-backed tests for voting and group-join authorization.
//!
//! Each test runs against its own freshly migrated database via
//! `#[sqlx::test]`. The voting invariants under test: one live vote row
//! per (poll, voter), counters always summing to the number of distinct
//! voters, and a re-vote moving exactly one count.

use assert_matches::assert_matches;
use courtside::chat::registry::RoomRegistry;
use courtside::chat::{db, engine};
use courtside::chat::events::VotePoll;
use courtside::error::ChatError;
use sqlx::PgPool;
use uuid::Uuid;

async fn seed_user(pool: &PgPool, user_name: &str, phone: &str) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO users (id, user_name, email, phone_number, password_hash, created_at, updated_at)
        VALUES ($1, $2, $3, $4, 'hash', now(), now())
        "#,
    )
    .bind(id)
    .bind(user_name)
    .bind(format!("{user_name}@example.com"))
    .bind(phone)
    .execute(pool)
    .await
    .unwrap();
    id
}

async fn seed_group(pool: &PgPool, admin_id: Uuid) -> i64 {
    sqlx::query_scalar(
        r#"
        INSERT INTO chat_groups (court_id, court_name, group_name, admin_id, created_at)
        VALUES ('place-riverside', 'Riverside Courts', 'Riverside Courts Group', $1, now())
        RETURNING id
        "#,
    )
    .bind(admin_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn seed_membership(pool: &PgPool, group_id: i64, user_id: Uuid, phone: &str, name: &str) {
    sqlx::query(
        r#"
        INSERT INTO group_members (group_id, user_id, phone_number, user_name, created_at)
        VALUES ($1, $2, $3, $4, now())
        "#,
    )
    .bind(group_id)
    .bind(user_id)
    .bind(phone)
    .bind(name)
    .execute(pool)
    .await
    .unwrap();
}

async fn option_ids(pool: &PgPool, poll_id: i64) -> Vec<i64> {
    sqlx::query_scalar(r#"SELECT id FROM poll_options WHERE poll_id = $1 ORDER BY id"#)
        .bind(poll_id)
        .fetch_all(pool)
        .await
        .unwrap()
}

async fn counter_sum(pool: &PgPool, poll_id: i64) -> i64 {
    sqlx::query_scalar::<_, i64>(
        r#"SELECT COALESCE(SUM(votes), 0)::BIGINT FROM poll_options WHERE poll_id = $1"#,
    )
    .bind(poll_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn vote_row_count(pool: &PgPool, poll_id: i64) -> i64 {
    sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM poll_votes WHERE poll_id = $1"#)
        .bind(poll_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn option_votes(pool: &PgPool, option_id: i64) -> i32 {
    sqlx::query_scalar::<_, i32>(r#"SELECT votes FROM poll_options WHERE id = $1"#)
        .bind(option_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test]
async fn concurrent_first_votes_count_once(pool: PgPool) {
    let admin = seed_user(&pool, "admin", "+15550000001").await;
    let group_id = seed_group(&pool, admin).await;

    // One voter fires the same first vote twice at once, against
    // different options. Whatever the interleaving, exactly one vote
    // may survive.
    for round in 0..25 {
        let voter = format!("+1555100{round:04}");
        let poll = db::insert_poll(
            &pool,
            group_id,
            "+15550000001",
            None,
            "best time?",
            &["6pm".to_string(), "8pm".to_string()],
        )
        .await
        .unwrap();
        let options = option_ids(&pool, poll.id).await;

        let first = db::record_vote(&pool, poll.id, &voter, options[0]);
        let second = db::record_vote(&pool, poll.id, &voter, options[1]);
        let (first, second) = tokio::join!(first, second);
        first.unwrap();
        second.unwrap();

        assert_eq!(vote_row_count(&pool, poll.id).await, 1, "round {round}");
        assert_eq!(counter_sum(&pool, poll.id).await, 1, "round {round}");
    }
}

#[sqlx::test]
async fn revoting_the_same_option_is_net_zero(pool: PgPool) {
    let admin = seed_user(&pool, "admin", "+15550000001").await;
    let group_id = seed_group(&pool, admin).await;
    let poll = db::insert_poll(
        &pool,
        group_id,
        "+15550000001",
        None,
        "singles or doubles?",
        &["singles".to_string(), "doubles".to_string()],
    )
    .await
    .unwrap();
    let options = option_ids(&pool, poll.id).await;

    db::record_vote(&pool, poll.id, "+15550002222", options[0])
        .await
        .unwrap();
    db::record_vote(&pool, poll.id, "+15550002222", options[0])
        .await
        .unwrap();

    assert_eq!(option_votes(&pool, options[0]).await, 1);
    assert_eq!(option_votes(&pool, options[1]).await, 0);
    assert_eq!(vote_row_count(&pool, poll.id).await, 1);
}

#[sqlx::test]
async fn switching_a_vote_moves_one_count(pool: PgPool) {
    let admin = seed_user(&pool, "admin", "+15550000001").await;
    let group_id = seed_group(&pool, admin).await;
    seed_membership(&pool, group_id, admin, "+15550000001", "admin").await;
    let poll = db::insert_poll(
        &pool,
        group_id,
        "+15550000001",
        None,
        "court resurfacing?",
        &["yes".to_string(), "no".to_string()],
    )
    .await
    .unwrap();
    let options = option_ids(&pool, poll.id).await;

    // Through the engine, snapshot included: yes then a switch to no.
    let rooms = RoomRegistry::new();
    engine::vote_poll(
        &pool,
        &rooms,
        VotePoll {
            group_id,
            phone_number: "+15550000001".to_string(),
            poll_id: poll.id,
            option_id: options[0],
        },
    )
    .await
    .unwrap();
    engine::vote_poll(
        &pool,
        &rooms,
        VotePoll {
            group_id,
            phone_number: "+15550000001".to_string(),
            poll_id: poll.id,
            option_id: options[1],
        },
    )
    .await
    .unwrap();

    assert_eq!(option_votes(&pool, options[0]).await, 0);
    assert_eq!(option_votes(&pool, options[1]).await, 1);
    assert_eq!(vote_row_count(&pool, poll.id).await, 1);
}

#[sqlx::test]
async fn voting_on_a_poll_without_options_is_rejected(pool: PgPool) {
    let admin = seed_user(&pool, "admin", "+15550000001").await;
    let group_id = seed_group(&pool, admin).await;

    let poll_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO messages (group_id, phone_number, body, is_poll, created_at)
        VALUES ($1, '+15550000001', 'orphaned poll', TRUE, now())
        RETURNING id
        "#,
    )
    .bind(group_id)
    .fetch_one(&pool)
    .await
    .unwrap();

    let err = db::record_vote(&pool, poll_id, "+15550002222", 1)
        .await
        .unwrap_err();
    assert_matches!(err, ChatError::NoOptions);
}

#[sqlx::test]
async fn cross_poll_option_is_rejected(pool: PgPool) {
    let admin = seed_user(&pool, "admin", "+15550000001").await;
    let group_id = seed_group(&pool, admin).await;
    let first = db::insert_poll(
        &pool,
        group_id,
        "+15550000001",
        None,
        "first?",
        &["a".to_string()],
    )
    .await
    .unwrap();
    let second = db::insert_poll(
        &pool,
        group_id,
        "+15550000001",
        None,
        "second?",
        &["b".to_string()],
    )
    .await
    .unwrap();
    let foreign_option = option_ids(&pool, second.id).await[0];

    let err = db::record_vote(&pool, first.id, "+15550002222", foreign_option)
        .await
        .unwrap_err();
    assert_matches!(err, ChatError::Validation(_));
    assert_eq!(counter_sum(&pool, second.id).await, 0);
}

#[sqlx::test]
async fn non_member_group_join_is_rejected(pool: PgPool) {
    let admin = seed_user(&pool, "admin", "+15550000001").await;
    let group_id = seed_group(&pool, admin).await;
    seed_membership(&pool, group_id, admin, "+15550000001", "admin").await;

    let err = engine::ensure_group_member(&pool, group_id, "+19990000000")
        .await
        .unwrap_err();
    assert_matches!(err, ChatError::NotAMember);

    // The member passes the same gate and can load history.
    engine::ensure_group_member(&pool, group_id, "+15550000001")
        .await
        .unwrap();
    let history = engine::group_history(&pool, group_id).await.unwrap();
    assert!(history.is_empty());
}
