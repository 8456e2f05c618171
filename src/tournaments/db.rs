//! Tournament persistence.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub id: i64,
    pub name: String,
    pub tournament_type: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub court_name: String,
    pub created_by: Uuid,
    pub max_players: i32,
    pub min_rating: Option<String>,
    pub max_rating: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Tournament plus its current member count.
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TournamentWithMembers {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub tournament: Tournament,
    pub total_members: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TournamentMember {
    pub id: i64,
    pub tournament_id: i64,
    pub user_id: Uuid,
    pub user_name: String,
    pub phone_number: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewTournament {
    pub name: String,
    pub tournament_type: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub court_name: String,
    pub created_by: Uuid,
    pub max_players: i32,
    pub min_rating: Option<String>,
    pub max_rating: Option<String>,
}

const TOURNAMENT_COLUMNS: &str = "id, name, tournament_type, start_date, end_date, \
     court_name, created_by, max_players, min_rating, max_rating, created_at";

pub async fn create_tournament(
    pool: &PgPool,
    new_tournament: NewTournament,
) -> Result<Tournament, sqlx::Error> {
    sqlx::query_as::<_, Tournament>(&format!(
        r#"
        INSERT INTO tournaments (name, tournament_type, start_date, end_date, court_name,
                                 created_by, max_players, min_rating, max_rating, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING {TOURNAMENT_COLUMNS}
        "#
    ))
    .bind(&new_tournament.name)
    .bind(&new_tournament.tournament_type)
    .bind(new_tournament.start_date)
    .bind(new_tournament.end_date)
    .bind(&new_tournament.court_name)
    .bind(new_tournament.created_by)
    .bind(new_tournament.max_players)
    .bind(&new_tournament.min_rating)
    .bind(&new_tournament.max_rating)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

pub async fn find_tournament(pool: &PgPool, id: i64) -> Result<Option<Tournament>, sqlx::Error> {
    sqlx::query_as::<_, Tournament>(&format!(
        r#"SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE id = $1"#
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Upcoming tournaments (end date today or later), with member counts.
pub async fn upcoming_tournaments(
    pool: &PgPool,
) -> Result<Vec<TournamentWithMembers>, sqlx::Error> {
    sqlx::query_as::<_, TournamentWithMembers>(
        r#"
        SELECT t.id, t.name, t.tournament_type, t.start_date, t.end_date, t.court_name,
               t.created_by, t.max_players, t.min_rating, t.max_rating, t.created_at,
               COUNT(m.id) AS total_members
        FROM tournaments t
        LEFT JOIN tournament_members m ON m.tournament_id = t.id
        WHERE t.end_date >= date_trunc('day', now())
        GROUP BY t.id
        ORDER BY t.start_date ASC
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Upcoming tournaments created by one user, with member counts.
pub async fn tournaments_created_by(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<TournamentWithMembers>, sqlx::Error> {
    sqlx::query_as::<_, TournamentWithMembers>(
        r#"
        SELECT t.id, t.name, t.tournament_type, t.start_date, t.end_date, t.court_name,
               t.created_by, t.max_players, t.min_rating, t.max_rating, t.created_at,
               COUNT(m.id) AS total_members
        FROM tournaments t
        LEFT JOIN tournament_members m ON m.tournament_id = t.id
        WHERE t.created_by = $1 AND t.end_date >= date_trunc('day', now())
        GROUP BY t.id
        ORDER BY t.start_date ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn member_count(pool: &PgPool, tournament_id: i64) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) =
        sqlx::query_as(r#"SELECT COUNT(*) FROM tournament_members WHERE tournament_id = $1"#)
            .bind(tournament_id)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

pub async fn is_joined(
    pool: &PgPool,
    tournament_id: i64,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let found: Option<(i64,)> = sqlx::query_as(
        r#"SELECT id FROM tournament_members WHERE tournament_id = $1 AND user_id = $2"#,
    )
    .bind(tournament_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(found.is_some())
}

/// Add a member; the unique index on (tournament_id, user_id) makes a
/// duplicate join a database error rather than a second row.
pub async fn add_member(
    pool: &PgPool,
    tournament_id: i64,
    user_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO tournament_members (tournament_id, user_id, created_at)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(tournament_id)
    .bind(user_id)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn members_of(
    pool: &PgPool,
    tournament_id: i64,
) -> Result<Vec<TournamentMember>, sqlx::Error> {
    sqlx::query_as::<_, TournamentMember>(
        r#"
        SELECT m.id, m.tournament_id, m.user_id, u.user_name, u.phone_number, m.created_at
        FROM tournament_members m
        JOIN users u ON u.id = m.user_id
        WHERE m.tournament_id = $1
        ORDER BY m.created_at ASC
        "#,
    )
    .bind(tournament_id)
    .fetch_all(pool)
    .await
}
