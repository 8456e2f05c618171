//! Tournament handlers.

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::auth::users;
use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::AuthUser;
use crate::server::state::AppState;

use super::db;

const VALID_TYPES: [&str; 2] = ["leagues", "round robin"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTournamentRequest {
    pub name: String,
    pub tournament_type: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub court_name: String,
    pub max_players: i32,
    pub min_rating: Option<String>,
    pub max_rating: Option<String>,
}

/// `POST /api/tournaments` - create a tournament; the creator is
/// auto-joined as its first member.
pub async fn create_tournament(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Json(request): Json<CreateTournamentRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    if request.name.trim().is_empty() || request.court_name.trim().is_empty() {
        return Err(ApiError::bad_request("All fields are required"));
    }
    if !VALID_TYPES.contains(&request.tournament_type.as_str()) {
        return Err(ApiError::bad_request("Tournament type mismatch!"));
    }
    if request.end_date < request.start_date {
        return Err(ApiError::bad_request("End date must not precede start date"));
    }
    if request.max_players < 1 {
        return Err(ApiError::bad_request("Max players must be at least 1"));
    }

    let user = users::find_user_by_id(&state.db, caller.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let tournament = db::create_tournament(
        &state.db,
        db::NewTournament {
            name: request.name,
            tournament_type: request.tournament_type,
            start_date: request.start_date,
            end_date: request.end_date,
            court_name: request.court_name,
            created_by: user.id,
            max_players: request.max_players,
            min_rating: request.min_rating,
            max_rating: request.max_rating,
        },
    )
    .await?;

    db::add_member(&state.db, tournament.id, user.id).await?;
    let total_members = db::member_count(&state.db, tournament.id).await?;

    tracing::info!(tournament_id = tournament.id, creator = %user.id, "tournament created");

    Ok(Json(json!({
        "success": true,
        "message": "Tournament created successfully!",
        "tournament": tournament,
        "totalMembers": total_members,
    })))
}

/// `GET /api/tournaments` - upcoming tournaments with member counts.
pub async fn upcoming_tournaments(
    State(state): State<AppState>,
) -> ApiResult<Json<serde_json::Value>> {
    let tournaments = db::upcoming_tournaments(&state.db).await?;
    if tournaments.is_empty() {
        return Err(ApiError::not_found("No tournaments found!"));
    }

    Ok(Json(json!({
        "success": true,
        "message": "All tournaments",
        "totalTournaments": tournaments.len(),
        "tournaments": tournaments,
    })))
}

/// `GET /api/tournaments/mine` - upcoming tournaments the caller created.
pub async fn my_tournaments(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> ApiResult<Json<serde_json::Value>> {
    let tournaments = db::tournaments_created_by(&state.db, caller.user_id).await?;
    if tournaments.is_empty() {
        return Err(ApiError::not_found("No tournaments found!"));
    }

    Ok(Json(json!({
        "success": true,
        "message": "Single user tournaments",
        "totalTournaments": tournaments.len(),
        "tournaments": tournaments,
    })))
}

/// `POST /api/tournaments/{id}/join` - join; Conflict when already a
/// member or when the tournament is full.
pub async fn join_tournament(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(tournament_id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    let tournament = db::find_tournament(&state.db, tournament_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Tournament not found"))?;

    if db::is_joined(&state.db, tournament.id, caller.user_id).await? {
        return Err(ApiError::conflict("You have already joined this tournament"));
    }

    let members = db::member_count(&state.db, tournament.id).await?;
    if members >= i64::from(tournament.max_players) {
        return Err(ApiError::conflict("Tournament is already full"));
    }

    db::add_member(&state.db, tournament.id, caller.user_id).await?;
    tracing::info!(tournament_id = tournament.id, user_id = %caller.user_id, "tournament joined");

    Ok(Json(json!({
        "success": true,
        "message": "Tournament joined successfully!",
        "tournament": tournament,
    })))
}

/// `GET /api/tournaments/{id}/members`
pub async fn tournament_members(
    State(state): State<AppState>,
    Path(tournament_id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    if db::find_tournament(&state.db, tournament_id).await?.is_none() {
        return Err(ApiError::not_found("Tournament not found"));
    }

    let members = db::members_of(&state.db, tournament_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Joined tournaments",
        "totalMembers": members.len(),
        "members": members,
    })))
}
