//! Court discovery handlers and lazy group creation.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::json;

use crate::auth::users;
use crate::error::{ApiError, ApiResult};
use crate::groups::db as groups_db;
use crate::middleware::auth::AuthUser;
use crate::server::state::AppState;

use super::places::DEFAULT_RADIUS_METERS;

/// `GET /api/courts/search/{lat}/{lng}` - nearby pickleball courts.
pub async fn search_courts(
    State(state): State<AppState>,
    Path((latitude, longitude)): Path<(String, String)>,
) -> ApiResult<Json<serde_json::Value>> {
    let latitude: f64 = latitude
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid latitude"))?;
    let longitude: f64 = longitude
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid longitude"))?;

    let courts = state
        .places
        .nearby_courts(latitude, longitude, DEFAULT_RADIUS_METERS)
        .await?;

    if courts.is_empty() {
        return Err(ApiError::not_found(
            "No courts found for the given location",
        ));
    }

    let court_data: Vec<_> = courts
        .iter()
        .map(|court| json!({"id": court.place_id, "name": court.name}))
        .collect();

    Ok(Json(json!({
        "success": true,
        "message": "Courts fetched successfully",
        "totalCourts": courts.len(),
        "courts": court_data,
    })))
}

/// `GET /api/courts/{place_id}` - court details.
pub async fn court_details(
    State(state): State<AppState>,
    Path(place_id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    if place_id.is_empty() {
        return Err(ApiError::bad_request("Court ID is required"));
    }

    let court = state
        .places
        .place_details(&place_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Court not found"))?;

    Ok(Json(json!({
        "success": true,
        "message": "Court details fetched successfully",
        "court": court,
    })))
}

/// `POST /api/courts/{place_id}/group` - lazy group creation.
///
/// First association with a court creates its chat group (owned by an
/// admin user, carrying the court's geometry) and adds the caller as a
/// member. Later calls just add the caller; calling it again as an
/// existing member is a no-op.
pub async fn join_court_group(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(place_id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let court = state
        .places
        .place_details(&place_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Court not found for the provided ID"))?;

    let user = users::find_user_by_id(&state.db, caller.user_id)
        .await?
        .ok_or_else(|| ApiError::bad_request("User not found"))?;

    if let Some(group) = groups_db::find_group_by_court(&state.db, &court.place_id).await? {
        if groups_db::is_member(&state.db, group.id, user.id).await? {
            return Ok(Json(json!({
                "success": true,
                "message": "User is already part of the group",
                "group": group,
            })));
        }

        groups_db::add_member(&state.db, group.id, &user).await?;
        tracing::info!(group_id = group.id, user_id = %user.id, "user joined court group");

        return Ok(Json(json!({
            "success": true,
            "message": "User successfully joined the group",
            "group": group,
        })));
    }

    // No group yet: create it under an admin owner.
    let admin = admin_owner(&state).await?;

    let location = court.geometry.as_ref().map(|g| &g.location);
    let group = groups_db::create_group(
        &state.db,
        groups_db::NewGroup {
            court_id: court.place_id.clone(),
            court_name: court.name.clone(),
            group_name: court.name.clone(),
            latitude: location.map(|l| l.lat.to_string()),
            longitude: location.map(|l| l.lng.to_string()),
            admin_id: admin.id,
        },
    )
    .await?;

    groups_db::add_member(&state.db, group.id, &user).await?;
    tracing::info!(group_id = group.id, court_id = %court.place_id, "court group created");

    Ok(Json(json!({
        "success": true,
        "message": "Group created and user successfully added",
        "group": group,
    })))
}

async fn admin_owner(state: &AppState) -> Result<users::User, ApiError> {
    let admin: Option<users::User> = sqlx::query_as(
        r#"
        SELECT id, user_name, email, phone_number, user_type, court_name,
               latitude, longitude, password_hash, profile_avatar, banned, is_admin,
               otp_code, otp_expires_at, created_at, updated_at
        FROM users
        WHERE is_admin = TRUE
        ORDER BY created_at ASC
        LIMIT 1
        "#,
    )
    .fetch_optional(&state.db)
    .await?;

    admin.ok_or_else(|| ApiError::bad_request("No admin user found"))
}
