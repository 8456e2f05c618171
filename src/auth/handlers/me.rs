//! Current-user handlers: `GET /api/auth/me`, `PUT /api/auth/profile`.

use axum::extract::State;
use axum::Json;
use serde_json::json;

use crate::auth::users::{self, ProfileUpdate};
use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::AuthUser;
use crate::server::state::AppState;

use super::types::{UpdateProfileRequest, UserResponse};

pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> ApiResult<Json<serde_json::Value>> {
    let user = users::find_user_by_id(&state.db, caller.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(json!({
        "success": true,
        "user": UserResponse::from(user),
    })))
}

pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Json(request): Json<UpdateProfileRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    if let Some(email) = &request.email {
        if !email.contains('@') {
            return Err(ApiError::bad_request("Invalid email format"));
        }
        if let Some(existing) = users::find_user_by_email(&state.db, email).await? {
            if existing.id != caller.user_id {
                return Err(ApiError::conflict("Email already registered"));
            }
        }
    }
    if let Some(user_name) = &request.user_name {
        if let Some(existing) = users::find_user_by_user_name(&state.db, user_name).await? {
            if existing.id != caller.user_id {
                return Err(ApiError::conflict("User name already taken"));
            }
        }
    }

    let user = users::update_profile(
        &state.db,
        caller.user_id,
        ProfileUpdate {
            user_name: request.user_name,
            email: request.email,
            user_type: request.user_type,
            court_name: request.court_name,
            latitude: request.latitude,
            longitude: request.longitude,
            profile_avatar: request.profile_avatar,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "profile updated");

    Ok(Json(json!({
        "success": true,
        "message": "Profile updated successfully",
        "user": UserResponse::from(user),
    })))
}
