//! Admin-only account management: listings, ban/unban, deletion, and
//! the admin notification feed.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::json;
use uuid::Uuid;

use crate::auth::users;
use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::{AuthUser, AuthenticatedUser};
use crate::notifications::db as notifications_db;
use crate::server::state::AppState;

use super::types::UserResponse;

fn require_admin(caller: &AuthenticatedUser) -> Result<(), ApiError> {
    if caller.is_admin {
        Ok(())
    } else {
        Err(ApiError::forbidden("Admin access required"))
    }
}

/// `GET /api/admin/users`
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> ApiResult<Json<serde_json::Value>> {
    require_admin(&caller)?;

    let all_users: Vec<UserResponse> = users::list_users(&state.db)
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(Json(json!({
        "success": true,
        "totalUsers": all_users.len(),
        "users": all_users,
    })))
}

/// `GET /api/admin/coaches`
pub async fn list_coaches(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> ApiResult<Json<serde_json::Value>> {
    require_admin(&caller)?;

    let coaches: Vec<UserResponse> = users::list_coaches(&state.db)
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(Json(json!({
        "success": true,
        "totalCoaches": coaches.len(),
        "coaches": coaches,
    })))
}

/// `POST /api/admin/users/{id}/ban` - ban and record a notification.
pub async fn ban_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    require_admin(&caller)?;

    if users::find_user_by_id(&state.db, user_id).await?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }

    let user = users::set_banned(&state.db, user_id, true).await?;
    notifications_db::insert_notification(
        &state.db,
        user.id,
        "Your account has been banned due to violating our terms of service.",
    )
    .await?;

    tracing::info!(user_id = %user.id, admin = %caller.user_id, "user banned");

    Ok(Json(json!({
        "success": true,
        "message": "User banned successfully",
        "user": UserResponse::from(user),
    })))
}

/// `POST /api/admin/users/{id}/unban`
pub async fn unban_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    require_admin(&caller)?;

    if users::find_user_by_id(&state.db, user_id).await?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }

    let user = users::set_banned(&state.db, user_id, false).await?;
    notifications_db::insert_notification(
        &state.db,
        user.id,
        "Your account has been reinstated.",
    )
    .await?;

    tracing::info!(user_id = %user.id, admin = %caller.user_id, "user unbanned");

    Ok(Json(json!({
        "success": true,
        "message": "User unbanned successfully",
        "user": UserResponse::from(user),
    })))
}

/// `DELETE /api/admin/users/{id}`
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    require_admin(&caller)?;

    if user_id == caller.user_id {
        return Err(ApiError::bad_request("You cannot delete your own account"));
    }

    let deleted = users::delete_user(&state.db, user_id).await?;
    if deleted == 0 {
        return Err(ApiError::not_found("User not found"));
    }

    tracing::info!(user_id = %user_id, admin = %caller.user_id, "user deleted");

    Ok(Json(json!({
        "success": true,
        "message": "User deleted successfully",
    })))
}

/// `GET /api/admin/notifications`
pub async fn list_notifications(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> ApiResult<Json<serde_json::Value>> {
    require_admin(&caller)?;

    let notifications = notifications_db::list_notifications(&state.db).await?;

    Ok(Json(json!({
        "success": true,
        "totalNotifications": notifications.len(),
        "notifications": notifications,
    })))
}

/// `PATCH /api/admin/notifications/{id}/read`
pub async fn mark_notification_read(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    require_admin(&caller)?;

    if !notifications_db::mark_notification_read(&state.db, id).await? {
        return Err(ApiError::not_found("Notification not found"));
    }

    Ok(Json(json!({
        "success": true,
        "message": "Notification marked as read",
    })))
}
