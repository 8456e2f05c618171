//! Group listing handlers.

use axum::extract::State;
use axum::Json;
use serde_json::json;

use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::AuthUser;
use crate::server::state::AppState;

use super::db;

/// `GET /api/groups` - every group (admin only).
pub async fn list_groups(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> ApiResult<Json<serde_json::Value>> {
    if !caller.is_admin {
        return Err(ApiError::forbidden("Admin access required"));
    }

    let groups = db::list_groups(&state.db).await?;
    if groups.is_empty() {
        return Err(ApiError::not_found("No Groups Found!"));
    }

    Ok(Json(json!({
        "success": true,
        "message": "All Groups List",
        "totalGroups": groups.len(),
        "groups": groups,
    })))
}

/// `GET /api/groups/mine` - groups the caller belongs to, each carrying
/// its most recent message by creation time.
pub async fn my_groups(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> ApiResult<Json<serde_json::Value>> {
    let groups = db::groups_for_user(&state.db, caller.user_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Groups fetched successfully",
        "totalGroups": groups.len(),
        "groups": groups,
    })))
}
