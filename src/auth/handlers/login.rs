//! Login handler for `POST /api/auth/login`.
//!
//! Invalid email and invalid password return the same 401 so callers
//! cannot enumerate accounts. Banned users are refused with 403 before
//! password verification would even matter.

use axum::extract::State;
use axum::Json;
use bcrypt::verify;

use crate::auth::sessions::create_token;
use crate::auth::users::find_user_by_email;
use crate::error::{ApiError, ApiResult};
use crate::server::state::AppState;

use super::types::{AuthResponse, LoginRequest};

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    tracing::info!(email = %request.email, "login request");

    let user = find_user_by_email(&state.db, &request.email)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    if user.banned {
        tracing::warn!(user_id = %user.id, "banned user attempted login");
        return Err(ApiError::forbidden("Your account has been banned"));
    }

    let valid = verify(&request.password, &user.password_hash)
        .map_err(|e| ApiError::Internal(Box::new(e)))?;
    if !valid {
        tracing::warn!(user_id = %user.id, "invalid password");
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    let token = create_token(user.id, user.phone_number.clone(), user.is_admin)
        .map_err(|e| ApiError::Internal(Box::new(e)))?;

    tracing::info!(user_id = %user.id, "user logged in");

    Ok(Json(AuthResponse {
        success: true,
        message: "Logged in successfully".to_string(),
        token,
        user: user.into(),
    }))
}
