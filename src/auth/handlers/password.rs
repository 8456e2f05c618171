//! Password-reset flow: forgot-password issues a 6-digit OTP (stored
//! with a 10-minute expiry and mailed), verify-otp checks it, and
//! reset-password consumes it.

use axum::extract::State;
use axum::Json;
use bcrypt::{hash, DEFAULT_COST};
use rand::Rng;
use serde_json::json;

use crate::auth::users::{self, otp_is_valid};
use crate::error::{ApiError, ApiResult};
use crate::server::state::AppState;

use super::types::{ForgotPasswordRequest, ResetPasswordRequest, VerifyOtpRequest};

fn generate_otp() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

/// `POST /api/auth/forgot-password`
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let user = users::find_user_by_email(&state.db, &request.email)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let otp_code = generate_otp();
    users::store_otp(&state.db, user.id, &otp_code).await?;

    match &state.mailer {
        Some(mailer) => {
            mailer
                .send_otp(&user.email, &otp_code)
                .await
                .map_err(|e| ApiError::Internal(Box::new(e)))?;
            tracing::info!(user_id = %user.id, "password reset OTP mailed");
        }
        None => {
            // Mail is not configured in every environment.
            tracing::warn!(user_id = %user.id, otp = %otp_code, "mail disabled, OTP logged");
        }
    }

    Ok(Json(json!({
        "success": true,
        "message": "Email sent with OTP",
    })))
}

/// `POST /api/auth/verify-otp`
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(request): Json<VerifyOtpRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let user = users::find_user_by_email(&state.db, &request.email)
        .await?
        .ok_or_else(|| ApiError::bad_request("Invalid or expired OTP!"))?;

    if !otp_is_valid(&user, &request.otp) {
        return Err(ApiError::bad_request("Invalid or expired OTP!"));
    }

    Ok(Json(json!({
        "success": true,
        "message": "OTP verified successfully",
    })))
}

/// `POST /api/auth/reset-password` - consumes the OTP.
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    if request.new_password.len() < 8 {
        return Err(ApiError::bad_request(
            "Password must be at least 8 characters",
        ));
    }

    let user = users::find_user_by_email(&state.db, &request.email)
        .await?
        .ok_or_else(|| ApiError::bad_request("Invalid or expired OTP!"))?;

    if !otp_is_valid(&user, &request.otp) {
        return Err(ApiError::bad_request("Invalid or expired OTP!"));
    }

    let password_hash =
        hash(&request.new_password, DEFAULT_COST).map_err(|e| ApiError::Internal(Box::new(e)))?;
    users::update_password(&state.db, user.id, &password_hash).await?;
    users::clear_otp(&state.db, user.id).await?;

    tracing::info!(user_id = %user.id, "password reset");

    Ok(Json(json!({
        "success": true,
        "message": "Password reset successfully",
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_is_six_digits() {
        for _ in 0..100 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
