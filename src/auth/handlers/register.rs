//! Registration handler for `POST /api/auth/register`.

use axum::extract::State;
use axum::Json;
use bcrypt::{hash, DEFAULT_COST};

use crate::auth::sessions::create_token;
use crate::auth::users::{
    create_user, find_user_by_email, find_user_by_phone, find_user_by_user_name, NewUser,
};
use crate::error::{ApiError, ApiResult};
use crate::server::state::AppState;

use super::types::{AuthResponse, RegisterRequest};

/// 3-30 chars, starts with a letter, letters/digits/underscores only.
fn is_valid_user_name(user_name: &str) -> bool {
    if user_name.len() < 3 || user_name.len() > 30 {
        return false;
    }

    let mut chars = user_name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Optional leading '+', then 7-15 digits.
fn is_valid_phone(phone: &str) -> bool {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    (7..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<Json<AuthResponse>> {
    tracing::info!(user_name = %request.user_name, "registration request");

    if !is_valid_user_name(&request.user_name) {
        return Err(ApiError::bad_request(
            "User name must be 3-30 chars, start with a letter, and contain only letters, numbers, and underscores",
        ));
    }
    if !request.email.contains('@') {
        return Err(ApiError::bad_request("Invalid email format"));
    }
    if !is_valid_phone(&request.phone_number) {
        return Err(ApiError::bad_request("Invalid phone number"));
    }
    if request.password.len() < 8 {
        return Err(ApiError::bad_request(
            "Password must be at least 8 characters",
        ));
    }
    if let Some(user_type) = &request.user_type {
        if user_type != "Coach" && user_type != "individual" {
            return Err(ApiError::bad_request("Invalid user type"));
        }
    }

    if find_user_by_user_name(&state.db, &request.user_name).await?.is_some() {
        return Err(ApiError::conflict("User name already taken"));
    }
    if find_user_by_email(&state.db, &request.email).await?.is_some() {
        return Err(ApiError::conflict("Email already registered"));
    }
    if find_user_by_phone(&state.db, &request.phone_number).await?.is_some() {
        return Err(ApiError::conflict("Phone number already registered"));
    }

    let password_hash =
        hash(&request.password, DEFAULT_COST).map_err(|e| ApiError::Internal(Box::new(e)))?;

    let user = create_user(
        &state.db,
        NewUser {
            user_name: request.user_name,
            email: request.email,
            phone_number: request.phone_number,
            password_hash,
            user_type: request.user_type,
            court_name: request.court_name,
            latitude: request.latitude,
            longitude: request.longitude,
        },
    )
    .await?;

    let token = create_token(user.id, user.phone_number.clone(), user.is_admin)
        .map_err(|e| ApiError::Internal(Box::new(e)))?;

    tracing::info!(user_id = %user.id, "user registered");

    Ok(Json(AuthResponse {
        success: true,
        message: "User registered successfully".to_string(),
        token,
        user: user.into(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_name_validation() {
        assert!(is_valid_user_name("player_one"));
        assert!(is_valid_user_name("Abc"));
        assert!(!is_valid_user_name("ab"));
        assert!(!is_valid_user_name("1player"));
        assert!(!is_valid_user_name("has space"));
        assert!(!is_valid_user_name(&"x".repeat(31)));
    }

    #[test]
    fn phone_validation() {
        assert!(is_valid_phone("+15551234567"));
        assert!(is_valid_phone("5551234"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("+1555123456789012"));
        assert!(!is_valid_phone("555-123-4567"));
    }
}
