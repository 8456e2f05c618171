//! Request/response types shared by the account handlers.

use serde::{Deserialize, Serialize};

use crate::auth::users::User;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub user_name: String,
    pub email: String,
    pub phone_number: String,
    pub password: String,
    /// 'Coach' | 'individual'; admins are created out of band.
    pub user_type: Option<String>,
    pub court_name: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub user: UserResponse,
}

/// User payload safe to return to clients (no hash, no OTP).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub user_name: String,
    pub email: String,
    pub phone_number: String,
    pub user_type: Option<String>,
    pub court_name: Option<String>,
    pub profile_avatar: Option<String>,
    pub is_admin: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id.to_string(),
            user_name: user.user_name,
            email: user.email,
            phone_number: user.phone_number,
            user_type: user.user_type,
            court_name: user.court_name,
            profile_avatar: user.profile_avatar,
            is_admin: user.is_admin,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub user_name: Option<String>,
    pub email: Option<String>,
    pub user_type: Option<String>,
    pub court_name: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub profile_avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    pub otp: String,
    pub new_password: String,
}
