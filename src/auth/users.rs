//! User rows and database operations.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// A user row. The phone number is the correlation key everything else
/// (rooms, messages, products) hangs off; it is unique alongside
/// user_name and email.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub user_name: String,
    pub email: String,
    pub phone_number: String,
    pub user_type: Option<String>,
    pub court_name: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub profile_avatar: Option<String>,
    pub banned: bool,
    pub is_admin: bool,
    #[serde(skip_serializing)]
    pub otp_code: Option<String>,
    #[serde(skip_serializing)]
    pub otp_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const USER_COLUMNS: &str = "id, user_name, email, phone_number, user_type, court_name, \
     latitude, longitude, password_hash, profile_avatar, banned, is_admin, \
     otp_code, otp_expires_at, created_at, updated_at";

/// Fields accepted at registration.
#[derive(Debug)]
pub struct NewUser {
    pub user_name: String,
    pub email: String,
    pub phone_number: String,
    pub password_hash: String,
    pub user_type: Option<String>,
    pub court_name: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

/// Partial profile update; `None` leaves the column untouched.
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub user_name: Option<String>,
    pub email: Option<String>,
    pub user_type: Option<String>,
    pub court_name: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub profile_avatar: Option<String>,
}

pub async fn create_user(pool: &PgPool, new_user: NewUser) -> Result<User, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (id, user_name, email, phone_number, user_type, court_name,
                           latitude, longitude, password_hash, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&new_user.user_name)
    .bind(&new_user.email)
    .bind(&new_user.phone_number)
    .bind(&new_user.user_type)
    .bind(&new_user.court_name)
    .bind(&new_user.latitude)
    .bind(&new_user.longitude)
    .bind(&new_user.password_hash)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn find_user_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"SELECT {USER_COLUMNS} FROM users WHERE id = $1"#
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn find_user_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"SELECT {USER_COLUMNS} FROM users WHERE email = $1"#
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub async fn find_user_by_phone(
    pool: &PgPool,
    phone_number: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"SELECT {USER_COLUMNS} FROM users WHERE phone_number = $1"#
    ))
    .bind(phone_number)
    .fetch_optional(pool)
    .await
}

pub async fn find_user_by_user_name(
    pool: &PgPool,
    user_name: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"SELECT {USER_COLUMNS} FROM users WHERE user_name = $1"#
    ))
    .bind(user_name)
    .fetch_optional(pool)
    .await
}

/// Apply a partial profile update, returning the fresh row.
pub async fn update_profile(
    pool: &PgPool,
    id: Uuid,
    update: ProfileUpdate,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users SET
            user_name = COALESCE($1, user_name),
            email = COALESCE($2, email),
            user_type = COALESCE($3, user_type),
            court_name = COALESCE($4, court_name),
            latitude = COALESCE($5, latitude),
            longitude = COALESCE($6, longitude),
            profile_avatar = COALESCE($7, profile_avatar),
            updated_at = $8
        WHERE id = $9
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(&update.user_name)
    .bind(&update.email)
    .bind(&update.user_type)
    .bind(&update.court_name)
    .bind(&update.latitude)
    .bind(&update.longitude)
    .bind(&update.profile_avatar)
    .bind(Utc::now())
    .bind(id)
    .fetch_one(pool)
    .await
}

pub async fn update_password(
    pool: &PgPool,
    id: Uuid,
    password_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"UPDATE users SET password_hash = $1, updated_at = $2 WHERE id = $3"#,
    )
    .bind(password_hash)
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Store a password-reset OTP with a 10-minute expiry.
pub async fn store_otp(pool: &PgPool, id: Uuid, otp_code: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"UPDATE users SET otp_code = $1, otp_expires_at = $2, updated_at = $3 WHERE id = $4"#,
    )
    .bind(otp_code)
    .bind(Utc::now() + Duration::minutes(10))
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn clear_otp(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"UPDATE users SET otp_code = NULL, otp_expires_at = NULL, updated_at = $1 WHERE id = $2"#,
    )
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn set_banned(pool: &PgPool, id: Uuid, banned: bool) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users SET banned = $1, updated_at = $2
        WHERE id = $3
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(banned)
    .bind(Utc::now())
    .bind(id)
    .fetch_one(pool)
    .await
}

pub async fn list_users(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"#
    ))
    .fetch_all(pool)
    .await
}

pub async fn list_coaches(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"SELECT {USER_COLUMNS} FROM users WHERE user_type = 'Coach' ORDER BY created_at DESC"#
    ))
    .fetch_all(pool)
    .await
}

pub async fn delete_user(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(r#"DELETE FROM users WHERE id = $1"#)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Is the stored OTP still valid for this user?
pub fn otp_is_valid(user: &User, otp_code: &str) -> bool {
    match (&user.otp_code, user.otp_expires_at) {
        (Some(stored), Some(expires_at)) => stored == otp_code && expires_at > Utc::now(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user(otp: Option<&str>, expires_at: Option<DateTime<Utc>>) -> User {
        User {
            id: Uuid::new_v4(),
            user_name: "player_one".to_string(),
            email: "player@example.com".to_string(),
            phone_number: "+15551234567".to_string(),
            user_type: Some("individual".to_string()),
            court_name: None,
            latitude: None,
            longitude: None,
            password_hash: "$2b$12$hash".to_string(),
            profile_avatar: None,
            banned: false,
            is_admin: false,
            otp_code: otp.map(str::to_string),
            otp_expires_at: expires_at,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn otp_valid_before_expiry() {
        let user = sample_user(Some("123456"), Some(Utc::now() + Duration::minutes(5)));
        assert!(otp_is_valid(&user, "123456"));
        assert!(!otp_is_valid(&user, "654321"));
    }

    #[test]
    fn otp_invalid_after_expiry() {
        let user = sample_user(Some("123456"), Some(Utc::now() - Duration::minutes(1)));
        assert!(!otp_is_valid(&user, "123456"));
    }

    #[test]
    fn otp_invalid_when_absent() {
        let user = sample_user(None, None);
        assert!(!otp_is_valid(&user, "123456"));
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let user = sample_user(None, None);
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("otp_code").is_none());
        assert_eq!(json["phone_number"], "+15551234567");
    }
}
