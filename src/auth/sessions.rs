//! JWT session tokens.
//!
//! Tokens carry the user id, the phone number (the correlation key the
//! real-time layer routes by) and the admin flag, and expire after 30
//! days.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

const TOKEN_LIFETIME_SECS: u64 = 30 * 24 * 60 * 60;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id (UUID) as a string.
    pub sub: String,
    pub phone_number: String,
    #[serde(default)]
    pub is_admin: bool,
    /// Expiration (Unix timestamp).
    pub exp: u64,
    /// Issued at (Unix timestamp).
    pub iat: u64,
}

fn jwt_secret() -> String {
    std::env::var("JWT_SECRET").unwrap_or_else(|err| {
        tracing::warn!(error = %err, "JWT_SECRET missing, using development default");
        "change-me-in-production".to_string()
    })
}

/// Create a signed token for a user.
pub fn create_token(
    user_id: Uuid,
    phone_number: String,
    is_admin: bool,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let claims = Claims {
        sub: user_id.to_string(),
        phone_number,
        is_admin,
        exp: now + TOKEN_LIFETIME_SECS,
        iat: now,
    };

    let key = EncodingKey::from_secret(jwt_secret().as_ref());
    encode(&Header::default(), &claims, &key)
}

/// Verify and decode a token.
pub fn verify_token(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let key = DecodingKey::from_secret(jwt_secret().as_ref());
    let token_data = decode::<Claims>(token, &key, &Validation::default())?;
    Ok(token_data.claims)
}

/// Extract the user id from a token.
pub fn user_id_from_token(token: &str) -> Result<Uuid, String> {
    let claims =
        verify_token(token).map_err(|e| format!("Token verification failed: {e}"))?;
    Uuid::parse_str(&claims.sub).map_err(|e| format!("Invalid user id in token: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_verify_round_trip() {
        let user_id = Uuid::new_v4();
        let token = create_token(user_id, "+15551234567".to_string(), false).unwrap();
        assert!(!token.is_empty());

        let claims = verify_token(&token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.phone_number, "+15551234567");
        assert!(!claims.is_admin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn admin_flag_survives_round_trip() {
        let token = create_token(Uuid::new_v4(), "+15550000000".to_string(), true).unwrap();
        assert!(verify_token(&token).unwrap().is_admin);
    }

    #[test]
    fn invalid_token_is_rejected() {
        assert!(verify_token("invalid.token.here").is_err());
    }

    #[test]
    fn user_id_extraction() {
        let user_id = Uuid::new_v4();
        let token = create_token(user_id, "+15551112222".to_string(), false).unwrap();
        assert_eq!(user_id_from_token(&token).unwrap(), user_id);
    }
}
