//! Bearer-token authentication middleware.
//!
//! Verifies the JWT from the Authorization header, re-checks the user
//! row (a banned user's outstanding tokens must stop working
//! immediately) and attaches [`AuthenticatedUser`] to the request
//! extensions.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::sessions::verify_token;
use crate::auth::users;
use crate::server::state::AppState;

/// Identity attached to every authenticated request.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub phone_number: String,
    pub is_admin: bool,
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            tracing::warn!("missing Authorization header");
            StatusCode::UNAUTHORIZED
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        tracing::warn!("malformed Authorization header");
        StatusCode::UNAUTHORIZED
    })?;

    let claims = verify_token(token).map_err(|err| {
        tracing::warn!(error = %err, "invalid token");
        StatusCode::UNAUTHORIZED
    })?;

    let user_id = Uuid::parse_str(&claims.sub).map_err(|err| {
        tracing::error!(error = %err, "invalid user id in token");
        StatusCode::UNAUTHORIZED
    })?;

    let user = users::find_user_by_id(&state.db, user_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "user lookup failed in auth middleware");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if user.banned {
        tracing::warn!(user_id = %user.id, "banned user rejected");
        return Err(StatusCode::FORBIDDEN);
    }

    request.extensions_mut().insert(AuthenticatedUser {
        user_id: user.id,
        phone_number: user.phone_number,
        is_admin: user.is_admin,
    });

    Ok(next.run(request).await)
}

/// Extractor for the identity set by [`auth_middleware`].
#[derive(Clone, Debug)]
pub struct AuthUser(pub AuthenticatedUser);

impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| {
                tracing::warn!("AuthenticatedUser missing from request extensions");
                StatusCode::UNAUTHORIZED
            })?;

        Ok(AuthUser(user))
    }
}
