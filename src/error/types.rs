use axum::http::StatusCode;
use thiserror::Error;

/// Errors returned by REST handlers.
///
/// Each variant maps to an HTTP status code via [`ApiError::status_code`];
/// the conversion to a response body lives in `conversion.rs`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or missing input.
    #[error("{0}")]
    BadRequest(String),

    /// Missing or invalid credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed (banned user, non-admin, non-owner).
    #[error("{0}")]
    Forbidden(String),

    /// Requested row does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Uniqueness or state conflict (duplicate email, already joined).
    #[error("{0}")]
    Conflict(String),

    /// Store or downstream failure. The inner detail is logged, never
    /// sent to the client.
    #[error("Internal Server Error")]
    Internal(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound("Not found".to_string()),
            other => Self::Internal(Box::new(other)),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Internal(Box::new(err))
    }
}

/// Errors raised by the real-time message/poll engine.
///
/// The taxonomy matches the socket contract: every variant is emitted
/// to the offending connection as an `error` event carrying the
/// `Display` string, so the strings here are client-facing.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("You are not a member of this group")]
    NotAMember,

    #[error("{0} not found")]
    UserNotFound(&'static str),

    #[error("Poll not found")]
    PollNotFound,

    #[error("Poll options not found")]
    NoOptions,

    #[error("Message not found")]
    NotFound,

    #[error("You can only delete your own messages")]
    Forbidden,

    #[error("{0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for ChatError {
    fn from(err: sqlx::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_status_code_mapping() {
        assert_eq!(
            ApiError::bad_request("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::unauthorized("x").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::forbidden("x").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::conflict("x").status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn row_not_found_maps_to_404() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn chat_error_strings_are_client_facing() {
        assert_eq!(
            ChatError::NotAMember.to_string(),
            "You are not a member of this group"
        );
        assert_eq!(
            ChatError::UserNotFound("Receiver").to_string(),
            "Receiver not found"
        );
        assert_eq!(
            ChatError::Forbidden.to_string(),
            "You can only delete your own messages"
        );
    }
}
