//! Conversion of [`ApiError`] into HTTP responses.
//!
//! The JSON body shape `{"success": false, "message": ...}` is part of
//! the public API contract and is also produced by successful handlers
//! with `"success": true`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::types::ApiError;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = ?self, "request failed");
        } else {
            tracing::debug!(error = %self, status = %status, "request rejected");
        }

        let body = Json(json!({
            "success": false,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_response_carries_status() {
        let response = ApiError::not_found("Court not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn internal_error_hides_detail() {
        let source: Box<dyn std::error::Error + Send + Sync> = "pool exhausted".into();
        let err = ApiError::Internal(source);
        // Client-facing string must not leak the source detail.
        assert_eq!(err.to_string(), "Internal Server Error");
    }
}
