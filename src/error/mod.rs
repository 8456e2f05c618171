//! Error types for the courtside backend.
//!
//! Two taxonomies live here:
//!
//! - **`ApiError`** - REST handler errors, converted to HTTP responses
//!   with the JSON body shape `{"success": false, "message": ...}`.
//! - **`ChatError`** - socket engine errors. These never cross the
//!   connection boundary as failures; the WebSocket layer catches them
//!   and emits a named `error` event with a human-readable string.

pub mod conversion;
pub mod types;

pub use types::{ApiError, ChatError};

/// Convenience alias for REST handler results.
pub type ApiResult<T> = Result<T, ApiError>;
