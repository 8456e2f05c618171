//! Private (one-to-one) messaging.
//!
//! The real-time path lives in `chat::engine`; this module owns the
//! private-message rows and the REST adjuncts (conversation list,
//! read receipts).

pub mod db;
pub mod handlers;
