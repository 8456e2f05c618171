//! Courtside: a social backend for pickleball players.
//!
//! Accounts, court discovery through Google Places, per-court chat
//! groups with polls, one-to-one messaging, tournaments and a small
//! marketplace. Real-time delivery runs over a single WebSocket
//! endpoint backed by per-room tokio broadcast channels; everything
//! durable lives in Postgres.

pub mod auth;
pub mod chat;
pub mod courts;
pub mod error;
pub mod groups;
pub mod marketplace;
pub mod messaging;
pub mod middleware;
pub mod notifications;
pub mod routes;
pub mod server;
pub mod tournaments;
