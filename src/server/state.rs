//! Shared application state.

use axum::extract::FromRef;
use sqlx::PgPool;
use tokio::sync::broadcast;

use crate::chat::events::ServerEvent;
use crate::chat::registry::RoomRegistry;
use crate::courts::places::PlacesClient;
use crate::notifications::mailer::Mailer;

/// Central state container, cloned into every handler.
///
/// All fields are cheap to clone: the pool, the registry and the
/// broadcast sender are handles over shared internals.
#[derive(Clone)]
pub struct AppState {
    /// Postgres connection pool.
    pub db: PgPool,
    /// Per-room broadcast channels for the real-time layer.
    pub rooms: RoomRegistry,
    /// Global presence channel (`userOnline` / `userOffline`).
    pub presence: broadcast::Sender<ServerEvent>,
    /// Google Places client for court discovery.
    pub places: PlacesClient,
    /// SMTP mailer; `None` when mail is not configured.
    pub mailer: Option<Mailer>,
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl FromRef<AppState> for RoomRegistry {
    fn from_ref(state: &AppState) -> Self {
        state.rooms.clone()
    }
}

impl FromRef<AppState> for broadcast::Sender<ServerEvent> {
    fn from_ref(state: &AppState) -> Self {
        state.presence.clone()
    }
}

impl FromRef<AppState> for PlacesClient {
    fn from_ref(state: &AppState) -> Self {
        state.places.clone()
    }
}
