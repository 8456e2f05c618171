//! Server initialization.

use axum::Router;
use tokio::sync::broadcast;

use crate::chat::events::ServerEvent;
use crate::chat::registry::RoomRegistry;
use crate::courts::places::PlacesClient;
use crate::notifications::mailer::Mailer;
use crate::routes::router::create_router;
use crate::server::config::{load_database, Config};
use crate::server::state::AppState;

/// Capacity of the global presence channel.
const PRESENCE_CHANNEL_CAPACITY: usize = 1000;

/// Build the application: connect the database, wire up shared state
/// and assemble the router. Also starts the periodic cleanup task that
/// drops room channels with no remaining subscribers.
pub async fn create_app(config: &Config) -> Result<Router<()>, sqlx::Error> {
    tracing::info!("initializing courtside backend");

    let db = load_database(&config.database_url).await?;

    let rooms = RoomRegistry::default();
    let (presence, _) = broadcast::channel::<ServerEvent>(PRESENCE_CHANNEL_CAPACITY);

    let places = PlacesClient::new(config.google_maps_api_key.clone());

    let mailer = match &config.smtp {
        Some(smtp) => match Mailer::new(smtp) {
            Ok(mailer) => Some(mailer),
            Err(err) => {
                tracing::error!(error = %err, "failed to build mailer, mail disabled");
                None
            }
        },
        None => None,
    };

    let state = AppState {
        db,
        rooms,
        presence,
        places,
        mailer,
    };

    let app = create_router(state.clone());

    let cleanup_rooms = state.rooms.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            cleanup_rooms.cleanup_inactive();
            tracing::debug!("cleaned up inactive room channels");
        }
    });

    tracing::info!("router configured");
    Ok(app)
}
