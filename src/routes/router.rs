//! Top-level router: the WebSocket endpoint, the REST table, tracing
//! and CORS.

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::chat::ws::ws_handler;
use crate::routes::api_routes::configure_api_routes;
use crate::server::state::AppState;

pub fn create_router(state: AppState) -> Router<()> {
    let router = Router::new().route("/ws", get(ws_handler));

    let router = configure_api_routes(router, state.clone());

    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .fallback(|| async { "404 Not Found" })
        .with_state(state)
}
