//! REST route table.
//!
//! Public routes (register, login, password reset) sit on the bare
//! router; everything else goes through the auth middleware, which
//! also rejects banned users.

use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, patch, post, put};
use axum::Router;

use crate::auth::handlers::{
    admin, forgot_password, get_me, login, register, reset_password, update_profile, verify_otp,
};
use crate::courts::handlers as courts;
use crate::groups::handlers as groups;
use crate::marketplace::handlers as marketplace;
use crate::messaging::handlers as chats;
use crate::middleware::auth::auth_middleware;
use crate::server::state::AppState;
use crate::tournaments::handlers as tournaments;

pub fn configure_api_routes(router: Router<AppState>, state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/forgot-password", post(forgot_password))
        .route("/api/auth/verify-otp", post(verify_otp))
        .route("/api/auth/reset-password", post(reset_password));

    let protected = Router::new()
        // Account
        .route("/api/auth/me", get(get_me))
        .route("/api/auth/profile", put(update_profile))
        // Admin
        .route("/api/admin/users", get(admin::list_users))
        .route("/api/admin/coaches", get(admin::list_coaches))
        .route("/api/admin/users/{id}/ban", post(admin::ban_user))
        .route("/api/admin/users/{id}/unban", post(admin::unban_user))
        .route("/api/admin/users/{id}", delete(admin::delete_user))
        .route("/api/admin/notifications", get(admin::list_notifications))
        .route(
            "/api/admin/notifications/{id}/read",
            patch(admin::mark_notification_read),
        )
        // Courts & groups
        .route(
            "/api/courts/search/{lat}/{lng}",
            get(courts::search_courts),
        )
        .route("/api/courts/{place_id}", get(courts::court_details))
        .route(
            "/api/courts/{place_id}/group",
            post(courts::join_court_group),
        )
        .route("/api/groups", get(groups::list_groups))
        .route("/api/groups/mine", get(groups::my_groups))
        // Tournaments
        .route(
            "/api/tournaments",
            post(tournaments::create_tournament).get(tournaments::upcoming_tournaments),
        )
        .route("/api/tournaments/mine", get(tournaments::my_tournaments))
        .route(
            "/api/tournaments/{id}/join",
            post(tournaments::join_tournament),
        )
        .route(
            "/api/tournaments/{id}/members",
            get(tournaments::tournament_members),
        )
        // Marketplace
        .route(
            "/api/categories",
            post(marketplace::add_category).get(marketplace::list_categories),
        )
        .route(
            "/api/categories/{id}",
            put(marketplace::update_category).delete(marketplace::delete_category),
        )
        .route(
            "/api/categories/{id}/products",
            get(marketplace::products_by_category),
        )
        .route(
            "/api/products",
            post(marketplace::upload_product).get(marketplace::all_products),
        )
        .route(
            "/api/products/{id}",
            put(marketplace::update_product).get(marketplace::product_details),
        )
        .route("/api/users/{id}/products", get(marketplace::products_by_user))
        .route("/api/sellers/{id}/rating", post(marketplace::rate_seller))
        // Private-chat adjuncts
        .route("/api/chats", get(chats::get_conversations))
        .route(
            "/api/chats/{peer_phone}/read",
            patch(chats::mark_conversation_read),
        )
        .layer(from_fn_with_state(state, auth_middleware));

    router.merge(public).merge(protected)
}
