use axum::Router;
use axum::routing::{delete, get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::SharedState;
use crate::ws;

/// Build the Axum router with all routes and middleware.
pub fn create_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check (outside /api prefix)
        .route("/health", get(handlers::health))
        // Admin
        .route("/api/db", delete(handlers::clear_db))
        // Accounts and sessions
        .route("/api/user", post(handlers::register))
        .route(
            "/api/session",
            post(handlers::login).delete(handlers::logout),
        )
        // Lobby
        .route(
            "/api/games",
            post(handlers::create_game)
                .get(handlers::list_games)
                .put(handlers::join_game),
        )
        // Game queries and play
        .route("/api/games/{id}", get(handlers::get_game))
        .route("/api/games/{id}/legal-moves", get(handlers::legal_moves))
        .route("/api/games/{id}/moves", post(handlers::make_move))
        .route("/api/games/{id}/resign", post(handlers::resign))
        // WebSocket: live game sessions
        .route("/ws/games/{id}", get(ws::ws_handler))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
