//! Route Definitions
//!
//! Maps URLs to handlers with type-safe routing.

use super::handlers::*;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Build the API router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        // Session lifecycle, `:game` is `coinflip` or `dice`
        .route("/api/:game/start_session", post(start_session_handler))
        .route("/api/:game/play", post(play_handler))
        .route("/api/:game/end_session", post(end_session_handler))
        .route("/api/:game/session/:player_id", get(session_status_handler))
        // Offline verification of revealed seeds
        .route("/api/verify", post(verify_handler))
        .with_state(state)
}
