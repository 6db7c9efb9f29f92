use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::RelayState;

/// Build the relay HTTP router.
pub fn create_router(state: RelayState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/tasks", post(handlers::create_task))
        .route("/tasks/:task_id", get(handlers::get_task))
        // Browser clients call this cross-origin.
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
