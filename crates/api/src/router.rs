use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{handlers, state::AppState};

/// Create the main application router with all API endpoints
pub fn create_router(state: AppState) -> Router {
    // Create CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the router
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Dataset lifecycle
        .route("/api/upload", post(handlers::upload))
        .route("/api/sample", get(handlers::load_sample))
        // Analysis endpoints
        .route("/api/analyze", get(handlers::analyze))
        .route("/api/chat", post(handlers::chat))
        // Add shared state
        .with_state(state)
        // Add middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
