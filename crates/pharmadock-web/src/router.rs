//! Axum router: maps URL paths to handlers.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::cookies::csrf_protect;
use crate::handlers::{
    chat::{chat_message, end_conversation},
    files::{docking_file, docking_log},
    health::health,
    pages::{chat_page, home},
};
use crate::state::{AppState, SharedState};

/// Build and return the full Axum router.
pub fn build_router(state: AppState) -> Router {
    let static_dir = state.static_dir.clone();
    let shared: SharedState = Arc::new(state);

    Router::new()
        // Pages
        .route("/",      get(home))
        .route("/chat/", get(chat_page))

        // Chat API
        .route("/chat/message/",                  post(chat_message))
        .route("/chat/end/",                      post(end_conversation))
        .route("/chat/get-docking-file/{*path}",  get(docking_file))
        .route("/chat/get-docking-log/{*path}",   get(docking_log))

        .route("/health", get(health))

        // Static files
        .nest_service("/static", ServeDir::new(static_dir))

        // Middleware
        .layer(middleware::from_fn(csrf_protect))
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}
