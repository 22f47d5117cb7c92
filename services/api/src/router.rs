//! Axum Router Configuration

use crate::{state::AppState, ws::ws_handler};
use axum::{Router, routing::get};
use std::sync::Arc;

async fn health() -> &'static str {
    "ok"
}

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .with_state(app_state)
        .route("/health", get(health))
}
