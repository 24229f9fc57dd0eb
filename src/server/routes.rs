//! Router configuration for the liveness server.

use axum::{routing::get, Router};

/// Body returned by every liveness route.
pub const HEALTH_BODY: &str = "Bot is running";

async fn health() -> &'static str {
    HEALTH_BODY
}

/// Create the liveness router.
pub fn create_router() -> Router {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
}
