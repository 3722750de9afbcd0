//! Route definitions for the Hainan Weather Service

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/admin", admin_routes())
}

/// Operator routes
fn admin_routes() -> Router<AppState> {
    Router::new().route("/weather/sync", post(handlers::trigger_sync))
}
