pub mod handlers;
pub mod models;

use crate::server::AppState;
use axum::{Router, routing::get};
use std::sync::Arc;

/// The operational HTTP surface: a liveness probe plus a small stats
/// endpoint for dashboards. Session mutations never go through HTTP; they
/// arrive as platform events.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/v1/stats", get(handlers::stats))
}
