//! Building footprint tile service.
//!
//! Serves filtered building footprints as Mapbox vector tiles and answers
//! aggregate height statistics over the same filters.

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod handlers;
pub mod metrics;
pub mod response;
pub mod state;

use crate::state::AppState;

/// Build the HTTP router with all endpoints and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Vector tiles; the row segment carries the extension
        .route(
            "/tiles/:zoom/:column/:row",
            get(handlers::tiles::tile_handler),
        )
        .route("/stats", get(handlers::stats::stats_handler))
        // Health and metrics
        .route("/health", get(handlers::health::health_handler))
        .route("/ready", get(handlers::health::ready_handler))
        .route("/metrics", get(handlers::health::metrics_handler))
        // Middleware
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
