//! Aggregate statistics endpoint.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Extension, Query},
    response::Response,
};
use tracing::{debug, error, instrument};

use super::FilterParams;
use crate::metrics::{record_stats_request, Outcome};
use crate::response::{stats_error_response, stats_response};
use crate::state::AppState;

/// GET /stats?category=..&subtype=..
#[instrument(skip(state))]
pub async fn stats_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let start = Instant::now();
    let filters = FilterParams::from_pairs(pairs).into_filter_set();
    let query = state.query_builder.stats_query(&filters);

    match state.engine.execute_stats(&query).await {
        Ok(stats) => {
            debug!(count = stats.count, "Stats query complete");
            record_stats_request(Outcome::Ok, start.elapsed());
            stats_response(&stats)
        }
        Err(e) => {
            error!(
                category = ?filters.category(),
                subtype = ?filters.subcategory(),
                kind = e.kind(),
                error = %e,
                "Stats query failed"
            );
            record_stats_request(Outcome::Error, start.elapsed());
            stats_error_response(&e, state.expose_engine_errors)
        }
    }
}
