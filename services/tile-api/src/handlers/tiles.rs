//! Vector tile endpoint.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Extension, Path, Query},
    response::Response,
};
use tracing::{debug, error, instrument, warn};

use tile_common::{EngineError, FilterSet, TileAddress, TileBlob, TileError, TileResult};

use super::FilterParams;
use crate::metrics::{record_tile_request, Outcome};
use crate::response::{tile_failure_response, tile_response};
use crate::state::AppState;

/// GET /tiles/{zoom}/{column}/{row}.pbf
#[instrument(skip(state))]
pub async fn tile_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((zoom, column, row)): Path<(String, String, String)>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let start = Instant::now();
    let filters = FilterParams::from_pairs(pairs).into_filter_set();

    match serve_tile(&state, (&zoom, &column, &row), &filters).await {
        Ok(tile) => {
            let outcome = if tile.is_empty() {
                Outcome::Empty
            } else {
                Outcome::Ok
            };
            record_tile_request(outcome, tile.len(), start.elapsed());
            tile_response(tile)
        }
        Err(e) => {
            let outcome = match &e {
                TileError::Malformed(reason) => {
                    warn!(error = %reason, "Rejected tile request");
                    Outcome::Malformed
                }
                TileError::Engine(reason) => {
                    error!(
                        category = ?filters.category(),
                        subtype = ?filters.subcategory(),
                        kind = reason.kind(),
                        error = %reason,
                        "Tile query failed"
                    );
                    Outcome::Error
                }
            };
            record_tile_request(outcome, 0, start.elapsed());
            tile_failure_response(&e, state.expose_engine_errors)
        }
    }
}

/// Parse the path and produce its tile.
async fn serve_tile(
    state: &AppState,
    (zoom, column, row): (&str, &str, &str),
    filters: &FilterSet,
) -> TileResult<TileBlob> {
    let address = TileAddress::from_path_segments(zoom, column, row)?;
    Ok(render_tile(state, &address, filters).await?)
}

/// Produce the tile for `address`, or an empty tile when the address lies
/// outside the grid.
pub async fn render_tile(
    state: &AppState,
    address: &TileAddress,
    filters: &FilterSet,
) -> Result<TileBlob, EngineError> {
    if !address.is_within_grid() {
        debug!(tile = %address, "Address outside tile grid, returning empty tile");
        return Ok(TileBlob::empty());
    }

    let query = state.query_builder.tile_query(address, filters);
    let tile = state.engine.execute_tile(&query).await?;

    if tile.is_empty() {
        debug!(tile = %address, "No footprints in tile");
    }
    Ok(tile)
}
