//! Response assembly for tile and stats endpoints.
//!
//! Engine diagnostics are a debugging aid only; their wording is not part
//! of the HTTP contract.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use tile_common::{EngineError, MalformedRequest, StatsResult, TileBlob, TileError};

/// Content type of Mapbox vector tiles.
pub const TILE_CONTENT_TYPE: &str = "application/x-protobuf";

/// Decimal places kept in `avg_height`.
pub const AVG_HEIGHT_PLACES: u32 = 2;

/// Body returned instead of the diagnostic when disclosure is off.
pub const GENERIC_ENGINE_ERROR: &str = "internal engine error";

/// JSON body of a successful stats request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsBody {
    pub count: u64,
    pub avg_height: Option<f64>,
}

impl From<&StatsResult> for StatsBody {
    fn from(stats: &StatsResult) -> Self {
        Self {
            count: stats.count,
            avg_height: stats.rounded_average(AVG_HEIGHT_PLACES),
        }
    }
}

/// JSON body of a failed stats request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// 200 with the encoded tile; an empty blob gives an empty body.
pub fn tile_response(tile: TileBlob) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, TILE_CONTENT_TYPE)],
        tile.into_bytes(),
    )
        .into_response()
}

/// Plain-text failure for the tile endpoint, with the status the error
/// maps to.
pub fn tile_failure_response(err: &TileError, expose: bool) -> Response {
    let status = StatusCode::from_u16(err.http_status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let message = match err {
        TileError::Malformed(e) => e.to_string(),
        TileError::Engine(e) => format!("Error generating tile: {}", diagnostic(e, expose)),
    };
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        message,
    )
        .into_response()
}

/// 500 with a plain-text diagnostic.
pub fn tile_error_response(err: &EngineError, expose: bool) -> Response {
    tile_failure_response(&TileError::Engine(err.clone()), expose)
}

/// 400 for a tile address that does not parse.
pub fn malformed_response(err: &MalformedRequest) -> Response {
    tile_failure_response(&TileError::Malformed(err.clone()), false)
}

pub fn stats_response(stats: &StatsResult) -> Response {
    (StatusCode::OK, Json(StatsBody::from(stats))).into_response()
}

pub fn stats_error_response(err: &EngineError, expose: bool) -> Response {
    let status = StatusCode::from_u16(err.http_status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = ErrorBody {
        error: diagnostic(err, expose),
    };
    (status, Json(body)).into_response()
}

fn diagnostic(err: &EngineError, expose: bool) -> String {
    if expose {
        err.to_string()
    } else {
        GENERIC_ENGINE_ERROR.to_string()
    }
}
