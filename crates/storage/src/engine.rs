//! Boundary to the spatial query engine.

use async_trait::async_trait;

use tile_common::{EngineError, StatsResult, TileBlob};

use crate::query::BuiltQuery;

/// Executes built queries against the geometry store.
///
/// Implementations check out an isolated execution context per call, release
/// it on every exit path, and report failures only as [`EngineError`].
#[async_trait]
pub trait SpatialEngine: Send + Sync {
    /// Run a tile query. No matching features yields an empty blob.
    async fn execute_tile(&self, query: &BuiltQuery) -> Result<TileBlob, EngineError>;

    /// Run a stats query. No matching rows yields a zero count.
    async fn execute_stats(&self, query: &BuiltQuery) -> Result<StatsResult, EngineError>;

    /// Cheap connectivity check used by readiness probes.
    async fn ping(&self) -> Result<(), EngineError>;
}
