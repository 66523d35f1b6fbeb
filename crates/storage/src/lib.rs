//! Query construction and execution against the footprint store.
//!
//! Provides:
//! - A pure builder turning tile addresses and filters into parameterized SQL
//! - The [`SpatialEngine`] boundary used by the HTTP layer
//! - A PostGIS implementation backed by a `sqlx` connection pool

pub mod engine;
pub mod postgis;
pub mod query;

pub use engine::SpatialEngine;
pub use postgis::{EngineConfig, PostgisEngine};
pub use query::{
    BuiltQuery, DatasetSchema, Predicate, QueryBuilder, QueryKind, QueryParam, SchemaError,
    TileEncoding,
};
