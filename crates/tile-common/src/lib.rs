//! Request-scoped value types shared by the footprint tile services.
//!
//! Everything here lives for a single request: the tile address, the
//! attribute filters, and the two result shapes returned by the spatial
//! store. The error taxonomy used across the workspace is defined here too.

pub mod bbox;
pub mod error;
pub mod filter;
pub mod result;
pub mod tile;

pub use bbox::BoundingBox;
pub use error::{EngineError, MalformedRequest, TileError, TileResult};
pub use filter::FilterSet;
pub use result::{StatsResult, TileBlob};
pub use tile::TileAddress;
