//! Tile addresses in the standard XYZ (slippy map) pyramid.
//!
//! Row 0 is the northernmost row; the grid at zoom `z` is `2^z` tiles wide
//! and tall in Web Mercator.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{BoundingBox, MalformedRequest};

/// Highest zoom for which a tile envelope can be computed by the store.
pub const MAX_GRID_ZOOM: u32 = 31;

/// File extensions accepted on the row segment of a tile path.
pub const TILE_EXTENSIONS: [&str; 3] = ["tile", "pbf", "mvt"];

/// Web Mercator latitude limit in degrees.
const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;

/// A tile address (zoom/column/row).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileAddress {
    /// Zoom level
    pub zoom: u32,
    /// Column (x)
    pub column: u32,
    /// Row (y)
    pub row: u32,
}

impl TileAddress {
    pub fn new(zoom: u32, column: u32, row: u32) -> Self {
        Self { zoom, column, row }
    }

    /// Parse the three path segments of a tile URL.
    ///
    /// The row segment may carry one of [`TILE_EXTENSIONS`] (`12.pbf`).
    /// Each number must be plain ASCII digits; signs, whitespace and values
    /// above `u32::MAX` are rejected.
    pub fn from_path_segments(
        zoom: &str,
        column: &str,
        row: &str,
    ) -> Result<Self, MalformedRequest> {
        let row = strip_tile_extension(row)?;

        Ok(Self {
            zoom: parse_segment("zoom", zoom)?,
            column: parse_segment("column", column)?,
            row: parse_segment("row", row)?,
        })
    }

    /// Number of tiles along one axis at this zoom, if the zoom is addressable.
    pub fn grid_size(&self) -> Option<u64> {
        if self.zoom > MAX_GRID_ZOOM {
            return None;
        }
        Some(1u64 << self.zoom)
    }

    /// Whether this address names a real tile of the pyramid.
    ///
    /// Addresses outside the grid are still valid requests; they simply cover
    /// no area and therefore no features.
    pub fn is_within_grid(&self) -> bool {
        match self.grid_size() {
            Some(n) => u64::from(self.column) < n && u64::from(self.row) < n,
            None => false,
        }
    }

    /// Geographic bounds of this tile, or `None` when it lies outside the grid.
    pub fn latlon_bounds(&self) -> Option<BoundingBox> {
        if !self.is_within_grid() {
            return None;
        }
        Some(tile_to_latlon_bounds(self))
    }
}

impl fmt::Display for TileAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.column, self.row)
    }
}

fn strip_tile_extension(row: &str) -> Result<&str, MalformedRequest> {
    match row.rsplit_once('.') {
        Some((number, ext)) if TILE_EXTENSIONS.contains(&ext) => Ok(number),
        Some((_, ext)) => Err(MalformedRequest::UnsupportedExtension(ext.to_string())),
        None => Ok(row),
    }
}

fn parse_segment(segment: &'static str, value: &str) -> Result<u32, MalformedRequest> {
    let invalid = || MalformedRequest::InvalidSegment {
        segment,
        value: value.to_string(),
    };

    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    value.parse().map_err(|_| invalid())
}

/// Convert lat/lon to the Web Mercator tile containing it.
///
/// Latitudes beyond the Mercator limit and longitude 180 are clamped onto the
/// edge tiles. `zoom` must not exceed [`MAX_GRID_ZOOM`].
pub fn latlon_to_tile(lat: f64, lon: f64, zoom: u32) -> TileAddress {
    let n = 2f64.powi(zoom as i32);
    let max_index = n - 1.0;

    let lat = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
    let x = ((lon + 180.0) / 360.0 * n).floor().clamp(0.0, max_index);
    let lat_rad = lat.to_radians();
    let y = ((1.0 - lat_rad.tan().asinh() / std::f64::consts::PI) / 2.0 * n)
        .floor()
        .clamp(0.0, max_index);

    TileAddress {
        zoom,
        column: x as u32,
        row: y as u32,
    }
}

/// Convert Web Mercator tile coordinates to lat/lon bounds.
pub fn tile_to_latlon_bounds(address: &TileAddress) -> BoundingBox {
    let n = 2f64.powi(address.zoom as i32);
    let x = f64::from(address.column);
    let y = f64::from(address.row);

    let lon_min = x / n * 360.0 - 180.0;
    let lon_max = (x + 1.0) / n * 360.0 - 180.0;

    let lat_max = (std::f64::consts::PI * (1.0 - 2.0 * y / n))
        .sinh()
        .atan()
        .to_degrees();
    let lat_min = (std::f64::consts::PI * (1.0 - 2.0 * (y + 1.0) / n))
        .sinh()
        .atan()
        .to_degrees();

    BoundingBox::new(lon_min, lat_min, lon_max, lat_max)
}
