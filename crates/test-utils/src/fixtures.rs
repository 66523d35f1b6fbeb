//! Common test fixtures for footprint tile tests.
//!
//! Footprints are small axis-aligned squares in EPSG:4326 so that both the
//! in-memory engine and a real PostGIS table can be seeded from them.

use tile_common::tile::latlon_to_tile;
use tile_common::{BoundingBox, TileAddress};

/// Half the side of a fixture footprint, in degrees (~10 m).
pub const FOOTPRINT_HALF_SIZE: f64 = 0.0001;

/// Zoom used by the scenario tiles.
pub const SCENARIO_ZOOM: u32 = 14;

/// Well-known places as (lat, lon).
pub mod places {
    /// Midtown Manhattan, well inside its zoom-14 tile.
    pub const MIDTOWN: (f64, f64) = (40.7580, -73.9855);
    /// Lower Manhattan.
    pub const FINANCIAL_DISTRICT: (f64, f64) = (40.7069, -74.0113);
    /// Central London.
    pub const LONDON: (f64, f64) = (51.5074, -0.1278);
}

/// One building footprint.
#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    pub id: u32,
    pub category: String,
    pub subcategory: String,
    pub height: Option<f64>,
    pub bbox: BoundingBox,
}

impl Footprint {
    pub fn new(
        id: u32,
        category: &str,
        subcategory: &str,
        height: Option<f64>,
        (lat, lon): (f64, f64),
    ) -> Self {
        Self {
            id,
            category: category.to_string(),
            subcategory: subcategory.to_string(),
            height,
            bbox: BoundingBox::around(lon, lat, FOOTPRINT_HALF_SIZE),
        }
    }
}

/// Ten footprints: three residential houses 10/20/30 m tall in Midtown plus
/// seven others spread over Manhattan and London.
pub fn scenario_footprints() -> Vec<Footprint> {
    let (lat, lon) = places::MIDTOWN;
    let (fd_lat, fd_lon) = places::FINANCIAL_DISTRICT;

    vec![
        Footprint::new(1, "residential", "house", Some(10.0), (lat, lon - 0.001)),
        Footprint::new(2, "residential", "house", Some(20.0), (lat, lon)),
        Footprint::new(3, "residential", "house", Some(30.0), (lat, lon + 0.001)),
        Footprint::new(4, "residential", "garage", Some(4.0), (lat + 0.001, lon)),
        Footprint::new(5, "residential", "apartments", Some(45.0), (lat - 0.001, lon)),
        Footprint::new(6, "commercial", "office", Some(120.0), (fd_lat, fd_lon)),
        Footprint::new(7, "commercial", "retail", Some(8.0), (fd_lat + 0.001, fd_lon)),
        Footprint::new(8, "outbuilding", "shed", Some(3.0), (fd_lat - 0.001, fd_lon)),
        Footprint::new(9, "religious", "church", Some(25.0), (lat + 0.002, lon + 0.002)),
        Footprint::new(10, "education", "school", Some(12.0), places::LONDON),
    ]
}

/// Mean height of [`scenario_footprints`].
pub const SCENARIO_MEAN_HEIGHT: f64 = 27.7;

/// Footprints whose labels contain quote characters or look like fragments
/// of one another.
pub fn quoted_label_footprints() -> Vec<Footprint> {
    let (lat, lon) = places::MIDTOWN;
    vec![
        Footprint::new(21, "o'reilly", "shop", Some(9.0), (lat, lon)),
        Footprint::new(22, "o", "shop", Some(11.0), (lat, lon + 0.001)),
        Footprint::new(23, "reilly", "shop", Some(13.0), (lat, lon - 0.001)),
        Footprint::new(24, "commercial", "o'reilly\"s", Some(15.0), (lat + 0.001, lon)),
    ]
}

/// The zoom-14 tile containing the three scenario houses.
pub fn house_tile() -> TileAddress {
    let (lat, lon) = places::MIDTOWN;
    latlon_to_tile(lat, lon, SCENARIO_ZOOM)
}

/// A zoom-14 tile with no Manhattan footprints in it.
pub fn london_tile() -> TileAddress {
    let (lat, lon) = places::LONDON;
    latlon_to_tile(lat, lon, SCENARIO_ZOOM)
}

/// A tile in the middle of the South Pacific.
pub fn ocean_tile() -> TileAddress {
    latlon_to_tile(-40.0, -130.0, SCENARIO_ZOOM)
}
